use std::time::Duration;

use chrono::{DateTime, Utc};

pub const CRUD_NOTICE_TTL: Duration = Duration::from_secs(3);
pub const VOTE_NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient feedback for the last action. Hidden once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub text: String,
    pub posted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, text: impl Into<String>, ttl: Duration) -> Self {
        Self::posted_at(kind, text, ttl, Utc::now())
    }

    pub fn posted_at(
        kind: NotificationKind,
        text: impl Into<String>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let ttl = chrono::Duration::milliseconds(ttl.as_millis() as i64);
        Self {
            kind,
            text: text.into(),
            posted_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}
