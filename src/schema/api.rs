use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub type QuoteId = i32;

/// A quote as served by the remote service.
///
/// `created_at`/`updated_at` are kept as the service sent them; use
/// [`Quote::created_at_utc`] when a comparable timestamp is needed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: QuoteId,
    pub content: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "voteCount", default)]
    pub vote_count: u32,
    #[serde(
        rename = "isVotedByUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_voted_by_user: Option<bool>,
}

impl Quote {
    /// Quotes that already carry votes are frozen: no edits, no deletes.
    pub fn is_locked(&self) -> bool {
        self.vote_count > 0
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn body(&self) -> QuoteBody {
        QuoteBody {
            content: self.content.clone(),
            author: self.author.clone(),
        }
    }
}

/// Accepts RFC 3339 as well as offset-less ISO-8601 (read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Request body for create and update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuoteBody {
    pub content: String,
    pub author: String,
}

#[derive(Deserialize, Debug)]
pub struct VoteCheck {
    pub has_voted: bool,
}

#[derive(Deserialize, Debug)]
pub struct VoteCount {
    pub count: u32,
}

/// What the service said after a vote. Services differ on whether they echo
/// the new count, so it is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    #[serde(default, alias = "voteCount", alias = "vote_count")]
    pub count: Option<u32>,
}

impl VoteReceipt {
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Structured failure body. Services use either `error` or `detail`.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        self.error
            .iter()
            .chain(self.detail.iter())
            .find(|m| !m.trim().is_empty())
            .cloned()
    }
}
