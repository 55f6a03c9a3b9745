//! Client-side source of truth for the quote list and the session's vote.
//!
//! The UI only talks to [`QuoteStore`] through its actions. Each action calls
//! the gateway first and reconciles the local list only once the service has
//! answered; failures leave the list as it was.

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Utc};
use log::{log, Level};

use crate::{
    api::gateway::QuoteGateway,
    auth::Session,
    error::{ClientError, StoreError},
    schema::api::{Quote, QuoteBody, QuoteId},
};

pub mod notification;
pub mod vote;

use self::notification::{Notification, NotificationKind, CRUD_NOTICE_TTL};
pub use self::vote::VoteFlow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// The service wants a login; the list stays empty.
    LoginRequired,
    Failed(String),
}

#[derive(Debug)]
struct StoreState {
    quotes: Vec<Quote>,
    load: LoadState,
    user_voted_quote_id: Option<QuoteId>,
    vote_flow: VoteFlow,
    notification: Option<Notification>,
    login_redirect: bool,
    revision: u64,
}

impl StoreState {
    fn touch(&mut self) {
        self.revision += 1;
    }

    fn find(&self, id: QuoteId) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    fn notify(&mut self, kind: NotificationKind, text: impl Into<String>, ttl: Duration) {
        self.notification = Some(Notification::new(kind, text, ttl));
    }
}

pub struct QuoteStore {
    gateway: Arc<dyn QuoteGateway>,
    session: Session,
    state: Mutex<StoreState>,
}

impl QuoteStore {
    pub fn new(gateway: Arc<dyn QuoteGateway>, session: Session) -> Self {
        Self {
            gateway,
            session,
            state: Mutex::new(StoreState {
                quotes: Vec::new(),
                load: LoadState::Loading,
                user_voted_quote_id: None,
                vote_flow: VoteFlow::Idle,
                notification: None,
                login_redirect: false,
                revision: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn quotes(&self) -> Vec<Quote> {
        self.state().quotes.clone()
    }

    pub fn quote(&self, id: QuoteId) -> Option<Quote> {
        self.state().find(id).cloned()
    }

    pub fn load_state(&self) -> LoadState {
        self.state().load.clone()
    }

    pub fn user_voted_quote_id(&self) -> Option<QuoteId> {
        self.state().user_voted_quote_id
    }

    /// Bumped on every change to the list.
    pub fn revision(&self) -> u64 {
        self.state().revision
    }

    pub fn notification(&self) -> Option<Notification> {
        self.notification_at(Utc::now())
    }

    pub fn notification_at(&self, now: DateTime<Utc>) -> Option<Notification> {
        self.state()
            .notification
            .clone()
            .filter(|n| !n.is_expired_at(now))
    }

    pub fn dismiss_notification(&self) {
        self.state().notification = None;
    }

    /// True once after an action hit an authentication failure.
    pub fn take_login_redirect(&self) -> bool {
        std::mem::take(&mut self.state().login_redirect)
    }

    /// Initial load: the list and the session's vote are fetched together.
    pub async fn load(&self) -> Result<(), StoreError> {
        self.state().load = LoadState::Loading;

        let (quotes, voted) = futures::join!(self.gateway.list_quotes(), self.lookup_vote());
        let result = quotes.and_then(|quotes| voted.map(|voted| (quotes, voted)));

        let mut state = self.state();
        match result {
            Ok((quotes, voted)) => {
                let voted = voted.or(state.user_voted_quote_id);
                state.quotes = dedup(quotes)
                    .into_iter()
                    .map(|mut q| {
                        q.is_voted_by_user = Some(Some(q.id) == voted);
                        q
                    })
                    .collect();
                state.user_voted_quote_id = voted;
                state.load = LoadState::Ready;
                state.touch();
                log!(
                    Level::Debug,
                    "Loaded {} quotes, voted for {:?}",
                    state.quotes.len(),
                    voted
                );
                Ok(())
            }
            Err(e) => {
                state.quotes.clear();
                state.touch();
                if e.requires_login() {
                    log!(Level::Info, "Quote list requires login: {e}");
                    state.load = LoadState::LoginRequired;
                    state.login_redirect = true;
                } else {
                    log!(Level::Warn, "Failed to load quotes: {e}");
                    state.load = LoadState::Failed(e.to_string());
                }
                Err(e.into())
            }
        }
    }

    /// Auth failures while looking up the vote mean "no vote" rather than an error.
    async fn lookup_vote(&self) -> Result<Option<QuoteId>, ClientError> {
        match self.gateway.user_voted_quote_id().await {
            Err(e) if e.requires_login() => {
                log!(Level::Debug, "Vote lookup skipped: {e}");
                Ok(None)
            }
            other => other,
        }
    }

    /// Runs one gateway call and posts the outcome.
    async fn run<T>(
        &self,
        call: impl Future<Output = Result<T, ClientError>>,
        success: &str,
        ttl: Duration,
    ) -> Result<T, StoreError> {
        match call.await {
            Ok(value) => {
                self.state()
                    .notify(NotificationKind::Success, success, ttl);
                Ok(value)
            }
            Err(e) => Err(self.fail(e.into(), ttl)),
        }
    }

    /// Records a failed action: a login redirect for auth failures, a
    /// notification for everything else.
    fn fail(&self, err: StoreError, ttl: Duration) -> StoreError {
        let mut state = self.state();
        if err.requires_login() {
            log!(Level::Info, "Redirecting to login: {err}");
            state.login_redirect = true;
        } else {
            log!(Level::Warn, "{err}");
            state.notify(NotificationKind::Error, err.to_string(), ttl);
        }
        err
    }

    fn ensure_unlocked(&self, id: QuoteId, votes: u32) -> Result<(), StoreError> {
        let local = self.state().find(id).map(|q| q.vote_count).unwrap_or(0);
        let votes = votes.max(local);
        if votes > 0 {
            return Err(self.fail(StoreError::QuoteLocked { id, votes }, CRUD_NOTICE_TTL));
        }
        Ok(())
    }

    pub async fn create_quote(&self, content: &str, author: &str) -> Result<Quote, StoreError> {
        let body = validated(content, author).map_err(|e| self.fail(e, CRUD_NOTICE_TTL))?;
        let created = self
            .run(
                self.gateway.create_quote(&body),
                "Quote created successfully!",
                CRUD_NOTICE_TTL,
            )
            .await?;

        let mut state = self.state();
        state.quotes.retain(|q| q.id != created.id);
        state.quotes.insert(0, created.clone());
        state.touch();
        Ok(created)
    }

    /// Quotes with votes are refused before any request is made.
    pub async fn update_quote(&self, quote: &Quote) -> Result<Quote, StoreError> {
        self.ensure_unlocked(quote.id, quote.vote_count)?;
        let body = validated(&quote.content, &quote.author)
            .map_err(|e| self.fail(e, CRUD_NOTICE_TTL))?;
        let request = Quote {
            content: body.content,
            author: body.author,
            ..quote.clone()
        };
        let mut updated = self
            .run(
                self.gateway.update_quote(&request),
                "Quote updated successfully!",
                CRUD_NOTICE_TTL,
            )
            .await?;

        let mut state = self.state();
        if let Some(slot) = state.quotes.iter_mut().find(|q| q.id == updated.id) {
            if updated.is_voted_by_user.is_none() {
                updated.is_voted_by_user = slot.is_voted_by_user;
            }
            *slot = updated.clone();
        }
        state.touch();
        Ok(updated)
    }

    pub async fn delete_quote(&self, id: QuoteId) -> Result<(), StoreError> {
        self.ensure_unlocked(id, 0)?;
        self.run(
            self.gateway.delete_quote(id),
            "Quote deleted successfully!",
            CRUD_NOTICE_TTL,
        )
        .await?;

        let mut state = self.state();
        state.quotes.retain(|q| q.id != id);
        state.touch();
        Ok(())
    }

    /// Ends the session and forgets the vote made under it.
    pub fn logout(&self) -> anyhow::Result<()> {
        self.session.end()?;
        let mut state = self.state();
        state.user_voted_quote_id = None;
        state.vote_flow = VoteFlow::Idle;
        state
            .quotes
            .iter_mut()
            .for_each(|q| q.is_voted_by_user = None);
        state.touch();
        Ok(())
    }
}

fn validated(content: &str, author: &str) -> Result<QuoteBody, StoreError> {
    let (content, author) = (content.trim(), author.trim());
    if content.is_empty() {
        return Err(StoreError::InvalidQuote("content must not be empty".into()));
    }
    if author.is_empty() {
        return Err(StoreError::InvalidQuote("author must not be empty".into()));
    }
    Ok(QuoteBody {
        content: content.to_string(),
        author: author.to_string(),
    })
}

/// Keeps the first occurrence of every id.
fn dedup(quotes: Vec<Quote>) -> Vec<Quote> {
    let mut seen = HashSet::new();
    quotes
        .into_iter()
        .filter(|q| {
            let fresh = seen.insert(q.id);
            if !fresh {
                log!(Level::Warn, "Dropping duplicate quote id {}", q.id);
            }
            fresh
        })
        .collect()
}
