//! Single-choice voting.
//!
//! `Idle -> Confirming(id) -> Voting(id) -> Idle`. A session that has voted
//! never gets past `Idle` again, and only one vote may be in flight.

use log::{log, Level};

use super::{notification::NotificationKind, notification::VOTE_NOTICE_TTL, QuoteStore};
use crate::{
    error::StoreError,
    schema::api::{QuoteId, VoteReceipt},
};

/// Puts the flow back to `Idle` when a vote ends, including when its future
/// is dropped before the service answers.
struct VotingGuard<'a> {
    store: &'a QuoteStore,
    id: QuoteId,
}

impl Drop for VotingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state();
        if state.vote_flow == VoteFlow::Voting(self.id) {
            state.vote_flow = VoteFlow::Idle;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteFlow {
    #[default]
    Idle,
    Confirming(QuoteId),
    Voting(QuoteId),
}

impl QuoteStore {
    pub fn vote_flow(&self) -> VoteFlow {
        self.state().vote_flow
    }

    pub fn voting_in_progress(&self) -> Option<QuoteId> {
        match self.state().vote_flow {
            VoteFlow::Voting(id) => Some(id),
            _ => None,
        }
    }

    /// Whether the session may still start a vote.
    pub fn can_vote(&self) -> bool {
        let state = self.state();
        state.user_voted_quote_id.is_none() && !matches!(state.vote_flow, VoteFlow::Voting(_))
    }

    fn begin(&self, next: VoteFlow) -> Result<(), StoreError> {
        let mut state = self.state();
        if let Some(voted) = state.user_voted_quote_id {
            return Err(StoreError::AlreadyVoted(voted));
        }
        if let VoteFlow::Voting(pending) = state.vote_flow {
            return Err(StoreError::VoteInProgress(pending));
        }
        state.vote_flow = next;
        Ok(())
    }

    /// Asks for confirmation before voting for `id`.
    pub fn request_vote(&self, id: QuoteId) -> Result<(), StoreError> {
        self.begin(VoteFlow::Confirming(id))?;
        log!(Level::Debug, "Confirming vote for quote {id}");
        Ok(())
    }

    pub fn cancel_vote(&self) {
        let mut state = self.state();
        if let VoteFlow::Confirming(id) = state.vote_flow {
            log!(Level::Debug, "Vote for quote {id} cancelled");
            state.vote_flow = VoteFlow::Idle;
        }
    }

    pub async fn confirm_vote(&self) -> Result<(), StoreError> {
        let id = match self.vote_flow() {
            VoteFlow::Confirming(id) => id,
            _ => return Err(StoreError::NoPendingVote),
        };
        self.vote_quote(id).await
    }

    /// Casts the session's vote. The service decides; nothing changes locally
    /// until it has accepted.
    pub async fn vote_quote(&self, id: QuoteId) -> Result<(), StoreError> {
        self.begin(VoteFlow::Voting(id))?;
        let voting = VotingGuard { store: self, id };
        log!(Level::Debug, "Voting for quote {id}");

        let result = self.gateway.vote_quote(id).await;
        drop(voting);

        let receipt = match result {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.fail(e.into(), VOTE_NOTICE_TTL)),
        };

        let local = self.record_vote(id);
        if let (Some(local), VoteReceipt { count: Some(remote) }) = (local, &receipt) {
            if local != *remote {
                log!(
                    Level::Info,
                    "Vote count for quote {id} drifted (local {local}, service {remote})"
                );
                if self.refresh_vote_count(id).await.is_err() {
                    self.apply_vote_count(id, *remote);
                }
            }
        }
        Ok(())
    }

    /// Applies an accepted vote and returns the new local count.
    fn record_vote(&self, id: QuoteId) -> Option<u32> {
        let mut state = self.state();
        state.user_voted_quote_id = Some(id);
        let mut count = None;
        for quote in state.quotes.iter_mut() {
            if quote.id == id {
                quote.vote_count = quote.vote_count.saturating_add(1);
                quote.is_voted_by_user = Some(true);
                count = Some(quote.vote_count);
            } else {
                quote.is_voted_by_user = Some(false);
            }
        }
        state.touch();
        state.notify(
            NotificationKind::Success,
            "Your vote has been recorded!",
            VOTE_NOTICE_TTL,
        );
        count
    }

    fn apply_vote_count(&self, id: QuoteId, count: u32) {
        let mut state = self.state();
        if let Some(quote) = state.quotes.iter_mut().find(|q| q.id == id) {
            quote.vote_count = count;
            state.touch();
        }
    }

    /// Re-reads the service's count for `id` and stores it.
    pub async fn refresh_vote_count(&self, id: QuoteId) -> Result<u32, StoreError> {
        match self.gateway.vote_count(id).await {
            Ok(count) => {
                self.apply_vote_count(id, count);
                Ok(count)
            }
            Err(e) => {
                log!(Level::Warn, "Could not refresh vote count for {id}: {e}");
                Err(e.into())
            }
        }
    }
}
