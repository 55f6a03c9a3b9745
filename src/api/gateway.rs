use async_trait::async_trait;

use crate::{
    error::ClientError,
    schema::api::{Credentials, LoginResponse, Quote, QuoteBody, QuoteId, VoteReceipt},
};

/// Quote operations against the remote service.
///
/// Implementations attach the session's bearer token themselves; gated
/// operations must fail with [`ClientError::NotAuthenticated`] without
/// touching the network when no token is held.
#[async_trait]
pub trait QuoteGateway: Send + Sync {
    async fn list_quotes(&self) -> Result<Vec<Quote>, ClientError>;

    /// `None` when there is no token or the session has not voted.
    async fn user_voted_quote_id(&self) -> Result<Option<QuoteId>, ClientError>;

    async fn create_quote(&self, body: &QuoteBody) -> Result<Quote, ClientError>;

    async fn update_quote(&self, quote: &Quote) -> Result<Quote, ClientError>;

    async fn delete_quote(&self, id: QuoteId) -> Result<(), ClientError>;

    async fn vote_quote(&self, id: QuoteId) -> Result<VoteReceipt, ClientError>;

    async fn vote_count(&self, id: QuoteId) -> Result<u32, ClientError>;
}

#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn login(&self, creds: &Credentials) -> Result<LoginResponse, ClientError>;

    async fn register(&self, creds: &Credentials) -> Result<(), ClientError>;
}
