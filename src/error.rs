use crate::schema::api::QuoteId;

/// Failures coming out of the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No token held locally; the request never left the process.
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API Error: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The caller should be sent to log in instead of seeing this inline.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::Unauthorized(_)
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<isahc::Error> for ClientError {
    fn from(e: isahc::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

impl From<isahc::http::Error> for ClientError {
    fn from(e: isahc::http::Error) -> Self {
        ClientError::Network(e.to_string())
    }
}

/// Rejections raised by the quote store, either before a request is made or
/// wrapping the gateway failure that ended an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("You have already voted for quote #{0}")]
    AlreadyVoted(QuoteId),

    #[error("A vote for quote #{0} is already in progress")]
    VoteInProgress(QuoteId),

    #[error("No vote is waiting for confirmation")]
    NoPendingVote,

    #[error("Quote #{id} has {votes} vote(s) and can no longer be changed")]
    QuoteLocked { id: QuoteId, votes: u32 },

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),
}

impl StoreError {
    pub fn requires_login(&self) -> bool {
        matches!(self, StoreError::Client(e) if e.requires_login())
    }
}
