use crate::models::UserId;
use thiserror::Error;

/// Failure of one of the backing stores (relational or document)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{backend} query failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    #[error("invalid {backend} data: {message}")]
    InvalidData {
        backend: &'static str,
        message: String,
    },
}

/// Failure of the external compatibility scorer
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("scorer returned status {0}")]
    Status(u16),

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("scorer returned no results")]
    EmptyResponse,

    #[error("client configuration error: {0}")]
    Config(String),
}

impl ScorerError {
    /// Whether a second attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ScorerError::Transport(_) | ScorerError::Timeout => true,
            ScorerError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

/// Failure to turn a bearer credential into a user id
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    Missing,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("invalid key material: {0}")]
    Key(String),
}

/// Typed failure of the swipe list operation
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("authentication required")]
    AuthRequired,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("user {caller} may not read the swipe list of user {subject}")]
    Forbidden { caller: UserId, subject: UserId },

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("no consumption pattern for user {0}")]
    NoConsumptionPattern(UserId),

    #[error("compatibility scorer failed: {0}")]
    External(#[from] ScorerError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),

    #[error("request cancelled")]
    Cancelled,
}

impl From<AuthError> for MatchError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Missing => MatchError::AuthRequired,
            other => MatchError::InvalidToken(other.to_string()),
        }
    }
}

impl MatchError {
    /// Stable error code exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::AuthRequired => "AUTH_001",
            MatchError::Forbidden { .. } => "AUTH_002",
            MatchError::InvalidToken(_) => "AUTH_009",
            MatchError::UserNotFound(_) => "USER_008",
            MatchError::NoConsumptionPattern(_) => "MATCH_001",
            MatchError::External(_) => "EXTERNAL_001",
            MatchError::Store(_) => "SERVER_001",
            MatchError::Cancelled => "REQUEST_002",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            MatchError::AuthRequired | MatchError::InvalidToken(_) => 401,
            MatchError::Forbidden { .. } => 403,
            MatchError::UserNotFound(_) | MatchError::NoConsumptionPattern(_) => 404,
            MatchError::External(_) => 502,
            MatchError::Store(_) => 500,
            MatchError::Cancelled => 499,
        }
    }

    /// "Retry later" as opposed to "fix the request"
    pub fn is_retryable(&self) -> bool {
        matches!(self, MatchError::External(_) | MatchError::Store(_))
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> &'static str {
        match self {
            MatchError::AuthRequired => "Authentication is required",
            MatchError::InvalidToken(_) => "The token is invalid",
            MatchError::Forbidden { .. } => "Access denied",
            MatchError::UserNotFound(_) => "User not found",
            MatchError::NoConsumptionPattern(_) => "No consumption pattern has been analysed for this user yet",
            MatchError::External(_) => "The matching service is unavailable, try again later",
            MatchError::Store(_) => "Internal server error",
            MatchError::Cancelled => "Request cancelled",
        }
    }
}
