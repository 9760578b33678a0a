use thiserror::Error;

/// A server payload that did not match the expected shape.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("malformed response body: {0}")]
    Body(String),

    #[error("record {index}: {reason}")]
    Field { index: usize, reason: String },
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("session expired, please log in again")]
    SessionExpired,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("{0}")]
    ValidationFailure(String),

    #[error("{0}")]
    ConflictFailure(String),

    #[error("network failure: {0}")]
    Decode(#[from] DecodeError),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        DashboardError::ValidationFailure(message.into())
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, DashboardError::SessionExpired)
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(error: reqwest::Error) -> Self {
        DashboardError::NetworkFailure(error.to_string())
    }
}
