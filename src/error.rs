use thiserror::Error;

/// Operation failures surfaced to clients. Validation, conflict and
/// not-found are distinguishable so callers can react differently
/// ("already enrolled" is not "course full"). Database errors carry the
/// underlying cause for the server log but serialize to a generic message.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl OpError {
    pub fn validation(msg: impl Into<String>) -> Self {
        OpError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        OpError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        OpError::NotFound(msg.into())
    }

    /// Message safe to send over the wire.
    pub fn client_message(&self) -> String {
        match self {
            OpError::Db(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type OpResult<T> = Result<T, OpError>;
