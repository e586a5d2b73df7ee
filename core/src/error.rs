use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid reference to {kind} '{id}'")]
    InvalidReference { kind: &'static str, id: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PresenceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PresenceError::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        PresenceError::NotFound { kind, id: id.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, PresenceError>;
