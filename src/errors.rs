use thiserror::Error;

/// Error taxonomy shared by the directories, the sale builder, and every store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SalesError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SalesError>;

impl SalesError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SalesError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        SalesError::NotFound(message.into())
    }

    /// Returns `true` for failures the caller may degrade around (read-only fallback).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, SalesError::StoreUnavailable(_))
    }
}

impl From<std::io::Error> for SalesError {
    fn from(err: std::io::Error) -> Self {
        SalesError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SalesError {
    fn from(err: serde_json::Error) -> Self {
        SalesError::Parse(err.to_string())
    }
}
