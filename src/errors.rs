use thiserror::Error;
use uuid::Uuid;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error type that captures ledger failures surfaced to callers.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Expense not found: {0}")]
    NotFound(Uuid),
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures raised by a key-value store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}
