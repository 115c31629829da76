use thiserror::Error;

/// Error type that captures ledger, validation, and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} is still referenced by ledger transactions")]
    StillReferenced(String),
    #[error("occurrence already resolved for {0}")]
    AlreadyResolved(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
