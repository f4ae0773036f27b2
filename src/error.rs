use crate::domain::transfer::Transfer;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("account not found: {0}")]
    NotFound(String),
    #[error("insufficient funds in account {0}")]
    InsufficientFunds(String),
    #[error("source and destination account are the same: {0}")]
    SameAccount(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The transfer id is already recorded; carries the recorded transfer.
    #[error("transfer {} already recorded", .0.id)]
    Conflict(Box<Transfer>),
    #[error("internal error: {0}")]
    InternalError(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LedgerError {
    /// Whether the caller may retry the same request without risk of
    /// double application.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Unavailable(err.into_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::InternalError(Box::new(err))
    }
}

impl From<tokio::time::error::Elapsed> for LedgerError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        LedgerError::Unavailable("storage call timed out".to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
