use super::engine::{EngineConfig, TransferEngine, TransferRequest};
use crate::domain::account::Account;
use crate::domain::ports::AccountStoreBox;
use crate::domain::transfer::Transfer;
use crate::error::LedgerError;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Error kinds visible to callers of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    InsufficientFunds,
    SameAccount,
    /// Transient backend failure; retrying the same request is safe.
    Unavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::InsufficientFunds => "insufficient funds",
            ErrorKind::SameAccount => "same account",
            ErrorKind::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn unavailable() -> Self {
        Self::new(
            ErrorKind::Unavailable,
            "ledger backend unavailable, retry later",
        )
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidArgument(message) => {
                ServiceError::new(ErrorKind::InvalidArgument, message)
            }
            LedgerError::NotFound(account) => {
                ServiceError::new(ErrorKind::NotFound, format!("account not found: {account}"))
            }
            LedgerError::InsufficientFunds(account) => ServiceError::new(
                ErrorKind::InsufficientFunds,
                format!("insufficient funds in account {account}"),
            ),
            LedgerError::SameAccount(account) => ServiceError::new(
                ErrorKind::SameAccount,
                format!("cannot transfer from account {account} to itself"),
            ),
            LedgerError::Unavailable(detail) => {
                error!(%detail, "ledger storage unavailable");
                ServiceError::unavailable()
            }
            other => {
                error!(error = %other, "unexpected ledger failure");
                ServiceError::unavailable()
            }
        }
    }
}

/// Confirmation of a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub transfer_id: String,
    /// The transfer had already been applied under this id.
    pub replayed: bool,
}

/// The boundary contract of the ledger core.
///
/// Callers hand in opaque identifiers and integer amounts and receive either
/// a terminal result or a [`ServiceError`]. No storage detail crosses this
/// boundary.
pub struct LedgerService {
    engine: TransferEngine,
}

impl LedgerService {
    pub fn new(store: AccountStoreBox) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: AccountStoreBox, config: EngineConfig) -> Self {
        Self {
            engine: TransferEngine::with_config(store, config),
        }
    }

    /// Opens an account and returns its identifier.
    pub async fn create_account(&self, initial_balance: i64) -> Result<String, ServiceError> {
        let id = self.engine.create_account(initial_balance).await?;
        Ok(id.to_string())
    }

    /// Moves `amount` between two accounts under a fresh transfer id.
    pub async fn transfer_funds(
        &self,
        from_account_id: &str,
        to_account_id: &str,
        amount: i64,
    ) -> Result<(), ServiceError> {
        self.submit_transfer(None, from_account_id, to_account_id, amount)
            .await
            .map(|_| ())
    }

    /// Idempotent transfer: resubmitting the same `transfer_id` returns the
    /// first outcome without moving funds again.
    pub async fn submit_transfer(
        &self,
        transfer_id: Option<&str>,
        from_account_id: &str,
        to_account_id: &str,
        amount: i64,
    ) -> Result<TransferReceipt, ServiceError> {
        let mut request = TransferRequest::new(from_account_id, to_account_id, amount);
        if let Some(id) = transfer_id {
            request = request.with_id(id);
        }
        let outcome = self.engine.transfer(request).await?;
        Ok(TransferReceipt {
            transfer_id: outcome.transfer.id.to_string(),
            replayed: outcome.replayed,
        })
    }

    pub async fn get_balance(&self, account_id: &str) -> Result<i64, ServiceError> {
        Ok(self.engine.balance(account_id).await?.value())
    }

    /// Looks up a recorded (terminal) transfer.
    pub async fn get_transfer(&self, transfer_id: &str) -> Result<Option<Transfer>, ServiceError> {
        Ok(self.engine.transfer_record(transfer_id).await?)
    }

    pub async fn accounts(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.engine.accounts().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryAccountStore;

    fn service() -> LedgerService {
        LedgerService::new(Box::new(InMemoryAccountStore::new()))
    }

    #[tokio::test]
    async fn test_create_account_negative_balance() {
        let err = service().create_account(-10).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_error_kinds() {
        let service = service();
        let a = service.create_account(100).await.unwrap();
        let b = service.create_account(0).await.unwrap();

        let kind = |r: Result<(), ServiceError>| r.unwrap_err().kind;
        assert_eq!(
            kind(service.transfer_funds(&a, &b, 0).await),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(service.transfer_funds(&a, "garbage", 1).await),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            kind(service.transfer_funds(&a, &a, 10).await),
            ErrorKind::SameAccount
        );
        assert_eq!(
            kind(service.transfer_funds(&a, &b, 101).await),
            ErrorKind::InsufficientFunds
        );
        let ghost = crate::domain::account::AccountId::generate().to_string();
        assert_eq!(
            kind(service.transfer_funds(&ghost, &b, 1).await),
            ErrorKind::NotFound
        );
        assert_eq!(
            service.get_balance(&ghost).await.unwrap_err().kind,
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_unavailable_hides_storage_detail() {
        let err: ServiceError =
            LedgerError::Unavailable("IO error: /var/lib/ledger/LOCK busy".to_string()).into();
        assert_eq!(err.kind, ErrorKind::Unavailable);
        assert!(!err.message.contains("/var/lib"));

        let internal: ServiceError =
            LedgerError::InternalError(Box::new(std::io::Error::other("corrupt row"))).into();
        assert_eq!(internal.kind, ErrorKind::Unavailable);
        assert!(!internal.message.contains("corrupt"));
    }

    #[tokio::test]
    async fn test_submit_transfer_receipt() {
        let service = service();
        let a = service.create_account(50).await.unwrap();
        let b = service.create_account(0).await.unwrap();

        let first = service
            .submit_transfer(Some("order-42"), &a, &b, 20)
            .await
            .unwrap();
        assert_eq!(first.transfer_id, "order-42");
        assert!(!first.replayed);

        let retry = service
            .submit_transfer(Some("order-42"), &a, &b, 20)
            .await
            .unwrap();
        assert!(retry.replayed);
        assert_eq!(service.get_balance(&a).await.unwrap(), 30);
        assert_eq!(service.get_balance(&b).await.unwrap(), 20);

        let recorded = service.get_transfer("order-42").await.unwrap().unwrap();
        assert_eq!(recorded.amount.value(), 20);
    }
}
