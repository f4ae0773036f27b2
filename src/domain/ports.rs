use super::account::{Account, AccountId, Balance};
use super::transfer::{Transfer, TransferId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;

/// Durable keyed storage of accounts and of terminal transfer records.
///
/// Implementations own their synchronization. `apply_pair` is the only way a
/// balance changes, and it must be serializable with respect to every other
/// `apply_pair` or read touching the same account. None of the write paths
/// may suspend between their first mutation and completion, so dropping the
/// future either leaves the store untouched or fully committed.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a freshly opened account and returns its identifier.
    async fn create_account(&self, initial_balance: Balance) -> Result<AccountId>;

    async fn get(&self, id: &AccountId) -> Result<Option<Account>>;

    async fn all_accounts(&self) -> Result<Vec<Account>>;

    /// Atomically debits `transfer.from`, credits `transfer.to` and records the
    /// transfer as applied, or does none of it.
    ///
    /// Fails with `NotFound`, `InsufficientFunds`, `SameAccount`, or with
    /// `Conflict` carrying the existing record when the transfer id has
    /// already been recorded.
    async fn apply_pair(&self, transfer: &Transfer) -> Result<Transfer>;

    /// Records a terminal transfer unless one with the same id exists.
    /// Returns whichever record is stored afterwards.
    async fn record_transfer(&self, transfer: Transfer) -> Result<Transfer>;

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>>;

    async fn get_balance(&self, id: &AccountId) -> Result<Balance> {
        self.get(id)
            .await?
            .map(|account| account.balance)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }
}

pub type AccountStoreBox = Box<dyn AccountStore>;
