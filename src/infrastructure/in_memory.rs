use crate::domain::account::{Account, AccountId, Balance, move_funds};
use crate::domain::ports::AccountStore;
use crate::domain::transfer::{Transfer, TransferId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type AccountCell = Arc<Mutex<Account>>;

/// A thread-safe in-memory account store.
///
/// Each account sits behind its own mutex so that pair applications on
/// disjoint accounts never wait on each other. The outer map lock is only
/// held long enough to look up or insert cells. Lock order is always: map,
/// then account cells in `AccountId` order, then the transfer log.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<AccountId, AccountCell>>>,
    transfers: Arc<RwLock<HashMap<TransferId, Transfer>>>,
}

impl InMemoryAccountStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, id: &AccountId) -> Result<AccountCell> {
        let accounts = self.accounts.read().await;
        accounts
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create_account(&self, initial_balance: Balance) -> Result<AccountId> {
        let account = Account::open(Balance::new(initial_balance.value())?);
        let id = account.id;
        let mut accounts = self.accounts.write().await;
        accounts.insert(id, Arc::new(Mutex::new(account)));
        Ok(id)
    }

    async fn get(&self, id: &AccountId) -> Result<Option<Account>> {
        let cell = self.accounts.read().await.get(id).cloned();
        match cell {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let mut cells: Vec<(AccountId, AccountCell)> = self
            .accounts
            .read()
            .await
            .iter()
            .map(|(id, cell)| (*id, cell.clone()))
            .collect();
        cells.sort_by_key(|(id, _)| *id);

        // Every cell is held at once, in id order, so no pair application
        // can commit halfway through the listing.
        let mut guards = Vec::with_capacity(cells.len());
        for (_, cell) in &cells {
            guards.push(cell.lock().await);
        }
        Ok(guards.iter().map(|account| (**account).clone()).collect())
    }

    async fn apply_pair(&self, transfer: &Transfer) -> Result<Transfer> {
        if transfer.from == transfer.to {
            return Err(LedgerError::SameAccount(transfer.from.to_string()));
        }
        // A recorded id wins over account lookups, so retries always replay.
        if let Some(existing) = self.transfers.read().await.get(&transfer.id) {
            return Err(LedgerError::Conflict(Box::new(existing.clone())));
        }
        let from = self.cell(&transfer.from).await?;
        let to = self.cell(&transfer.to).await?;

        let (mut from_guard, mut to_guard) = if transfer.from < transfer.to {
            let from_guard = from.lock().await;
            let to_guard = to.lock().await;
            (from_guard, to_guard)
        } else {
            let to_guard = to.lock().await;
            let from_guard = from.lock().await;
            (from_guard, to_guard)
        };

        // Checked again under the cell locks for concurrent submissions.
        let mut transfers = self.transfers.write().await;
        if let Some(existing) = transfers.get(&transfer.id) {
            return Err(LedgerError::Conflict(Box::new(existing.clone())));
        }

        // No await past this point: balances and the record change together.
        move_funds(&mut from_guard, &mut to_guard, transfer.amount)?;
        let applied = transfer.clone().applied();
        transfers.insert(applied.id.clone(), applied.clone());
        Ok(applied)
    }

    async fn record_transfer(&self, transfer: Transfer) -> Result<Transfer> {
        let mut transfers = self.transfers.write().await;
        let stored = transfers
            .entry(transfer.id.clone())
            .or_insert(transfer)
            .clone();
        Ok(stored)
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>> {
        let transfers = self.transfers.read().await;
        Ok(transfers.get(id).cloned())
    }
}
