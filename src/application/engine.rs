use super::locks::AccountLocks;
use crate::domain::account::{Account, AccountId, Amount, Balance};
use crate::domain::ports::AccountStoreBox;
use crate::domain::transfer::{RejectionReason, Transfer, TransferId};
use crate::error::{LedgerError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Tuning knobs for the transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound for any single storage call or lock wait. Expiry is
    /// reported as `Unavailable`.
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// A transfer as submitted by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Idempotency key; generated when absent.
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub amount: i64,
}

impl TransferRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Shape validation. Never touches storage.
    fn validate(&self) -> Result<Transfer> {
        let amount = Amount::new(self.amount)?;
        let from: AccountId = self.from.parse()?;
        let to: AccountId = self.to.parse()?;
        let id = match &self.id {
            Some(id) => TransferId::new(id.as_str())?,
            None => TransferId::generate(),
        };
        Transfer::pending(id, from, to, amount)
    }
}

/// Terminal result of a successful transfer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub transfer: Transfer,
    /// The transfer id was already recorded; nothing was re-executed.
    pub replayed: bool,
}

/// Turns transfer requests into exactly one atomic balance mutation each.
///
/// The engine keeps no balance state of its own. Every transfer is validated,
/// checked against the transfer log for idempotency, and handed to the store
/// while the locks of both accounts are held. Rejections are recorded before
/// those locks are released, so a concurrent retry always sees a terminal
/// state.
pub struct TransferEngine {
    store: AccountStoreBox,
    locks: AccountLocks,
    config: EngineConfig,
}

impl TransferEngine {
    pub fn new(store: AccountStoreBox) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: AccountStoreBox, config: EngineConfig) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            config,
        }
    }

    async fn bounded<T>(&self, call: impl Future<Output = T>) -> Result<T> {
        Ok(tokio::time::timeout(self.config.store_timeout, call).await?)
    }

    pub async fn create_account(&self, initial_balance: i64) -> Result<AccountId> {
        let balance = Balance::new(initial_balance)?;
        let id = self.bounded(self.store.create_account(balance)).await??;
        info!(account = %id, initial_balance, "account created");
        Ok(id)
    }

    pub async fn balance(&self, account_id: &str) -> Result<Balance> {
        let id: AccountId = account_id.parse()?;
        self.bounded(self.store.get_balance(&id)).await?
    }

    pub async fn transfer_record(&self, transfer_id: &str) -> Result<Option<Transfer>> {
        let id = TransferId::new(transfer_id)?;
        self.bounded(self.store.get_transfer(&id)).await?
    }

    pub async fn accounts(&self) -> Result<Vec<Account>> {
        self.bounded(self.store.all_accounts()).await?
    }

    /// Executes a transfer.
    ///
    /// Business rejections come back as `InsufficientFunds` or `NotFound` and
    /// are recorded under the transfer id. A replay of a recorded id returns
    /// the recorded outcome with `replayed` set, or the recorded rejection.
    #[instrument(skip(self, request), fields(from = %request.from, to = %request.to, amount = request.amount))]
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferOutcome> {
        let pending = request.validate()?;

        if let Some(existing) = self.bounded(self.store.get_transfer(&pending.id)).await?? {
            return replay(&pending, existing);
        }

        let _guard = self
            .bounded(self.locks.lock_pair(pending.from, pending.to))
            .await?;
        debug!(transfer = %pending.id, "account locks acquired");

        let applied = self.bounded(self.store.apply_pair(&pending)).await;
        match applied {
            Ok(Ok(applied)) => {
                info!(transfer = %applied.id, "transfer applied");
                Ok(TransferOutcome {
                    transfer: applied,
                    replayed: false,
                })
            }
            Ok(Err(LedgerError::Conflict(existing))) => replay(&pending, *existing),
            Ok(Err(LedgerError::InsufficientFunds(_))) => {
                self.reject(pending, RejectionReason::InsufficientFunds).await
            }
            Ok(Err(LedgerError::NotFound(_))) => {
                self.reject(pending, RejectionReason::AccountNotFound).await
            }
            Ok(Err(err)) => Err(err),
            Err(_) => {
                // Store commits are atomic, so the call either landed
                // completely or not at all; a retry with the same id resolves
                // which.
                warn!(transfer = %pending.id, "transfer outcome unknown after timeout");
                Err(LedgerError::Unavailable(format!(
                    "outcome of transfer {} unknown, retry with the same transfer id",
                    pending.id
                )))
            }
        }
    }

    async fn reject(&self, pending: Transfer, reason: RejectionReason) -> Result<TransferOutcome> {
        let rejected = pending.clone().rejected(reason);
        let recorded = self
            .bounded(self.store.record_transfer(rejected.clone()))
            .await??;
        if recorded != rejected {
            return replay(&pending, recorded);
        }
        warn!(transfer = %recorded.id, %reason, "transfer rejected");
        recorded.outcome().map(|transfer| TransferOutcome {
            transfer,
            replayed: false,
        })
    }
}

fn replay(pending: &Transfer, existing: Transfer) -> Result<TransferOutcome> {
    if !existing.same_request(pending) {
        return Err(LedgerError::InvalidArgument(format!(
            "transfer id {} was already used for a different transfer",
            pending.id
        )));
    }
    debug!(transfer = %existing.id, status = ?existing.status, "replaying recorded transfer");
    existing.outcome().map(|transfer| TransferOutcome {
        transfer,
        replayed: true,
    })
}
