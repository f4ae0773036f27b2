use crate::domain::account::{Account, AccountId, Balance, move_funds};
use crate::domain::ports::AccountStore;
use crate::domain::transfer::{Transfer, TransferId};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing account states.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for storing terminal transfer records.
pub const CF_TRANSFERS: &str = "transfers";

/// A persistent store implementation using RocksDB.
///
/// Accounts and transfer records live in separate Column Families. Every
/// write path runs under a single commit lock and lands as one `WriteBatch`,
/// so a pair application and its transfer record are committed together or
/// not at all. Reads go straight to the database and observe either the
/// state before or after a batch. All database calls run on tokio's blocking
/// pool, so the commit lock is a plain blocking acquire there.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("accounts" and "transfers") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_accounts = ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default());
        let cf_transfers = ColumnFamilyDescriptor::new(CF_TRANSFERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_accounts, cf_transfers])?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&self, batch: &mut WriteBatch, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        batch.put_cf(cf, key, serde_json::to_vec(value)?);
        Ok(())
    }

    /// Runs RocksDB I/O on the blocking pool. The closure runs to completion
    /// even if the caller stops waiting; each write path is a single batch,
    /// so it still lands entirely or not at all.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&RocksDBStore) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| LedgerError::InternalError(Box::new(e)))?
    }

    fn account(&self, id: &AccountId) -> Result<Account> {
        self.read(CF_ACCOUNTS, &id.to_bytes())?
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn create_account(&self, initial_balance: Balance) -> Result<AccountId> {
        let account = Account::open(Balance::new(initial_balance.value())?);
        self.blocking(move |store| {
            let _commit = store.commit_lock.blocking_lock();
            let mut batch = WriteBatch::default();
            store.put(&mut batch, CF_ACCOUNTS, &account.id.to_bytes(), &account)?;
            store.db.write(batch)?;
            Ok(account.id)
        })
        .await
    }

    async fn get(&self, id: &AccountId) -> Result<Option<Account>> {
        let id = *id;
        self.blocking(move |store| store.read(CF_ACCOUNTS, &id.to_bytes()))
            .await
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.blocking(|store| {
            let cf = store.cf(CF_ACCOUNTS)?;
            let mut accounts = Vec::new();
            for item in store.db.iterator_cf(cf, IteratorMode::Start) {
                let (_key, value) = item?;
                accounts.push(serde_json::from_slice(&value)?);
            }
            Ok(accounts)
        })
        .await
    }

    async fn apply_pair(&self, transfer: &Transfer) -> Result<Transfer> {
        if transfer.from == transfer.to {
            return Err(LedgerError::SameAccount(transfer.from.to_string()));
        }
        let transfer = transfer.clone();
        self.blocking(move |store| {
            let _commit = store.commit_lock.blocking_lock();

            let key = transfer.id.as_str().as_bytes();
            if let Some(existing) = store.read::<Transfer>(CF_TRANSFERS, key)? {
                return Err(LedgerError::Conflict(Box::new(existing)));
            }
            let mut from = store.account(&transfer.from)?;
            let mut to = store.account(&transfer.to)?;
            move_funds(&mut from, &mut to, transfer.amount)?;

            let applied = transfer.applied();
            let mut batch = WriteBatch::default();
            store.put(&mut batch, CF_ACCOUNTS, &from.id.to_bytes(), &from)?;
            store.put(&mut batch, CF_ACCOUNTS, &to.id.to_bytes(), &to)?;
            store.put(&mut batch, CF_TRANSFERS, applied.id.as_str().as_bytes(), &applied)?;
            store.db.write(batch)?;
            Ok(applied)
        })
        .await
    }

    async fn record_transfer(&self, transfer: Transfer) -> Result<Transfer> {
        self.blocking(move |store| {
            let _commit = store.commit_lock.blocking_lock();
            let key = transfer.id.as_str().as_bytes().to_vec();
            if let Some(existing) = store.read::<Transfer>(CF_TRANSFERS, &key)? {
                return Ok(existing);
            }
            let mut batch = WriteBatch::default();
            store.put(&mut batch, CF_TRANSFERS, &key, &transfer)?;
            store.db.write(batch)?;
            Ok(transfer)
        })
        .await
    }

    async fn get_transfer(&self, id: &TransferId) -> Result<Option<Transfer>> {
        let id = id.clone();
        self.blocking(move |store| store.read(CF_TRANSFERS, id.as_str().as_bytes()))
            .await
    }
}
