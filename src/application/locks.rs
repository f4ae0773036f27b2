use crate::domain::account::AccountId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type SlotTable = Arc<StdMutex<HashMap<AccountId, Arc<Mutex<()>>>>>;

/// Per-account mutation rights, always acquired in `AccountId` order.
///
/// Two transfers moving funds between the same accounts in opposite
/// directions therefore queue on the same first lock instead of each holding
/// one and waiting for the other. Slots are created on first use and removed
/// once the last holder or waiter lets go, so the table only ever holds ids
/// that are currently contended. Ids of accounts that do not exist get a slot
/// too, but only for the length of the failed transfer.
#[derive(Default)]
pub struct AccountLocks {
    slots: SlotTable,
}

/// A reference to one slot; prunes the slot from the table when it is the
/// last reference outside the table itself.
struct SlotRef {
    id: AccountId,
    slot: Arc<Mutex<()>>,
    table: SlotTable,
}

impl Drop for SlotRef {
    fn drop(&mut self) {
        let mut slots = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under the table lock, so the count
        // cannot grow while it is held.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.id);
        }
    }
}

/// Holds the locks of both accounts of a transfer until dropped.
pub struct PairGuard {
    // Guards are declared before the slot references so they are released
    // first on drop.
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
    _slots: Vec<SlotRef>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: AccountId) -> SlotRef {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(id).or_default().clone();
        SlotRef {
            id,
            slot,
            table: self.slots.clone(),
        }
    }

    /// Locks both accounts, lowest identifier first.
    pub async fn lock_pair(&self, a: AccountId, b: AccountId) -> PairGuard {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut slots = vec![self.slot(first)];
        if first != second {
            slots.push(self.slot(second));
        }

        let first_guard = slots[0].slot.clone().lock_owned().await;
        let second_guard = match slots.get(1) {
            Some(slot) => Some(slot.slot.clone().lock_owned().await),
            None => None,
        };
        PairGuard {
            _first: first_guard,
            _second: second_guard,
            _slots: slots,
        }
    }

    /// Number of accounts that currently have a slot.
    pub fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
