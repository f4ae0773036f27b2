use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque, globally unique account identifier.
///
/// Backed by a time-ordered UUIDv7, so the derived `Ord` is also the total
/// order used when acquiring per-account locks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Allocates a fresh identifier. Identifiers are never reused.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Big-endian key bytes; byte order matches the `Ord` of the id.
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AccountId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::from_str(s.trim())
            .map(Self)
            .map_err(|e| LedgerError::InvalidArgument(format!("malformed account id {s:?}: {e}")))
    }
}

/// An account balance in the smallest currency unit.
///
/// Signed so that arithmetic never wraps silently; the store guarantees it
/// never drops below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(pub i64);

impl Balance {
    /// Validates an opening balance.
    pub fn new(value: i64) -> Result<Self> {
        if value >= 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidArgument(format!(
                "initial balance must not be negative, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Returns the balance after debiting `amount`, or `None` if it would go
    /// negative.
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        self.0
            .checked_sub(amount.value())
            .filter(|v| *v >= 0)
            .map(Self)
    }

    /// Returns the balance after crediting `amount`, or `None` on overflow.
    pub fn checked_credit(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.value()).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strictly positive transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidArgument(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A balance-holding ledger account.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Account {
    /// Immutable identifier assigned at creation.
    pub id: AccountId,
    /// Balance the account was opened with.
    pub initial_balance: Balance,
    /// Current committed balance.
    pub balance: Balance,
}

impl Account {
    pub fn open(initial_balance: Balance) -> Self {
        Self {
            id: AccountId::generate(),
            initial_balance,
            balance: initial_balance,
        }
    }
}

/// Moves `amount` from `debit` to `credit`, or leaves both untouched.
///
/// Both new balances are computed before either account is written.
pub fn move_funds(debit: &mut Account, credit: &mut Account, amount: Amount) -> Result<()> {
    if debit.id == credit.id {
        return Err(LedgerError::SameAccount(debit.id.to_string()));
    }
    let debited = debit
        .balance
        .checked_debit(amount)
        .ok_or_else(|| LedgerError::InsufficientFunds(debit.id.to_string()))?;
    let credited = credit.balance.checked_credit(amount).ok_or_else(|| {
        LedgerError::InvalidArgument(format!("balance of {} would overflow", credit.id))
    })?;
    debit.balance = debited;
    credit.balance = credited;
    Ok(())
}
