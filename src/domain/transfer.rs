use super::account::{AccountId, Amount};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const MAX_TRANSFER_ID_LEN: usize = 128;

/// Idempotency key of a transfer.
///
/// Callers may supply their own key so that retries are detected; otherwise
/// the engine generates one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LedgerError::InvalidArgument(
                "transfer id must not be empty".to_string(),
            ));
        }
        if value.len() > MAX_TRANSFER_ID_LEN {
            return Err(LedgerError::InvalidArgument(format!(
                "transfer id longer than {MAX_TRANSFER_ID_LEN} bytes"
            )));
        }
        Ok(Self(value))
    }

    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a transfer ended up rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientFunds,
    AccountNotFound,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InsufficientFunds => f.write_str("insufficient funds"),
            RejectionReason::AccountNotFound => f.write_str("account not found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "reason")]
pub enum TransferStatus {
    #[default]
    Pending,
    Applied,
    Rejected(RejectionReason),
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Pending)
    }
}

/// A request to move `amount` from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    pub status: TransferStatus,
}

impl Transfer {
    /// Builds a pending transfer. Self-transfers are refused here, before any
    /// storage is involved.
    pub fn pending(id: TransferId, from: AccountId, to: AccountId, amount: Amount) -> Result<Self> {
        if from == to {
            return Err(LedgerError::SameAccount(from.to_string()));
        }
        Ok(Self {
            id,
            from,
            to,
            amount,
            status: TransferStatus::Pending,
        })
    }

    /// Whether `other` describes the same money movement (ignoring status).
    pub fn same_request(&self, other: &Transfer) -> bool {
        self.id == other.id
            && self.from == other.from
            && self.to == other.to
            && self.amount == other.amount
    }

    pub fn applied(mut self) -> Self {
        self.status = TransferStatus::Applied;
        self
    }

    pub fn rejected(mut self, reason: RejectionReason) -> Self {
        self.status = TransferStatus::Rejected(reason);
        self
    }

    /// Replays the terminal outcome of a recorded transfer as the result the
    /// original submission produced.
    pub fn outcome(self) -> Result<Transfer> {
        match self.status {
            TransferStatus::Applied => Ok(self),
            TransferStatus::Rejected(RejectionReason::InsufficientFunds) => {
                Err(LedgerError::InsufficientFunds(self.from.to_string()))
            }
            TransferStatus::Rejected(RejectionReason::AccountNotFound) => Err(
                LedgerError::NotFound(format!("{} or {}", self.from, self.to)),
            ),
            TransferStatus::Pending => Err(LedgerError::Unavailable(format!(
                "transfer {} has no terminal status",
                self.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (AccountId, AccountId) {
        (AccountId::generate(), AccountId::generate())
    }

    #[test]
    fn test_transfer_id_validation() {
        assert!(TransferId::new("tx-1").is_ok());
        assert!(matches!(
            TransferId::new("  "),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            TransferId::new("x".repeat(129)),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_pending_rejects_self_transfer() {
        let (a, _) = ids();
        let result = Transfer::pending(TransferId::generate(), a, a, Amount::new(10).unwrap());
        assert!(matches!(result, Err(LedgerError::SameAccount(_))));
    }

    #[test]
    fn test_status_transitions() {
        let (a, b) = ids();
        let tx = Transfer::pending(TransferId::generate(), a, b, Amount::new(1).unwrap()).unwrap();
        assert!(!tx.status.is_terminal());

        let applied = tx.clone().applied();
        assert_eq!(applied.status, TransferStatus::Applied);
        assert!(applied.status.is_terminal());
        assert!(applied.same_request(&tx));

        let rejected = tx.rejected(RejectionReason::InsufficientFunds);
        assert!(matches!(
            rejected.outcome(),
            Err(LedgerError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TransferStatus::Rejected(
            RejectionReason::AccountNotFound,
        ))
        .unwrap();
        assert_eq!(json, r#"{"status":"rejected","reason":"account_not_found"}"#);

        let back: TransferStatus = serde_json::from_str(r#"{"status":"applied"}"#).unwrap();
        assert_eq!(back, TransferStatus::Applied);
    }
}
