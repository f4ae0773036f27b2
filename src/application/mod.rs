//! Application layer orchestrating the ledger core.
//!
//! `TransferEngine` turns transfer requests into atomic, idempotent store
//! mutations, acquiring per-account locks in a fixed order. `LedgerService`
//! wraps it as the caller-facing contract and translates failures into
//! stable error kinds.

pub mod engine;
pub mod locks;
pub mod service;
