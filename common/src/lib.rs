//! Common types and utilities for the account ledger
//!
//! This library contains the entity model, the shared error type and the
//! database plumbing used by the ledger service and its RPC gateway.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;

// Re-export database types
pub use db::transaction::{LedgerTransaction, TransactionManager};
