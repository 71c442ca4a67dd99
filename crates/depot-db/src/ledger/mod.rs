//! # Ledger Module
//!
//! Everything that mutates balances.
//!
//! - [`LedgerProcessor`] - One entry or adjustment per unit of work
//! - [`BatchRunner`] - Ordered entries, per-entry commits

pub mod batch;
pub mod processor;

pub use batch::{BatchReport, BatchRunner};
pub use processor::{LedgerProcessor, UnitOfWork};
