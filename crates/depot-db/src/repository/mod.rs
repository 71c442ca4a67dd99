//! # Repository Module
//!
//! Data access for the three ledger tables.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Public, pool-backed reads             Crate-internal *_in helpers     │
//! │  ─────────────────────────             ───────────────────────────     │
//! │  StockStore::get / list / upsert       stock::get_or_create_in         │
//! │  HistoryLog::for_stock / reconcile     history::append_in              │
//! │  EntryJournal::get / by_reference      journal::insert_in              │
//! │                                                                         │
//! │  The *_in helpers take `&mut SqliteConnection` borrowed from the       │
//! │  ledger processor's unit of work and never open their own.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StockStore`] - Balances and metadata
//! - [`HistoryLog`] - Append-only audit chain
//! - [`EntryJournal`] - Committed ledger entries

pub mod history;
pub mod journal;
pub(crate) mod rows;
pub mod stock;

pub use history::{HistoryLog, Reconciliation};
pub use journal::EntryJournal;
pub use stock::{StockFilter, StockStore};
