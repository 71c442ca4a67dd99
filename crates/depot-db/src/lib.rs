//! # depot-db: Persistence and Ledger Processing for Depot
//!
//! This crate owns every write to the stock ledger. It uses SQLite for
//! storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Depot Data Flow                                │
//! │                                                                         │
//! │  Collaborator (receiving, shipping, cycle count)                       │
//! │       │  LedgerEntry / adjustment                                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     depot-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │    ledger     │   │  repository   │   │    views     │    │   │
//! │  │   │               │   │               │   │              │    │   │
//! │  │   │ Processor ────┼──►│ StockStore    │◄──┤ low_stock    │    │   │
//! │  │   │ BatchRunner   │   │ HistoryLog    │   │ location_    │    │   │
//! │  │   │               │   │ EntryJournal  │   │   value      │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) • migrations • DepotConfig (config.rs)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL) ── stock_records • ledger_entries • stock_history        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage, ledger, batch and config errors
//! - [`repository`] - Stock store, history log, entry journal
//! - [`ledger`] - Ledger processor and batch runner
//! - [`views`] - Read-only query views
//! - [`config`] - TOML + environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use depot_core::{LedgerEntry, ProductId, Warehouse, WarehouseId};
//! use depot_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("depot.db")).await?;
//!
//! let entry = LedgerEntry::<Warehouse>::inbound(ProductId::new("P-1"), WarehouseId::new("W-1"), dec!(100))
//!     .with_reference("PO-1");
//! let history = db.ledger::<Warehouse>().process_entry(entry, "receiver").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod views;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{DatabaseSettings, DepotConfig, StockSettings};
pub use error::{BatchError, ConfigError, DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::{BatchReport, BatchRunner, LedgerProcessor, UnitOfWork};
pub use pool::{Database, DbConfig};
pub use repository::{EntryJournal, HistoryLog, Reconciliation, StockFilter, StockStore};
pub use views::QueryViews;
