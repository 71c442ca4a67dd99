//! # depot-core: Pure Ledger Logic for Depot
//!
//! This crate holds the rules of the stock ledger as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Depot Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Collaborators                                │   │
//! │  │    receiving, shipping, production, cycle counts               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LedgerEntry / adjustment               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 depot-db (Ledger Processor)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ depot-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ identity  │  │  types    │  │ movement  │  │ validation│  │   │
//! │  │   │ Keyspace  │  │ Stock/    │  │ IN/OUT/   │  │  entries  │  │   │
//! │  │   │ ProductId │  │ History   │  │ ADJUST    │  │  actors   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │  audit    │  │  views    │                                 │   │
//! │  │   │  chains   │  │ low/value │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **Exact Decimals**: quantities are `rust_decimal::Decimal`, never floats
//! 3. **One Implementation**: every keyspace (warehouse, retail) shares it
//! 4. **Explicit Errors**: typed errors, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use depot_core::movement::Movement;
//! use depot_core::EntryKind;
//! use rust_decimal::Decimal;
//!
//! let received = Movement::entry(EntryKind::In, Decimal::ZERO, Decimal::from(100), "P-1", "W-1").unwrap();
//! let shipped = Movement::entry(EntryKind::Out, received.new, Decimal::from(30), "P-1", "W-1").unwrap();
//! assert_eq!(shipped.new, Decimal::from(70));
//!
//! // Overselling is rejected
//! assert!(Movement::entry(EntryKind::Out, shipped.new, Decimal::from(100), "P-1", "W-1").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod identity;
pub mod movement;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{verify_chain, ChainBreak, ChainReport};
pub use error::{CoreError, CoreResult, ValidationError};
pub use identity::{Identity, Keyspace, ProductId, Retail, Sku, StoreId, Warehouse, WarehouseId};
pub use movement::Movement;
pub use types::*;
pub use views::{LocationValuation, PriceList, StockThresholds, UnitPriceLookup};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an entry's correlation reference (e.g. "PO-2026-0001").
pub const MAX_REFERENCE_LEN: usize = 100;

/// Maximum length of a free-text note.
pub const MAX_NOTE_LEN: usize = 500;

/// Maximum length of an actor identifier.
pub const MAX_ACTOR_LEN: usize = 100;
