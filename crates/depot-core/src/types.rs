//! # Domain Types
//!
//! Core domain types of the stock ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  LedgerEntry    │   │  StockRecord    │   │ HistoryRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  kind IN|OUT    │──►│  (item, loc)    │──►│  kind IN|OUT|   │       │
//! │  │  quantity > 0   │   │  quantity ≥ 0   │   │       ADJUST    │       │
//! │  │  reference      │   │  batch/lot/bin  │   │  prev → new     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │    request of intent     current balance       immutable audit row     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All quantities are [`Decimal`]. Floating point never touches a balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::Keyspace;

// =============================================================================
// Kinds
// =============================================================================

/// Direction of a requested ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Stock arrives (receipt, production output, return).
    In,
    /// Stock leaves (shipment, consumption).
    Out,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::In => "in",
            EntryKind::Out => "out",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a committed mutation as recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
    /// Direct override from a physical count.
    Adjust,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjust => "adjust",
        }
    }
}

impl From<EntryKind> for MovementKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::In => MovementKind::In,
            EntryKind::Out => MovementKind::Out,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Record
// =============================================================================

/// Current balance and descriptive metadata for one (item, location) pair.
///
/// Exactly one exists per pair. It is created lazily with quantity zero and
/// never deleted: "no stock" is `quantity == 0`, not a missing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StockRecord<K: Keyspace> {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub item_id: K::Item,
    pub location_id: K::Location,

    /// Current on-hand quantity.
    pub quantity: Decimal,

    pub bin_location: Option<String>,
    pub shelf_number: Option<String>,
    pub zone_code: Option<String>,
    pub batch_number: Option<String>,
    pub lot_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<K: Keyspace> StockRecord<K> {
    /// A fresh zero balance with no metadata.
    pub fn empty(item_id: K::Item, location_id: K::Location) -> Self {
        let now = Utc::now();
        StockRecord {
            id: Uuid::new_v4().to_string(),
            item_id,
            location_id,
            quantity: Decimal::ZERO,
            bin_location: None,
            shelf_number: None,
            zone_code: None,
            batch_number: None,
            lot_number: None,
            manufacture_date: None,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks whether the record's expiry date has passed.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry < today)
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// A requested IN/OUT movement.
///
/// Built by collaborators (receiving, shipping, production) and handed to
/// the processor. Persisted verbatim once committed, never mutated after.
///
/// ## Example
/// ```rust
/// use depot_core::{LedgerEntry, Warehouse, ProductId, WarehouseId};
/// use rust_decimal::Decimal;
///
/// let entry = LedgerEntry::<Warehouse>::inbound(
///     ProductId::new("P-1"),
///     WarehouseId::new("W-1"),
///     Decimal::from(100),
/// )
/// .with_reference("PO-1");
///
/// assert_eq!(entry.reference.as_deref(), Some("PO-1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LedgerEntry<K: Keyspace> {
    pub id: String,
    pub item_id: K::Item,
    pub location_id: K::Location,
    pub kind: EntryKind,
    /// Magnitude of the movement, must be > 0.
    pub quantity: Decimal,

    pub batch_number: Option<String>,
    pub lot_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,

    /// Correlation id of the originating document (receipt, shipment...).
    pub reference: Option<String>,
    pub note: Option<String>,

    /// Filled in by the processor from its `actor` argument.
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl<K: Keyspace> LedgerEntry<K> {
    pub fn new(kind: EntryKind, item_id: K::Item, location_id: K::Location, quantity: Decimal) -> Self {
        LedgerEntry {
            id: Uuid::new_v4().to_string(),
            item_id,
            location_id,
            kind,
            quantity,
            batch_number: None,
            lot_number: None,
            manufacture_date: None,
            expiry_date: None,
            reference: None,
            note: None,
            actor: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn inbound(item_id: K::Item, location_id: K::Location, quantity: Decimal) -> Self {
        Self::new(EntryKind::In, item_id, location_id, quantity)
    }

    pub fn outbound(item_id: K::Item, location_id: K::Location, quantity: Decimal) -> Self {
        Self::new(EntryKind::Out, item_id, location_id, quantity)
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_batch(mut self, batch_number: impl Into<String>) -> Self {
        self.batch_number = Some(batch_number.into());
        self
    }

    pub fn with_lot(mut self, lot_number: impl Into<String>) -> Self {
        self.lot_number = Some(lot_number.into());
        self
    }

    pub fn with_manufacture_date(mut self, date: NaiveDate) -> Self {
        self.manufacture_date = Some(date);
        self
    }

    pub fn with_expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }
}

// =============================================================================
// History Record
// =============================================================================

/// Immutable audit row produced by every committed mutation.
///
/// Records of one stock record form a chain ordered by `seq`:
/// `history[i].new_qty == history[i + 1].previous_qty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub stock_record_id: String,
    /// Position in the stock record's chain, starting at 1.
    pub seq: i64,
    /// The persisted entry behind an IN/OUT row. `None` for adjustments.
    pub ledger_entry_id: Option<String>,
    pub kind: MovementKind,
    /// Magnitude for IN/OUT, signed difference for ADJUST.
    pub quantity_delta: Decimal,
    pub previous_qty: Decimal,
    pub new_qty: Decimal,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ProductId, Retail, Sku, StoreId, Warehouse, WarehouseId};
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_record_has_zero_quantity() {
        let record = StockRecord::<Warehouse>::empty(ProductId::new("P-1"), WarehouseId::new("W-1"));
        assert_eq!(record.quantity, Decimal::ZERO);
        assert!(record.batch_number.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_entry_builder() {
        let entry = LedgerEntry::<Retail>::outbound(Sku::new("COKE-330"), StoreId::new("S-1"), dec!(2.5))
            .with_reference("SO-9")
            .with_lot("LOT-7")
            .with_note("walk-in");

        assert_eq!(entry.kind, EntryKind::Out);
        assert_eq!(entry.quantity, dec!(2.5));
        assert_eq!(entry.lot_number.as_deref(), Some("LOT-7"));
        assert!(entry.actor.is_empty());
    }

    #[test]
    fn test_is_expired() {
        let mut record = StockRecord::<Warehouse>::empty(ProductId::new("P-1"), WarehouseId::new("W-1"));
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(!record.is_expired(today));

        record.expiry_date = NaiveDate::from_ymd_opt(2026, 2, 28);
        assert!(record.is_expired(today));

        record.expiry_date = Some(today);
        assert!(!record.is_expired(today));
    }

    #[test]
    fn test_kinds_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&EntryKind::In).unwrap(), "\"in\"");
        assert_eq!(serde_json::to_string(&MovementKind::Adjust).unwrap(), "\"adjust\"");
        assert_eq!(MovementKind::from(EntryKind::Out), MovementKind::Out);
    }

    #[test]
    fn test_generic_record_serializes_with_plain_ids() {
        let record = StockRecord::<Retail>::empty(Sku::new("A"), StoreId::new("S"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["item_id"], "A");
        assert_eq!(json["location_id"], "S");
    }
}
