//! # Validation Module
//!
//! Input validation for ledger entries and adjustments.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Collaborator (receiving, shipping, ...)                      │
//! │  └── Referential integrity: item and location exist and are active    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Shape of the entry: positive quantity, non-blank ids, lengths     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (keyspace, item_id, location_id)                           │
//! │  └── CHECK constraints on kinds                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs before a unit of work is opened; a rejected entry never
//! touches storage.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::identity::{Identity, Keyspace};
use crate::types::LedgerEntry;
use crate::{MAX_ACTOR_LEN, MAX_NOTE_LEN, MAX_REFERENCE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a ledger entry together with the acting user.
///
/// ## Rules
/// - quantity > 0
/// - item and location ids non-blank
/// - reference ≤ 100 chars, note ≤ 500 chars
/// - expiry not before manufacture when both are given
/// - actor non-blank
pub fn validate_entry<K: Keyspace>(entry: &LedgerEntry<K>, actor: &str) -> ValidationResult<()> {
    validate_quantity(entry.quantity)?;
    require("item_id", entry.item_id.as_str())?;
    require("location_id", entry.location_id.as_str())?;
    max_len("reference", entry.reference.as_deref(), MAX_REFERENCE_LEN)?;
    max_len("note", entry.note.as_deref(), MAX_NOTE_LEN)?;

    if let (Some(made), Some(expires)) = (entry.manufacture_date, entry.expiry_date) {
        if expires < made {
            return Err(ValidationError::Inconsistent {
                field: "expiry_date".to_string(),
                reason: format!("{expires} is before manufacture date {made}"),
            });
        }
    }

    validate_actor(actor)
}

/// Validates the inputs of a direct adjustment.
///
/// The target quantity itself is not checked; see [`crate::movement`].
pub fn validate_adjustment(stock_id: &str, note: Option<&str>, actor: &str) -> ValidationResult<()> {
    require("stock_id", stock_id)?;
    max_len("note", note, MAX_NOTE_LEN)?;
    validate_actor(actor)
}

/// Validates a movement quantity.
///
/// ## Example
/// ```rust
/// use depot_core::validation::validate_quantity;
/// use rust_decimal::Decimal;
///
/// assert!(validate_quantity(Decimal::ONE).is_ok());
/// assert!(validate_quantity(Decimal::ZERO).is_err());
/// ```
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates the acting user recorded on history rows.
pub fn validate_actor(actor: &str) -> ValidationResult<()> {
    require("actor", actor)?;
    max_len("actor", Some(actor), MAX_ACTOR_LEN)
}

fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ProductId, Warehouse, WarehouseId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(qty: Decimal) -> LedgerEntry<Warehouse> {
        LedgerEntry::inbound(ProductId::new("P-1"), WarehouseId::new("W-1"), qty)
    }

    #[test]
    fn test_valid_entry() {
        assert!(validate_entry(&entry(dec!(1)), "clerk").is_ok());
        assert!(validate_entry(&entry(dec!(0.001)), "clerk").is_ok());
    }

    #[test]
    fn test_non_positive_quantity() {
        assert!(matches!(
            validate_entry(&entry(dec!(0)), "clerk"),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_entry(&entry(dec!(-3)), "clerk").is_err());
    }

    #[test]
    fn test_blank_ids() {
        let blank_item = LedgerEntry::<Warehouse>::inbound(ProductId::new("  "), WarehouseId::new("W"), dec!(1));
        assert!(matches!(
            validate_entry(&blank_item, "clerk"),
            Err(ValidationError::Required { ref field }) if field == "item_id"
        ));

        let blank_location = LedgerEntry::<Warehouse>::inbound(ProductId::new("P"), WarehouseId::new(""), dec!(1));
        assert!(validate_entry(&blank_location, "clerk").is_err());
    }

    #[test]
    fn test_lengths() {
        let long_ref = entry(dec!(1)).with_reference("R".repeat(101));
        assert!(matches!(
            validate_entry(&long_ref, "clerk"),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
        assert!(validate_entry(&entry(dec!(1)).with_note("n".repeat(500)), "clerk").is_ok());
        assert!(validate_entry(&entry(dec!(1)), &"a".repeat(101)).is_err());
    }

    #[test]
    fn test_expiry_before_manufacture() {
        let e = entry(dec!(1))
            .with_manufacture_date(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap())
            .with_expiry_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert!(matches!(
            validate_entry(&e, "clerk"),
            Err(ValidationError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_blank_actor() {
        assert!(validate_entry(&entry(dec!(1)), " ").is_err());
        assert!(validate_adjustment("stock-1", None, "").is_err());
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment("stock-1", Some("cycle count"), "auditor").is_ok());
        assert!(validate_adjustment("", None, "auditor").is_err());
    }
}
