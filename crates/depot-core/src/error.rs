//! # Error Types
//!
//! Domain-specific error types for depot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  depot-core errors (this file)                                         │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Malformed entry input                          │
//! │                                                                         │
//! │  depot-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What collaborators see                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Collaborator        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An OUT movement would drive the balance below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Shipment line (qty: 15)
    ///      │
    ///      ▼
    /// Balance: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { available: 10, requested: 15 }
    ///      │
    ///      ▼
    /// Nothing persisted; shipment decides whether to back-order
    /// ```
    #[error("Insufficient stock for {item_id} at {location_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        location_id: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Decimal arithmetic left the representable range.
    #[error("Quantity overflow applying {delta} to {balance}")]
    QuantityOverflow { balance: Decimal, delta: Decimal },

    /// A derived total (valuation, aggregate) left the representable range.
    #[error("Value overflow summing stock of {item_id} at {location_id}")]
    ValueOverflow { item_id: String, location_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Two fields are inconsistent with each other.
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_id: "P-1".to_string(),
            location_id: "W-1".to_string(),
            available: dec!(10),
            requested: dec!(15),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P-1 at W-1: available 10, requested 15"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "item_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
