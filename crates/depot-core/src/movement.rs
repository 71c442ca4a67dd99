//! # Movement Arithmetic
//!
//! The one place where a balance change is computed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  IN      new = previous + quantity                                      │
//! │  OUT     new = previous - quantity     (rejected if new < 0)            │
//! │  ADJUST  new = target                  (delta = target - previous)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Adjustments are an explicit override path for physical counts and carry
//! no non-negativity guard.

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::types::{EntryKind, MovementKind};

/// The outcome of applying one movement to a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub kind: MovementKind,
    /// Magnitude for IN/OUT, signed difference for ADJUST.
    pub delta: Decimal,
    pub previous: Decimal,
    pub new: Decimal,
}

impl Movement {
    /// Applies an IN/OUT entry of `quantity` to `previous`.
    ///
    /// `item_id` and `location_id` only feed the error message.
    pub fn entry(
        kind: EntryKind,
        previous: Decimal,
        quantity: Decimal,
        item_id: &str,
        location_id: &str,
    ) -> CoreResult<Self> {
        let new = match kind {
            EntryKind::In => previous.checked_add(quantity),
            EntryKind::Out => previous.checked_sub(quantity),
        }
        .ok_or(CoreError::QuantityOverflow {
            balance: previous,
            delta: quantity,
        })?;

        if kind == EntryKind::Out && new < Decimal::ZERO {
            return Err(CoreError::InsufficientStock {
                item_id: item_id.to_string(),
                location_id: location_id.to_string(),
                available: previous,
                requested: quantity,
            });
        }

        Ok(Movement {
            kind: kind.into(),
            delta: quantity,
            previous,
            new,
        })
    }

    /// Sets the balance to `target` regardless of its sign.
    pub fn adjustment(previous: Decimal, target: Decimal) -> CoreResult<Self> {
        let delta = target
            .checked_sub(previous)
            .ok_or(CoreError::QuantityOverflow {
                balance: previous,
                delta: target,
            })?;

        Ok(Movement {
            kind: MovementKind::Adjust,
            delta,
            previous,
            new: target,
        })
    }

    /// Recomputes `new` from `previous` and `delta` the way the movement was
    /// originally applied. Used when auditing stored history.
    pub fn expected_new(kind: MovementKind, previous: Decimal, delta: Decimal) -> Option<Decimal> {
        match kind {
            MovementKind::In | MovementKind::Adjust => previous.checked_add(delta),
            MovementKind::Out => previous.checked_sub(delta),
        }
    }
}
