//! # View Calculations
//!
//! Pure parts of the read-only query views: which balances count as low,
//! and what a location's stock is worth. The database layer fetches the
//! records; these functions never see a connection.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::identity::{Identity, Keyspace};
use crate::types::StockRecord;

// =============================================================================
// Low Stock
// =============================================================================

/// Reorder thresholds: a global default plus per-item overrides.
#[derive(Debug, Clone)]
pub struct StockThresholds<K: Keyspace> {
    pub global: Option<Decimal>,
    pub per_item: HashMap<K::Item, Decimal>,
}

impl<K: Keyspace> Default for StockThresholds<K> {
    fn default() -> Self {
        StockThresholds {
            global: None,
            per_item: HashMap::new(),
        }
    }
}

impl<K: Keyspace> StockThresholds<K> {
    pub fn global(threshold: Decimal) -> Self {
        StockThresholds {
            global: Some(threshold),
            per_item: HashMap::new(),
        }
    }

    pub fn with_item(mut self, item_id: K::Item, threshold: Decimal) -> Self {
        self.per_item.insert(item_id, threshold);
        self
    }

    /// The per-item threshold if set, otherwise the global one.
    pub fn threshold_for(&self, item_id: &K::Item) -> Option<Decimal> {
        self.per_item.get(item_id).copied().or(self.global)
    }

    /// At or below its threshold. Items without any threshold never match.
    pub fn is_low(&self, record: &StockRecord<K>) -> bool {
        self.threshold_for(&record.item_id)
            .is_some_and(|threshold| record.quantity <= threshold)
    }
}

// =============================================================================
// Valuation
// =============================================================================

/// Resolves a unit price for an item. Pricing is owned elsewhere; the
/// ledger only multiplies.
pub trait UnitPriceLookup<K: Keyspace> {
    fn unit_price(&self, item_id: &K::Item) -> Option<Decimal>;
}

impl<K, F> UnitPriceLookup<K> for F
where
    K: Keyspace,
    F: Fn(&K::Item) -> Option<Decimal>,
{
    fn unit_price(&self, item_id: &K::Item) -> Option<Decimal> {
        self(item_id)
    }
}

/// Prices held in a plain map.
#[derive(Debug, Clone)]
pub struct PriceList<K: Keyspace>(pub HashMap<K::Item, Decimal>);

impl<K: Keyspace> UnitPriceLookup<K> for PriceList<K> {
    fn unit_price(&self, item_id: &K::Item) -> Option<Decimal> {
        self.0.get(item_id).copied()
    }
}

/// Total value of the stock held at one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct LocationValuation<K: Keyspace> {
    pub location_id: K::Location,
    /// Σ quantity × unit price over priced records.
    pub total_value: Decimal,
    pub record_count: usize,
    /// Items with no price; they contribute zero to the total.
    pub unpriced_items: Vec<K::Item>,
}

/// Sums `quantity × unit_price` across `records`.
///
/// A line product or the running total past `Decimal::MAX` is reported as
/// [`CoreError::ValueOverflow`].
pub fn valuate<K, P>(location_id: K::Location, records: &[StockRecord<K>], prices: &P) -> CoreResult<LocationValuation<K>>
where
    K: Keyspace,
    P: UnitPriceLookup<K> + ?Sized,
{
    let mut total_value = Decimal::ZERO;
    let mut unpriced_items = Vec::new();

    for record in records {
        match prices.unit_price(&record.item_id) {
            Some(price) => {
                total_value = record
                    .quantity
                    .checked_mul(price)
                    .and_then(|line| total_value.checked_add(line))
                    .ok_or_else(|| CoreError::ValueOverflow {
                        item_id: record.item_id.as_str().to_string(),
                        location_id: record.location_id.as_str().to_string(),
                    })?;
            }
            None => unpriced_items.push(record.item_id.clone()),
        }
    }

    Ok(LocationValuation {
        location_id,
        total_value,
        record_count: records.len(),
        unpriced_items,
    })
}

/// Σ quantity across `records`, checked.
pub fn total_quantity<K: Keyspace>(records: &[StockRecord<K>]) -> CoreResult<Decimal> {
    records.iter().try_fold(Decimal::ZERO, |total, record| {
        total.checked_add(record.quantity).ok_or_else(|| CoreError::ValueOverflow {
            item_id: record.item_id.as_str().to_string(),
            location_id: record.location_id.as_str().to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ProductId, Warehouse, WarehouseId};
    use rust_decimal_macros::dec;

    fn record(item: &str, qty: Decimal) -> StockRecord<Warehouse> {
        let mut r = StockRecord::empty(ProductId::new(item), WarehouseId::new("W-1"));
        r.quantity = qty;
        r
    }

    #[test]
    fn test_per_item_threshold_overrides_global() {
        let thresholds = StockThresholds::<Warehouse>::global(dec!(10)).with_item(ProductId::new("P-2"), dec!(50));

        assert!(thresholds.is_low(&record("P-1", dec!(10))));
        assert!(!thresholds.is_low(&record("P-1", dec!(11))));
        assert!(thresholds.is_low(&record("P-2", dec!(40))));
    }

    #[test]
    fn test_no_threshold_never_low() {
        let thresholds = StockThresholds::<Warehouse>::default().with_item(ProductId::new("P-2"), dec!(5));
        assert!(!thresholds.is_low(&record("P-1", dec!(0))));
        assert!(thresholds.is_low(&record("P-2", dec!(0))));
    }

    #[test]
    fn test_valuate_with_closure() {
        let records = vec![record("P-1", dec!(10)), record("P-2", dec!(2.5))];
        let prices = |item: &ProductId| match item.to_string().as_str() {
            "P-1" => Some(dec!(1.99)),
            "P-2" => Some(dec!(4)),
            _ => None,
        };

        let valuation = valuate(WarehouseId::new("W-1"), &records, &prices).unwrap();
        assert_eq!(valuation.total_value, dec!(29.90));
        assert_eq!(valuation.record_count, 2);
        assert!(valuation.unpriced_items.is_empty());
    }

    #[test]
    fn test_valuate_reports_unpriced_items() {
        let records = vec![record("P-1", dec!(3)), record("P-9", dec!(7))];
        let prices = PriceList::<Warehouse>(HashMap::from([(ProductId::new("P-1"), dec!(2))]));

        let valuation = valuate(WarehouseId::new("W-1"), &records, &prices).unwrap();
        assert_eq!(valuation.total_value, dec!(6));
        assert_eq!(valuation.unpriced_items, vec![ProductId::new("P-9")]);
    }

    #[test]
    fn test_valuate_overflow_is_an_error() {
        let records = vec![record("P-1", Decimal::MAX)];
        let err = valuate(WarehouseId::new("W-1"), &records, &|_: &ProductId| Some(dec!(2))).unwrap_err();
        assert!(matches!(err, CoreError::ValueOverflow { ref item_id, .. } if item_id == "P-1"));

        // The running total can overflow even when each line fits.
        let records = vec![record("P-1", Decimal::MAX), record("P-2", dec!(1))];
        let flat = |_: &ProductId| Some(Decimal::ONE);
        assert!(valuate(WarehouseId::new("W-1"), &records, &flat).is_err());
    }

    #[test]
    fn test_total_quantity() {
        let records = vec![record("P-1", dec!(1.5)), record("P-2", dec!(2))];
        assert_eq!(total_quantity(&records).unwrap(), dec!(3.5));
        assert_eq!(total_quantity::<Warehouse>(&[]).unwrap(), Decimal::ZERO);

        let records = vec![record("P-1", Decimal::MAX), record("P-2", dec!(1))];
        assert!(matches!(total_quantity(&records), Err(CoreError::ValueOverflow { .. })));
    }
}
