//! # Query Views
//!
//! Read-only reports over committed balances. Views hold a pool, never a
//! unit of work, so they cannot observe an in-flight entry.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::stock::{StockFilter, StockStore};
use depot_core::views::{total_quantity, valuate};
use depot_core::{Keyspace, LocationValuation, StockRecord, StockThresholds, UnitPriceLookup};

/// Derived queries for one keyspace.
#[derive(Debug, Clone)]
pub struct QueryViews<K: Keyspace> {
    store: StockStore<K>,
}

impl<K: Keyspace> QueryViews<K> {
    pub fn new(pool: SqlitePool) -> Self {
        QueryViews {
            store: StockStore::new(pool),
        }
    }

    /// Records at or below their threshold.
    ///
    /// A per-item threshold overrides the global one; records with neither
    /// are skipped.
    pub async fn low_stock(&self, thresholds: &StockThresholds<K>) -> DbResult<Vec<StockRecord<K>>> {
        let low: Vec<_> = self
            .store
            .list(&StockFilter::default())
            .await?
            .into_iter()
            .filter(|record| thresholds.is_low(record))
            .collect();

        debug!(keyspace = K::NAME, count = low.len(), "Low stock scan");
        Ok(low)
    }

    /// Σ quantity × unit price over every record at `location_id`.
    pub async fn location_value<P>(&self, location_id: &K::Location, prices: &P) -> DbResult<LocationValuation<K>>
    where
        P: UnitPriceLookup<K> + ?Sized,
    {
        let records = self.store.list(&StockFilter::at_location(location_id.clone())).await?;
        let valuation = valuate(location_id.clone(), &records, prices).map_err(|e| DbError::Overflow(e.to_string()))?;

        debug!(
            keyspace = K::NAME,
            %location_id,
            total = %valuation.total_value,
            unpriced = valuation.unpriced_items.len(),
            "Location valuation"
        );
        Ok(valuation)
    }

    /// Total on hand for one item across all locations.
    pub async fn total_for_item(&self, item_id: &K::Item) -> DbResult<Decimal> {
        let records = self.store.list(&StockFilter::for_item(item_id.clone())).await?;
        total_quantity(&records).map_err(|e| DbError::Overflow(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use depot_core::{LedgerEntry, PriceList, ProductId, Sku, StoreId, Retail, Warehouse, WarehouseId};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    async fn stocked() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let entries = [("P-1", "W-1", dec!(5)), ("P-2", "W-1", dec!(40)), ("P-1", "W-2", dec!(12))]
            .into_iter()
            .map(|(p, w, q)| LedgerEntry::inbound(ProductId::new(p), WarehouseId::new(w), q))
            .collect::<Vec<_>>();
        db.batch::<Warehouse>().process_batch(entries, "receiver").await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_low_stock_uses_item_override() {
        let db = stocked().await;
        let views = db.views::<Warehouse>();

        let global = StockThresholds::<Warehouse>::global(dec!(10));
        let low = views.low_stock(&global).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].quantity, dec!(5));

        let with_override = global.with_item(ProductId::new("P-2"), dec!(40));
        assert_eq!(views.low_stock(&with_override).await.unwrap().len(), 2);

        let none = StockThresholds::<Warehouse>::default();
        assert!(views.low_stock(&none).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_location_value() {
        let db = stocked().await;
        let views = db.views::<Warehouse>();
        let prices = PriceList::<Warehouse>(HashMap::from([(ProductId::new("P-1"), dec!(2.50))]));

        let w1 = views.location_value(&WarehouseId::new("W-1"), &prices).await.unwrap();
        assert_eq!(w1.total_value, dec!(12.5));
        assert_eq!(w1.record_count, 2);
        assert_eq!(w1.unpriced_items, vec![ProductId::new("P-2")]);

        let flat = |_: &ProductId| Some(dec!(1));
        let w2 = views.location_value(&WarehouseId::new("W-2"), &flat).await.unwrap();
        assert_eq!(w2.total_value, dec!(12));

        let empty = views.location_value(&WarehouseId::new("W-9"), &prices).await.unwrap();
        assert_eq!(empty.total_value, Decimal::ZERO);
        assert_eq!(empty.record_count, 0);
    }

    #[tokio::test]
    async fn test_views_are_keyspace_scoped() {
        let db = stocked().await;
        assert_eq!(db.views::<Warehouse>().total_for_item(&ProductId::new("P-1")).await.unwrap(), dec!(17));

        let retail = db.views::<Retail>();
        assert_eq!(retail.total_for_item(&Sku::new("P-1")).await.unwrap(), Decimal::ZERO);
        let none = retail.location_value(&StoreId::new("W-1"), &|_: &Sku| Some(dec!(1))).await.unwrap();
        assert_eq!(none.record_count, 0);
    }

    #[tokio::test]
    async fn test_views_report_overflow_instead_of_panicking() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger::<Warehouse>();
        ledger
            .process_entry(LedgerEntry::inbound(ProductId::new("P-1"), WarehouseId::new("W-1"), Decimal::MAX), "receiver")
            .await
            .unwrap();
        ledger
            .process_entry(LedgerEntry::inbound(ProductId::new("P-1"), WarehouseId::new("W-2"), dec!(1)), "receiver")
            .await
            .unwrap();
        let views = db.views::<Warehouse>();

        let double = |_: &ProductId| Some(dec!(2));
        let err = views.location_value(&WarehouseId::new("W-1"), &double).await.unwrap_err();
        assert!(matches!(err, DbError::Overflow(_)), "{err:?}");

        let err = views.total_for_item(&ProductId::new("P-1")).await.unwrap_err();
        assert!(matches!(err, DbError::Overflow(_)), "{err:?}");

        // Unaffected locations still value normally.
        let w2 = views.location_value(&WarehouseId::new("W-2"), &double).await.unwrap();
        assert_eq!(w2.total_value, dec!(2));
    }
}
