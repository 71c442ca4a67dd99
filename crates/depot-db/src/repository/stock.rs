//! # Stock Store
//!
//! Persistent per-(item, location) balances plus descriptive metadata.
//! Pure data access: no ledger rules live here.
//!
//! ## Get-or-Create Under Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller A                         Caller B                              │
//! │  ────────                         ────────                              │
//! │  INSERT ... ON CONFLICT           INSERT ... ON CONFLICT                │
//! │  DO NOTHING   (row created)       DO NOTHING   (no-op)                  │
//! │       │                                │                                │
//! │       ▼                                ▼                                │
//! │  SELECT by (keyspace, item, loc)  SELECT by (keyspace, item, loc)       │
//! │       │                                │                                │
//! │       └──────────► same id, quantity 0 ◄┘                               │
//! │                                                                         │
//! │  UNIQUE (keyspace, item_id, location_id) guarantees one row.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation also has a crate-internal `*_in` form that runs on a
//! borrowed connection, so the ledger processor can thread its own unit of
//! work through these helpers.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::rows::{convert_all, decimal_text, StockRow, STOCK_COLUMNS};
use depot_core::{Identity, Keyspace, LedgerEntry, StockRecord};

/// Filter for [`StockStore::list`]. Unset fields match everything.
#[derive(Debug, Clone)]
pub struct StockFilter<K: Keyspace> {
    pub item_id: Option<K::Item>,
    pub location_id: Option<K::Location>,
    pub batch_number: Option<String>,
    pub lot_number: Option<String>,
    pub zone_code: Option<String>,
    pub bin_location: Option<String>,
    /// Inclusive lower bound on expiry date.
    pub expiry_from: Option<NaiveDate>,
    /// Inclusive upper bound on expiry date.
    pub expiry_to: Option<NaiveDate>,
}

impl<K: Keyspace> Default for StockFilter<K> {
    fn default() -> Self {
        StockFilter {
            item_id: None,
            location_id: None,
            batch_number: None,
            lot_number: None,
            zone_code: None,
            bin_location: None,
            expiry_from: None,
            expiry_to: None,
        }
    }
}

impl<K: Keyspace> StockFilter<K> {
    pub fn at_location(location_id: K::Location) -> Self {
        StockFilter {
            location_id: Some(location_id),
            ..Self::default()
        }
    }

    pub fn for_item(item_id: K::Item) -> Self {
        StockFilter {
            item_id: Some(item_id),
            ..Self::default()
        }
    }

    /// Records expiring within `[from, to]`.
    pub fn expiring_between(from: NaiveDate, to: NaiveDate) -> Self {
        StockFilter {
            expiry_from: Some(from),
            expiry_to: Some(to),
            ..Self::default()
        }
    }
}

/// Repository for stock records of one keyspace.
///
/// ## Usage
/// ```rust,ignore
/// let store = db.stock::<Warehouse>();
///
/// let record = store.get_or_create(&ProductId::new("P-1"), &WarehouseId::new("W-1")).await?;
/// let at_w1 = store.list(&StockFilter::at_location(WarehouseId::new("W-1"))).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockStore<K: Keyspace> {
    pool: SqlitePool,
    _keyspace: PhantomData<K>,
}

impl<K: Keyspace> StockStore<K> {
    /// Creates a new StockStore.
    pub fn new(pool: SqlitePool) -> Self {
        StockStore {
            pool,
            _keyspace: PhantomData,
        }
    }

    /// Gets the record for (item, location).
    ///
    /// ## Returns
    /// * `Ok(StockRecord)` - Record exists
    /// * `Err(DbError::NotFound)` - Pair never referenced
    pub async fn get(&self, item_id: &K::Item, location_id: &K::Location) -> DbResult<StockRecord<K>> {
        let mut conn = self.pool.acquire().await?;
        find_in::<K>(&mut *conn, item_id, location_id)
            .await?
            .ok_or_else(|| DbError::not_found("StockRecord", format!("{item_id}@{location_id}")))
    }

    /// Gets a record by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<StockRecord<K>> {
        let mut conn = self.pool.acquire().await?;
        find_by_id_in::<K>(&mut *conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("StockRecord", id))
    }

    /// Returns the existing record or creates one with quantity zero.
    ///
    /// Never fails with NotFound. Safe under concurrent first access.
    pub async fn get_or_create(&self, item_id: &K::Item, location_id: &K::Location) -> DbResult<StockRecord<K>> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_in::<K>(&mut *conn, item_id, location_id).await
    }

    /// Lists records matching `filter`, ordered by creation.
    pub async fn list(&self, filter: &StockFilter<K>) -> DbResult<Vec<StockRecord<K>>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {STOCK_COLUMNS} FROM stock_records WHERE keyspace = "
        ));
        qb.push_bind(K::NAME);

        if let Some(item_id) = &filter.item_id {
            qb.push(" AND item_id = ").push_bind(item_id.as_str().to_string());
        }
        if let Some(location_id) = &filter.location_id {
            qb.push(" AND location_id = ").push_bind(location_id.as_str().to_string());
        }
        if let Some(batch) = &filter.batch_number {
            qb.push(" AND batch_number = ").push_bind(batch.clone());
        }
        if let Some(lot) = &filter.lot_number {
            qb.push(" AND lot_number = ").push_bind(lot.clone());
        }
        if let Some(zone) = &filter.zone_code {
            qb.push(" AND zone_code = ").push_bind(zone.clone());
        }
        if let Some(bin) = &filter.bin_location {
            qb.push(" AND bin_location = ").push_bind(bin.clone());
        }
        if let Some(from) = filter.expiry_from {
            qb.push(" AND expiry_date >= ").push_bind(from);
        }
        if let Some(to) = filter.expiry_to {
            qb.push(" AND expiry_date <= ").push_bind(to);
        }
        qb.push(" ORDER BY created_at, id");

        let rows: Vec<StockRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        debug!(keyspace = K::NAME, count = rows.len(), "Listed stock records");
        convert_all(rows)
    }

    /// Replaces every mutable field of the record keyed by
    /// (item, location), inserting it if the pair is new.
    ///
    /// ## Note
    /// Intended for metadata corrections (bin, zone, expiry...). It writes
    /// `quantity` verbatim and appends no history; balance changes belong
    /// to the ledger processor.
    pub async fn upsert(&self, record: &StockRecord<K>) -> DbResult<StockRecord<K>> {
        debug!(
            keyspace = K::NAME,
            item_id = %record.item_id,
            location_id = %record.location_id,
            "Upserting stock record"
        );

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO stock_records (
                id, keyspace, item_id, location_id, quantity,
                bin_location, shelf_number, zone_code, batch_number, lot_number,
                manufacture_date, expiry_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT (keyspace, item_id, location_id) DO UPDATE SET
                quantity = excluded.quantity,
                bin_location = excluded.bin_location,
                shelf_number = excluded.shelf_number,
                zone_code = excluded.zone_code,
                batch_number = excluded.batch_number,
                lot_number = excluded.lot_number,
                manufacture_date = excluded.manufacture_date,
                expiry_date = excluded.expiry_date,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(K::NAME)
        .bind(record.item_id.as_str())
        .bind(record.location_id.as_str())
        .bind(decimal_text(record.quantity))
        .bind(&record.bin_location)
        .bind(&record.shelf_number)
        .bind(&record.zone_code)
        .bind(&record.batch_number)
        .bind(&record.lot_number)
        .bind(record.manufacture_date)
        .bind(record.expiry_date)
        .bind(record.created_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(&record.item_id, &record.location_id).await
    }

    /// Counts records in this keyspace (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_records WHERE keyspace = ?1")
            .bind(K::NAME)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit-of-work helpers
// =============================================================================

pub(crate) async fn find_in<K: Keyspace>(
    conn: &mut SqliteConnection,
    item_id: &K::Item,
    location_id: &K::Location,
) -> DbResult<Option<StockRecord<K>>> {
    let row: Option<StockRow> = sqlx::query_as(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records \
         WHERE keyspace = ?1 AND item_id = ?2 AND location_id = ?3"
    ))
    .bind(K::NAME)
    .bind(item_id.as_str())
    .bind(location_id.as_str())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(StockRecord::<K>::try_from).transpose()
}

pub(crate) async fn find_by_id_in<K: Keyspace>(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<StockRecord<K>>> {
    let row: Option<StockRow> = sqlx::query_as(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_records WHERE id = ?1 AND keyspace = ?2"
    ))
    .bind(id)
    .bind(K::NAME)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(StockRecord::<K>::try_from).transpose()
}

/// Inserts a zero balance unless one exists, then reads it back.
///
/// The insert is a write even when it conflicts, so inside a transaction
/// it takes SQLite's write lock before the read that follows.
pub(crate) async fn get_or_create_in<K: Keyspace>(
    conn: &mut SqliteConnection,
    item_id: &K::Item,
    location_id: &K::Location,
) -> DbResult<StockRecord<K>> {
    let fresh = StockRecord::<K>::empty(item_id.clone(), location_id.clone());

    let inserted = sqlx::query(
        r#"
        INSERT INTO stock_records (
            id, keyspace, item_id, location_id, quantity, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, '0', ?5, ?5)
        ON CONFLICT (keyspace, item_id, location_id) DO NOTHING
        "#,
    )
    .bind(&fresh.id)
    .bind(K::NAME)
    .bind(item_id.as_str())
    .bind(location_id.as_str())
    .bind(fresh.created_at)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted > 0 {
        debug!(keyspace = K::NAME, %item_id, %location_id, id = %fresh.id, "Created stock record");
    }

    find_in::<K>(conn, item_id, location_id)
        .await?
        .ok_or_else(|| DbError::Internal(format!("stock record {item_id}@{location_id} vanished after insert")))
}

/// Takes the write lock for a unit of work keyed by record id.
///
/// SQLite has no row locks; a no-op UPDATE as the first statement of the
/// transaction plays the role of `SELECT ... FOR UPDATE`.
///
/// Returns false when no such record exists in this keyspace.
pub(crate) async fn lock_by_id_in<K: Keyspace>(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let touched = sqlx::query("UPDATE stock_records SET id = id WHERE id = ?1 AND keyspace = ?2")
        .bind(id)
        .bind(K::NAME)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(touched > 0)
}

/// Writes a new balance plus the metadata an entry explicitly supplies.
/// Fields the entry leaves unset keep their stored value.
pub(crate) async fn apply_entry_in<K: Keyspace>(
    conn: &mut SqliteConnection,
    stock_id: &str,
    new_quantity: Decimal,
    entry: &LedgerEntry<K>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stock_records SET
            quantity = ?2,
            batch_number = COALESCE(?3, batch_number),
            lot_number = COALESCE(?4, lot_number),
            manufacture_date = COALESCE(?5, manufacture_date),
            expiry_date = COALESCE(?6, expiry_date),
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(stock_id)
    .bind(decimal_text(new_quantity))
    .bind(&entry.batch_number)
    .bind(&entry.lot_number)
    .bind(entry.manufacture_date)
    .bind(entry.expiry_date)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("StockRecord", stock_id));
    }
    Ok(())
}

/// Sets the balance directly (adjustments).
pub(crate) async fn set_quantity_in(conn: &mut SqliteConnection, stock_id: &str, quantity: Decimal) -> DbResult<()> {
    let result = sqlx::query("UPDATE stock_records SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(stock_id)
        .bind(decimal_text(quantity))
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("StockRecord", stock_id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use depot_core::{ProductId, Retail, Sku, StoreId, Warehouse, WarehouseId};
    use rust_decimal_macros::dec;

    async fn store() -> (Database, StockStore<Warehouse>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = db.stock::<Warehouse>();
        (db, store)
    }

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    fn w(id: &str) -> WarehouseId {
        WarehouseId::new(id)
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_db, store) = store().await;
        let err = store.get(&p("P-1"), &w("W-1")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (_db, store) = store().await;

        let first = store.get_or_create(&p("P-1"), &w("W-1")).await.unwrap();
        let second = store.get_or_create(&p("P-1"), &w("W-1")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.quantity, Decimal::ZERO);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(&p("P-1"), &w("W-1")).await.unwrap().id, first.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_yields_one_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("stock.db"))
            .max_connections(8)
            .busy_timeout(std::time::Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();
        let store = db.stock::<Warehouse>();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_create(&p("P-9"), &w("W-9")).await })
            })
            .collect();

        let mut ids = std::collections::HashSet::new();
        for task in tasks {
            let record = task.await.unwrap().unwrap();
            assert_eq!(record.quantity, Decimal::ZERO);
            ids.insert(record.id);
        }

        assert_eq!(ids.len(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_keyspaces_do_not_collide() {
        let (db, warehouse) = store().await;
        let retail = db.stock::<Retail>();

        let a = warehouse.get_or_create(&p("X"), &w("Y")).await.unwrap();
        let b = retail.get_or_create(&Sku::new("X"), &StoreId::new("Y")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(warehouse.count().await.unwrap(), 1);
        assert_eq!(retail.count().await.unwrap(), 1);
        assert!(retail.get_by_id(&a.id).await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_replaces_metadata() {
        let (_db, store) = store().await;
        let created = store.get_or_create(&p("P-1"), &w("W-1")).await.unwrap();

        let mut corrected = created.clone();
        corrected.bin_location = Some("A-01".into());
        corrected.zone_code = Some("COLD".into());
        corrected.expiry_date = NaiveDate::from_ymd_opt(2027, 1, 31);

        let stored = store.upsert(&corrected).await.unwrap();
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.bin_location.as_deref(), Some("A-01"));
        assert_eq!(stored.zone_code.as_deref(), Some("COLD"));
        assert_eq!(stored.expiry_date, NaiveDate::from_ymd_opt(2027, 1, 31));
    }

    #[tokio::test]
    async fn test_upsert_inserts_new_pair() {
        let (_db, store) = store().await;
        let mut record = StockRecord::<Warehouse>::empty(p("P-2"), w("W-1"));
        record.quantity = dec!(12.5);
        record.lot_number = Some("L-1".into());

        let stored = store.upsert(&record).await.unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.quantity, dec!(12.5));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_db, store) = store().await;

        for (item, loc, zone, expiry) in [
            ("P-1", "W-1", "COLD", (2026, 6, 1)),
            ("P-2", "W-1", "DRY", (2026, 9, 1)),
            ("P-1", "W-2", "COLD", (2027, 1, 1)),
        ] {
            let mut record = store.get_or_create(&p(item), &w(loc)).await.unwrap();
            record.zone_code = Some(zone.into());
            record.expiry_date = NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2);
            store.upsert(&record).await.unwrap();
        }

        assert_eq!(store.list(&StockFilter::default()).await.unwrap().len(), 3);
        assert_eq!(store.list(&StockFilter::at_location(w("W-1"))).await.unwrap().len(), 2);
        assert_eq!(store.list(&StockFilter::for_item(p("P-1"))).await.unwrap().len(), 2);

        let cold = StockFilter {
            zone_code: Some("COLD".into()),
            location_id: Some(w("W-2")),
            ..StockFilter::default()
        };
        let cold = store.list(&cold).await.unwrap();
        assert_eq!(cold.len(), 1);
        assert_eq!(cold[0].item_id, p("P-1"));

        let expiring = StockFilter::expiring_between(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        );
        assert_eq!(store.list(&expiring).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_on_batch_lot_and_bin() {
        let (_db, store) = store().await;

        for (item, batch, lot, bin) in [
            ("P-1", "B-1", "L-1", "A-01"),
            ("P-2", "B-1", "L-2", "A-02"),
            ("P-3", "B-2", "L-1", "A-02"),
        ] {
            let mut record = store.get_or_create(&p(item), &w("W-1")).await.unwrap();
            record.batch_number = Some(batch.into());
            record.lot_number = Some(lot.into());
            record.bin_location = Some(bin.into());
            store.upsert(&record).await.unwrap();
        }
        // No metadata at all; never matches a metadata filter.
        store.get_or_create(&p("P-4"), &w("W-1")).await.unwrap();

        let items = |records: Vec<StockRecord<Warehouse>>| -> Vec<String> {
            let mut ids: Vec<_> = records.into_iter().map(|r| r.item_id.to_string()).collect();
            ids.sort();
            ids
        };

        let by_batch = StockFilter {
            batch_number: Some("B-1".into()),
            ..StockFilter::default()
        };
        assert_eq!(items(store.list(&by_batch).await.unwrap()), ["P-1", "P-2"]);

        let by_lot = StockFilter {
            lot_number: Some("L-1".into()),
            ..StockFilter::default()
        };
        assert_eq!(items(store.list(&by_lot).await.unwrap()), ["P-1", "P-3"]);

        let by_bin = StockFilter {
            bin_location: Some("A-02".into()),
            ..StockFilter::default()
        };
        assert_eq!(items(store.list(&by_bin).await.unwrap()), ["P-2", "P-3"]);

        let combined = StockFilter {
            lot_number: Some("L-1".into()),
            bin_location: Some("A-02".into()),
            ..StockFilter::default()
        };
        assert_eq!(items(store.list(&combined).await.unwrap()), ["P-3"]);

        let unknown = StockFilter {
            batch_number: Some("B-9".into()),
            ..StockFilter::default()
        };
        assert!(store.list(&unknown).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_order_is_stable() {
        let (_db, store) = store().await;
        for item in ["P-3", "P-1", "P-2"] {
            store.get_or_create(&p(item), &w("W-1")).await.unwrap();
        }

        let first: Vec<_> = store.list(&StockFilter::default()).await.unwrap().into_iter().map(|r| r.id).collect();
        let second: Vec<_> = store.list(&StockFilter::default()).await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(first, second);
    }
}
