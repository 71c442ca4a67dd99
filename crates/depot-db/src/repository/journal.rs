//! # Entry Journal
//!
//! The persisted copy of every committed IN/OUT entry. Rows are written once
//! by the ledger processor, in the same unit of work as the balance change,
//! and never touched again.

use sqlx::{SqliteConnection, SqlitePool};
use std::marker::PhantomData;

use crate::error::{DbError, DbResult};
use crate::repository::rows::{convert_all, decimal_text, EntryRow, ENTRY_COLUMNS};
use depot_core::{Identity, Keyspace, LedgerEntry};

/// Read access to committed ledger entries of one keyspace.
#[derive(Debug, Clone)]
pub struct EntryJournal<K: Keyspace> {
    pool: SqlitePool,
    _keyspace: PhantomData<K>,
}

impl<K: Keyspace> EntryJournal<K> {
    /// Creates a new EntryJournal.
    pub fn new(pool: SqlitePool) -> Self {
        EntryJournal {
            pool,
            _keyspace: PhantomData,
        }
    }

    /// Gets a committed entry by id.
    ///
    /// A rejected entry was never persisted and is reported as NotFound.
    pub async fn get(&self, entry_id: &str) -> DbResult<LedgerEntry<K>> {
        let row: Option<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE id = ?1 AND keyspace = ?2"
        ))
        .bind(entry_id)
        .bind(K::NAME)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LedgerEntry::<K>::try_from)
            .transpose()?
            .ok_or_else(|| DbError::not_found("LedgerEntry", entry_id))
    }

    /// Committed entries carrying `reference`, oldest first.
    pub async fn by_reference(&self, reference: &str) -> DbResult<Vec<LedgerEntry<K>>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE reference = ?1 AND keyspace = ?2 \
             ORDER BY created_at, rowid"
        ))
        .bind(reference)
        .bind(K::NAME)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }
}

/// Persists `entry` against its stock record. `entry.actor` must be set.
pub(crate) async fn insert_in<K: Keyspace>(
    conn: &mut SqliteConnection,
    stock_record_id: &str,
    entry: &LedgerEntry<K>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, keyspace, stock_record_id, item_id, location_id, kind, quantity,
            batch_number, lot_number, manufacture_date, expiry_date,
            reference, note, actor, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&entry.id)
    .bind(K::NAME)
    .bind(stock_record_id)
    .bind(entry.item_id.as_str())
    .bind(entry.location_id.as_str())
    .bind(entry.kind)
    .bind(decimal_text(entry.quantity))
    .bind(&entry.batch_number)
    .bind(&entry.lot_number)
    .bind(entry.manufacture_date)
    .bind(entry.expiry_date)
    .bind(&entry.reference)
    .bind(&entry.note)
    .bind(&entry.actor)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use depot_core::{ProductId, Retail, Warehouse, WarehouseId};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stock = db
            .stock::<Warehouse>()
            .get_or_create(&ProductId::new("P-1"), &WarehouseId::new("W-1"))
            .await
            .unwrap();

        let mut entry = LedgerEntry::<Warehouse>::inbound(ProductId::new("P-1"), WarehouseId::new("W-1"), dec!(2.5))
            .with_reference("PO-7")
            .with_lot("L-3");
        entry.actor = "receiver".to_string();

        let mut conn = db.pool().acquire().await.unwrap();
        insert_in(&mut *conn, &stock.id, &entry).await.unwrap();
        drop(conn);

        let journal = db.journal::<Warehouse>();
        let stored = journal.get(&entry.id).await.unwrap();
        assert_eq!(stored.quantity, dec!(2.5));
        assert_eq!(stored.lot_number.as_deref(), Some("L-3"));
        assert_eq!(stored.actor, "receiver");

        assert_eq!(journal.by_reference("PO-7").await.unwrap().len(), 1);
        assert!(db.journal::<Retail>().by_reference("PO-7").await.unwrap().is_empty());
        assert!(matches!(journal.get("nope").await, Err(DbError::NotFound { .. })));
    }
}
