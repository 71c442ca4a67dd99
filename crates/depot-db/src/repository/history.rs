//! # History Log
//!
//! Append-only audit chain, one sequence per stock record.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_history                                                          │
//! │                                                                         │
//! │  stock_record_id │ seq │ kind   │ delta │ previous │ new                │
//! │  ────────────────┼─────┼────────┼───────┼──────────┼─────               │
//! │  s-1             │  1  │ in     │  100  │     0    │ 100                │
//! │  s-1             │  2  │ out    │   30  │   100    │  70                │
//! │  s-1             │  3  │ adjust │   -5  │    70    │  65                │
//! │                                                                         │
//! │  seq is assigned inside the writer's unit of work, which already holds │
//! │  the write lock, so MAX(seq) + 1 cannot race.                          │
//! │  UPDATE / DELETE are rejected by triggers.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::rows::{convert_all, decimal_text, parse_decimal, HistoryRow, HISTORY_COLUMNS};
use depot_core::{verify_chain, ChainReport, HistoryRecord, Movement};

/// Result of comparing a record's stored balance with its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub stock_record_id: String,
    pub stored_quantity: Decimal,
    pub chain: ChainReport,
}

impl Reconciliation {
    /// True when the chain is intact and ends at the stored balance.
    pub fn is_consistent(&self) -> bool {
        self.chain.is_intact() && self.chain.final_quantity == self.stored_quantity
    }
}

/// Everything needed to append one history row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HistoryDraft<'a> {
    pub stock_record_id: &'a str,
    pub ledger_entry_id: Option<&'a str>,
    pub movement: Movement,
    pub reference: Option<&'a str>,
    pub note: Option<&'a str>,
    pub actor: &'a str,
}

/// Read access to stock history. Writes go through the ledger processor.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    pool: SqlitePool,
}

impl HistoryLog {
    /// Creates a new HistoryLog.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryLog { pool }
    }

    /// History of one stock record in `seq` order.
    pub async fn for_stock(&self, stock_record_id: &str) -> DbResult<Vec<HistoryRecord>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {HISTORY_COLUMNS} FROM stock_history WHERE stock_record_id = ?1 ORDER BY seq"
        ))
        .bind(stock_record_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(stock_record_id, count = rows.len(), "Loaded stock history");
        convert_all(rows)
    }

    /// Every history row carrying `reference`, across records.
    pub async fn for_reference(&self, reference: &str) -> DbResult<Vec<HistoryRecord>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {HISTORY_COLUMNS} FROM stock_history WHERE reference = ?1 \
             ORDER BY created_at, stock_record_id, seq"
        ))
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        convert_all(rows)
    }

    /// Checks adjacency and per-row arithmetic of a record's chain.
    pub async fn verify_chain(&self, stock_record_id: &str) -> DbResult<ChainReport> {
        let history = self.for_stock(stock_record_id).await?;
        let report = verify_chain(&history);

        if !report.is_intact() {
            warn!(stock_record_id, breaks = report.breaks.len(), "History chain is broken");
        }
        Ok(report)
    }

    /// Compares the stored balance with where its history ends.
    ///
    /// Both are read in one snapshot so a concurrent commit cannot make a
    /// healthy record look inconsistent.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No stock record with this id
    pub async fn reconcile(&self, stock_record_id: &str) -> DbResult<Reconciliation> {
        let mut tx = self.pool.begin().await?;

        let stored: Option<String> = sqlx::query_scalar("SELECT quantity FROM stock_records WHERE id = ?1")
            .bind(stock_record_id)
            .fetch_optional(&mut *tx)
            .await?;
        let stored = stored.ok_or_else(|| DbError::not_found("StockRecord", stock_record_id))?;
        let stored_quantity = parse_decimal("quantity", &stored)?;

        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {HISTORY_COLUMNS} FROM stock_history WHERE stock_record_id = ?1 ORDER BY seq"
        ))
        .bind(stock_record_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let history: Vec<HistoryRecord> = convert_all(rows)?;
        let reconciliation = Reconciliation {
            stock_record_id: stock_record_id.to_string(),
            stored_quantity,
            chain: verify_chain(&history),
        };

        if !reconciliation.is_consistent() {
            warn!(
                stock_record_id,
                stored = %stored_quantity,
                chain_end = %reconciliation.chain.final_quantity,
                "Stock record does not reconcile with its history"
            );
        }
        Ok(reconciliation)
    }
}

// =============================================================================
// Unit-of-work helpers
// =============================================================================

/// Appends the next row of a record's chain.
pub(crate) async fn append_in(conn: &mut SqliteConnection, draft: HistoryDraft<'_>) -> DbResult<HistoryRecord> {
    let seq: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(seq), 0) + 1 FROM stock_history WHERE stock_record_id = ?1")
        .bind(draft.stock_record_id)
        .fetch_one(&mut *conn)
        .await?;

    let record = HistoryRecord {
        id: Uuid::new_v4().to_string(),
        stock_record_id: draft.stock_record_id.to_string(),
        seq,
        ledger_entry_id: draft.ledger_entry_id.map(str::to_string),
        kind: draft.movement.kind,
        quantity_delta: draft.movement.delta,
        previous_qty: draft.movement.previous,
        new_qty: draft.movement.new,
        reference: draft.reference.map(str::to_string),
        note: draft.note.map(str::to_string),
        actor: draft.actor.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO stock_history (
            id, stock_record_id, seq, ledger_entry_id, kind,
            quantity_delta, previous_qty, new_qty, reference, note, actor, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&record.id)
    .bind(&record.stock_record_id)
    .bind(record.seq)
    .bind(&record.ledger_entry_id)
    .bind(record.kind)
    .bind(decimal_text(record.quantity_delta))
    .bind(decimal_text(record.previous_qty))
    .bind(decimal_text(record.new_qty))
    .bind(&record.reference)
    .bind(&record.note)
    .bind(&record.actor)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(record)
}

// =============================================================================
// Unit Tests
// =============================================================================
