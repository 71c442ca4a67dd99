//! # Ledger Processor
//!
//! The only writer of balances and history.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  process_entry(entry, actor)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate ── rejected ──► InvalidEntry (storage untouched)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────┐      │
//! │  │ 1. get-or-create record   (first statement is a write:       │      │
//! │  │                            takes the database write lock)    │      │
//! │  │ 2. compute new balance ── negative OUT ──► ROLLBACK ──► Insufficient │
//! │  │ 3. insert ledger entry                                       │      │
//! │  │ 4. update balance + supplied metadata                        │      │
//! │  │ 5. append history row                                        │      │
//! │  COMMIT ◄───────────────────────────────────────────────────────┘      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  HistoryRecord                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure inside the unit of work rolls everything back. The processor
//! never retries; a [`LedgerError::Storage`] failure for which
//! [`LedgerError::is_retryable`] holds is safe for the caller to retry
//! unchanged. Re-submitting an entry that already committed is rejected as
//! `InvalidEntry`.
//!
//! ## Concurrency
//! SQLite admits one writer per database, so units of work on unrelated
//! (item, location) keys also serialise on the write lock. Each holds it
//! for one short transaction; a wait longer than the configured busy
//! timeout fails as a retryable `Storage(Busy)`.

use rust_decimal::Decimal;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::marker::PhantomData;
use tracing::{debug, info, warn};

use crate::error::{DbError, LedgerError, LedgerResult};
use crate::repository::history::{self, HistoryDraft};
use crate::repository::{journal, stock};
use depot_core::validation::{validate_adjustment, validate_entry};
use depot_core::{HistoryRecord, Identity, Keyspace, LedgerEntry, Movement};

/// An open unit of work. Commit it to persist, drop it to roll back.
pub type UnitOfWork<'c> = Transaction<'c, Sqlite>;

/// Applies ledger entries and adjustments for one keyspace.
///
/// Stateless apart from the pool handle it was built with; cheap to clone
/// and share between tasks. Calls on different keys do not conflict but
/// still take turns on the database write lock.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger::<Warehouse>();
///
/// let entry = LedgerEntry::inbound(ProductId::new("P-1"), WarehouseId::new("W-1"), dec!(100))
///     .with_reference("PO-1");
/// let history = ledger.process_entry(entry, "receiver").await?;
/// assert_eq!(history.new_qty, dec!(100));
/// ```
#[derive(Debug, Clone)]
pub struct LedgerProcessor<K: Keyspace> {
    pool: SqlitePool,
    _keyspace: PhantomData<K>,
}

impl<K: Keyspace> LedgerProcessor<K> {
    /// Creates a processor over an explicit storage handle.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerProcessor {
            pool,
            _keyspace: PhantomData,
        }
    }

    /// Opens a unit of work for callers that compose several ledger
    /// operations with their own writes.
    pub async fn begin(&self) -> LedgerResult<UnitOfWork<'static>> {
        Ok(self.pool.begin().await?)
    }

    /// Applies one IN/OUT entry in its own unit of work.
    ///
    /// ## Returns
    /// * `Ok(HistoryRecord)` - Entry, balance and history committed together
    /// * `Err(InvalidEntry)` - Malformed entry; nothing touched
    /// * `Err(InsufficientStock)` - OUT exceeds the balance; nothing persisted
    /// * `Err(InvalidEntry)` - `entry.id` was already committed
    /// * `Err(Storage)` - Transaction failed; nothing persisted, retryable when transient
    pub async fn process_entry(&self, entry: LedgerEntry<K>, actor: &str) -> LedgerResult<HistoryRecord> {
        let entry = prepare_entry(entry, actor)?;

        let mut uow = self.pool.begin().await?;
        match apply_entry(&mut *uow, &entry).await {
            Ok(record) => {
                uow.commit().await?;
                info!(
                    keyspace = K::NAME,
                    entry_id = %entry.id,
                    item_id = %entry.item_id,
                    location_id = %entry.location_id,
                    kind = %entry.kind,
                    quantity = %entry.quantity,
                    new_qty = %record.new_qty,
                    "Ledger entry committed"
                );
                Ok(record)
            }
            Err(err) => {
                rollback(uow).await;
                warn!(
                    keyspace = K::NAME,
                    entry_id = %entry.id,
                    item_id = %entry.item_id,
                    location_id = %entry.location_id,
                    error = %err,
                    "Ledger entry rejected"
                );
                Err(err)
            }
        }
    }

    /// Applies one IN/OUT entry inside a unit of work the caller owns.
    ///
    /// Nothing is committed here. On error the caller must drop or roll
    /// back `uow`; earlier writes in it are not undone individually.
    pub async fn process_entry_in(
        &self,
        uow: &mut UnitOfWork<'_>,
        entry: LedgerEntry<K>,
        actor: &str,
    ) -> LedgerResult<HistoryRecord> {
        let entry = prepare_entry(entry, actor)?;
        apply_entry(&mut **uow, &entry).await
    }

    /// Sets a balance directly, e.g. after a physical count.
    ///
    /// Bypasses the non-negativity rule. A negative target is accepted and
    /// logged at `warn`.
    ///
    /// ## Returns
    /// * `Ok(HistoryRecord)` - ADJUST row with `quantity_delta = new - previous`
    /// * `Err(NotFound)` - No stock record with this id in this keyspace
    pub async fn adjust_stock(
        &self,
        stock_id: &str,
        new_quantity: Decimal,
        note: Option<&str>,
        actor: &str,
    ) -> LedgerResult<HistoryRecord> {
        validate_adjustment(stock_id, note, actor)?;

        let mut uow = self.pool.begin().await?;
        match apply_adjustment::<K>(&mut *uow, stock_id, new_quantity, note, actor).await {
            Ok(record) => {
                uow.commit().await?;
                if new_quantity < Decimal::ZERO {
                    warn!(
                        keyspace = K::NAME,
                        stock_id,
                        new_qty = %new_quantity,
                        actor,
                        "Stock adjusted to a negative balance"
                    );
                }
                info!(
                    keyspace = K::NAME,
                    stock_id,
                    previous_qty = %record.previous_qty,
                    new_qty = %record.new_qty,
                    "Stock adjusted"
                );
                Ok(record)
            }
            Err(err) => {
                rollback(uow).await;
                warn!(keyspace = K::NAME, stock_id, error = %err, "Stock adjustment failed");
                Err(err)
            }
        }
    }
}

fn prepare_entry<K: Keyspace>(mut entry: LedgerEntry<K>, actor: &str) -> LedgerResult<LedgerEntry<K>> {
    if let Err(err) = validate_entry(&entry, actor) {
        warn!(keyspace = K::NAME, entry_id = %entry.id, error = %err, "Invalid ledger entry");
        return Err(err.into());
    }
    entry.actor = actor.to_string();
    Ok(entry)
}

async fn rollback(uow: UnitOfWork<'_>) {
    if let Err(err) = uow.rollback().await {
        // The connection discards the transaction when it goes back to the pool.
        warn!(error = %err, "Rollback failed");
    }
}

// =============================================================================
// Unit-of-work bodies
// =============================================================================

async fn apply_entry<K: Keyspace>(conn: &mut SqliteConnection, entry: &LedgerEntry<K>) -> LedgerResult<HistoryRecord> {
    let record = stock::get_or_create_in::<K>(conn, &entry.item_id, &entry.location_id).await?;

    let movement = Movement::entry(
        entry.kind,
        record.quantity,
        entry.quantity,
        entry.item_id.as_str(),
        entry.location_id.as_str(),
    )?;
    debug!(stock_id = %record.id, previous = %movement.previous, new = %movement.new, "Computed movement");

    journal::insert_in(conn, &record.id, entry).await.map_err(|err| match err {
        DbError::UniqueViolation { ref field, .. } if field == "ledger_entries.id" => {
            LedgerError::InvalidEntry(format!("entry {} is already committed", entry.id))
        }
        other => other.into(),
    })?;
    stock::apply_entry_in(conn, &record.id, movement.new, entry).await?;

    let history = history::append_in(
        conn,
        HistoryDraft {
            stock_record_id: &record.id,
            ledger_entry_id: Some(&entry.id),
            movement,
            reference: entry.reference.as_deref(),
            note: entry.note.as_deref(),
            actor: &entry.actor,
        },
    )
    .await?;

    Ok(history)
}

async fn apply_adjustment<K: Keyspace>(
    conn: &mut SqliteConnection,
    stock_id: &str,
    new_quantity: Decimal,
    note: Option<&str>,
    actor: &str,
) -> LedgerResult<HistoryRecord> {
    let not_found = || LedgerError::NotFound {
        entity: "StockRecord".to_string(),
        id: stock_id.to_string(),
    };

    if !stock::lock_by_id_in::<K>(conn, stock_id).await? {
        return Err(not_found());
    }
    let record = stock::find_by_id_in::<K>(conn, stock_id).await?.ok_or_else(not_found)?;

    let movement = Movement::adjustment(record.quantity, new_quantity)?;
    stock::set_quantity_in(conn, &record.id, movement.new).await?;

    let history = history::append_in(
        conn,
        HistoryDraft {
            stock_record_id: &record.id,
            ledger_entry_id: None,
            movement,
            reference: None,
            note,
            actor,
        },
    )
    .await?;

    Ok(history)
}

// =============================================================================
// Unit Tests
// =============================================================================
