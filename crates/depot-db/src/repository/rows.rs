//! Row shapes as stored in SQLite and their conversion to domain types.
//!
//! Decimals live in TEXT columns, so every row is read into a plain struct
//! first and parsed afterwards. A malformed value surfaces as
//! [`DbError::InvalidData`] instead of a silent zero.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{DbError, DbResult};
use depot_core::{EntryKind, HistoryRecord, Identity, Keyspace, LedgerEntry, MovementKind, StockRecord};

pub(crate) const STOCK_COLUMNS: &str = "id, item_id, location_id, quantity, \
     bin_location, shelf_number, zone_code, batch_number, lot_number, \
     manufacture_date, expiry_date, created_at, updated_at";

pub(crate) const HISTORY_COLUMNS: &str = "id, stock_record_id, seq, ledger_entry_id, kind, \
     quantity_delta, previous_qty, new_qty, reference, note, actor, created_at";

pub(crate) const ENTRY_COLUMNS: &str = "id, item_id, location_id, kind, quantity, \
     batch_number, lot_number, manufacture_date, expiry_date, reference, note, actor, created_at";

/// Canonical text form of a quantity.
pub(crate) fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn parse_decimal(column: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw).map_err(|_| DbError::invalid_data(column, raw))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StockRow {
    id: String,
    item_id: String,
    location_id: String,
    quantity: String,
    bin_location: Option<String>,
    shelf_number: Option<String>,
    zone_code: Option<String>,
    batch_number: Option<String>,
    lot_number: Option<String>,
    manufacture_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<K: Keyspace> TryFrom<StockRow> for StockRecord<K> {
    type Error = DbError;

    fn try_from(row: StockRow) -> DbResult<Self> {
        Ok(StockRecord {
            quantity: parse_decimal("quantity", &row.quantity)?,
            id: row.id,
            item_id: K::Item::from_stored(row.item_id),
            location_id: K::Location::from_stored(row.location_id),
            bin_location: row.bin_location,
            shelf_number: row.shelf_number,
            zone_code: row.zone_code,
            batch_number: row.batch_number,
            lot_number: row.lot_number,
            manufacture_date: row.manufacture_date,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRow {
    id: String,
    stock_record_id: String,
    seq: i64,
    ledger_entry_id: Option<String>,
    kind: MovementKind,
    quantity_delta: String,
    previous_qty: String,
    new_qty: String,
    reference: Option<String>,
    note: Option<String>,
    actor: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> DbResult<Self> {
        Ok(HistoryRecord {
            quantity_delta: parse_decimal("quantity_delta", &row.quantity_delta)?,
            previous_qty: parse_decimal("previous_qty", &row.previous_qty)?,
            new_qty: parse_decimal("new_qty", &row.new_qty)?,
            id: row.id,
            stock_record_id: row.stock_record_id,
            seq: row.seq,
            ledger_entry_id: row.ledger_entry_id,
            kind: row.kind,
            reference: row.reference,
            note: row.note,
            actor: row.actor,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntryRow {
    id: String,
    item_id: String,
    location_id: String,
    kind: EntryKind,
    quantity: String,
    batch_number: Option<String>,
    lot_number: Option<String>,
    manufacture_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    reference: Option<String>,
    note: Option<String>,
    actor: String,
    created_at: DateTime<Utc>,
}

impl<K: Keyspace> TryFrom<EntryRow> for LedgerEntry<K> {
    type Error = DbError;

    fn try_from(row: EntryRow) -> DbResult<Self> {
        Ok(LedgerEntry {
            quantity: parse_decimal("quantity", &row.quantity)?,
            id: row.id,
            item_id: K::Item::from_stored(row.item_id),
            location_id: K::Location::from_stored(row.location_id),
            kind: row.kind,
            batch_number: row.batch_number,
            lot_number: row.lot_number,
            manufacture_date: row.manufacture_date,
            expiry_date: row.expiry_date,
            reference: row.reference,
            note: row.note,
            actor: row.actor,
            created_at: row.created_at,
        })
    }
}

/// Converts a batch of rows, failing on the first undecodable one.
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> DbResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    rows.into_iter().map(T::try_from).collect()
}
