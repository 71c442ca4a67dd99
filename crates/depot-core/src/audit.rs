//! # History Chain Audit
//!
//! Pure checks over a stock record's history.
//!
//! ```text
//!   seq 1            seq 2            seq 3
//!  ┌──────────┐     ┌──────────┐     ┌──────────┐
//!  │ IN  100  │     │ OUT  30  │     │ ADJ  -5  │
//!  │ 0 → 100  │────►│ 100 → 70 │────►│ 70 → 65  │
//!  └──────────┘     └──────────┘     └──────────┘
//!        new_qty == next.previous_qty
//! ```

use rust_decimal::Decimal;
use serde::Serialize;

use crate::movement::Movement;
use crate::types::HistoryRecord;

/// A defect found while walking a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChainBreak {
    /// `previous_qty` of `seq` does not continue the prior record.
    Gap {
        seq: i64,
        expected_previous: Decimal,
        found_previous: Decimal,
    },
    /// `new_qty` of `seq` does not follow from its own delta.
    Arithmetic {
        seq: i64,
        expected_new: Decimal,
        found_new: Decimal,
    },
    /// The first record does not start from zero.
    NonZeroOrigin { seq: i64, found_previous: Decimal },
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub records: usize,
    /// `new_qty` of the last record, zero for an empty chain.
    pub final_quantity: Decimal,
    pub breaks: Vec<ChainBreak>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.breaks.is_empty()
    }
}

/// Walks `history` in the given order, which must be `seq` order.
///
/// Every balance starts at zero when its record is created, so the first
/// record must have `previous_qty == 0`.
pub fn verify_chain(history: &[HistoryRecord]) -> ChainReport {
    let mut breaks = Vec::new();
    let mut carried = Decimal::ZERO;

    for (index, record) in history.iter().enumerate() {
        if record.previous_qty != carried {
            breaks.push(if index == 0 {
                ChainBreak::NonZeroOrigin {
                    seq: record.seq,
                    found_previous: record.previous_qty,
                }
            } else {
                ChainBreak::Gap {
                    seq: record.seq,
                    expected_previous: carried,
                    found_previous: record.previous_qty,
                }
            });
        }

        match Movement::expected_new(record.kind, record.previous_qty, record.quantity_delta) {
            Some(expected) if expected == record.new_qty => {}
            expected => breaks.push(ChainBreak::Arithmetic {
                seq: record.seq,
                expected_new: expected.unwrap_or(Decimal::MAX),
                found_new: record.new_qty,
            }),
        }

        carried = record.new_qty;
    }

    ChainReport {
        records: history.len(),
        final_quantity: carried,
        breaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovementKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(seq: i64, kind: MovementKind, delta: Decimal, prev: Decimal, new: Decimal) -> HistoryRecord {
        HistoryRecord {
            id: format!("h-{seq}"),
            stock_record_id: "s-1".to_string(),
            seq,
            ledger_entry_id: None,
            kind,
            quantity_delta: delta,
            previous_qty: prev,
            new_qty: new,
            reference: None,
            note: None,
            actor: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_intact_chain() {
        let history = vec![
            record(1, MovementKind::In, dec!(100), dec!(0), dec!(100)),
            record(2, MovementKind::Out, dec!(30), dec!(100), dec!(70)),
            record(3, MovementKind::Adjust, dec!(-5), dec!(70), dec!(65)),
        ];
        let report = verify_chain(&history);
        assert!(report.is_intact());
        assert_eq!(report.records, 3);
        assert_eq!(report.final_quantity, dec!(65));
    }

    #[test]
    fn test_empty_chain() {
        let report = verify_chain(&[]);
        assert!(report.is_intact());
        assert_eq!(report.final_quantity, Decimal::ZERO);
    }

    #[test]
    fn test_gap_detected() {
        let history = vec![
            record(1, MovementKind::In, dec!(100), dec!(0), dec!(100)),
            record(2, MovementKind::Out, dec!(30), dec!(90), dec!(60)),
        ];
        let report = verify_chain(&history);
        assert_eq!(
            report.breaks,
            vec![ChainBreak::Gap {
                seq: 2,
                expected_previous: dec!(100),
                found_previous: dec!(90),
            }]
        );
    }

    #[test]
    fn test_bad_arithmetic_and_origin() {
        let history = vec![record(1, MovementKind::In, dec!(10), dec!(5), dec!(20))];
        let report = verify_chain(&history);
        assert_eq!(report.breaks.len(), 2);
        assert!(matches!(report.breaks[0], ChainBreak::NonZeroOrigin { seq: 1, .. }));
        assert!(matches!(report.breaks[1], ChainBreak::Arithmetic { seq: 1, .. }));
    }
}
