//! # Batch Runner
//!
//! Applies the lines of a multi-line document (receipt, shipment, pick
//! list) one after another.
//!
//! ```text
//!   entries:   [0] ──► [1] ──► [2] ──► [3]
//!               ✓       ✓       ✗       ·
//!                               │
//!                               ▼
//!   BatchError { committed: 2, failed_index: 2, source }
//!   entries 0 and 1 stay committed; entry 3 is never attempted
//! ```
//!
//! Each entry is its own unit of work. There is no batch-wide rollback;
//! callers that need all-or-nothing use
//! [`LedgerProcessor::process_entry_in`] inside one unit of work instead.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::BatchError;
use crate::ledger::processor::LedgerProcessor;
use depot_core::{HistoryRecord, Keyspace, LedgerEntry};

/// History rows of a fully applied batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub history: Vec<HistoryRecord>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Sequences entries through a [`LedgerProcessor`].
#[derive(Debug, Clone)]
pub struct BatchRunner<K: Keyspace> {
    processor: LedgerProcessor<K>,
}

impl<K: Keyspace> BatchRunner<K> {
    pub fn new(processor: LedgerProcessor<K>) -> Self {
        BatchRunner { processor }
    }

    /// Processes `entries` in order, stopping at the first failure.
    pub async fn process_batch(
        &self,
        entries: impl IntoIterator<Item = LedgerEntry<K>>,
        actor: &str,
    ) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();

        for (index, entry) in entries.into_iter().enumerate() {
            match self.processor.process_entry(entry, actor).await {
                Ok(record) => report.history.push(record),
                Err(source) => {
                    warn!(
                        keyspace = K::NAME,
                        committed = report.len(),
                        failed_index = index,
                        error = %source,
                        "Batch stopped"
                    );
                    return Err(BatchError {
                        committed: report.len(),
                        failed_index: index,
                        source,
                    });
                }
            }
        }

        info!(keyspace = K::NAME, entries = report.len(), "Batch committed");
        Ok(report)
    }
}
