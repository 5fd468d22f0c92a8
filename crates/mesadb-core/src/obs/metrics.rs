use crate::obs::sink::{ExecKind, MetricsEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Counters
/// Ephemeral operation counters, kept both in total and per table.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Counters {
    // entrypoints
    pub select_calls: u64,
    pub insert_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,

    // rows touched
    pub rows_scanned: u64,
    pub rows_returned: u64,
    pub rows_written: u64,

    // index use
    pub index_hits: u64,
    pub index_rebuilds: u64,

    pub write_failures: u64,
}

impl Counters {
    fn apply(&mut self, event: &MetricsEvent<'_>) {
        match *event {
            MetricsEvent::ExecStart { kind, .. } => {
                let calls = match kind {
                    ExecKind::Select => &mut self.select_calls,
                    ExecKind::Insert => &mut self.insert_calls,
                    ExecKind::Update => &mut self.update_calls,
                    ExecKind::Delete => &mut self.delete_calls,
                };
                *calls = calls.saturating_add(1);
            }
            MetricsEvent::ExecFinish { kind, rows, .. } => {
                if kind.is_write() {
                    self.rows_written = self.rows_written.saturating_add(rows);
                } else {
                    self.rows_returned = self.rows_returned.saturating_add(rows);
                }
            }
            MetricsEvent::RowsScanned { rows, .. } => {
                self.rows_scanned = self.rows_scanned.saturating_add(rows);
            }
            MetricsEvent::IndexHit { .. } => {
                self.index_hits = self.index_hits.saturating_add(1);
            }
            MetricsEvent::IndexRebuild { .. } => {
                self.index_rebuilds = self.index_rebuilds.saturating_add(1);
            }
            MetricsEvent::WriteFailed { .. } => {
                self.write_failures = self.write_failures.saturating_add(1);
            }
        }
    }
}

///
/// MetricsReport
/// Point-in-time copy of a store's counters.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub totals: Counters,
    pub tables: BTreeMap<String, Counters>,
}

impl MetricsReport {
    pub(crate) fn apply(&mut self, event: &MetricsEvent<'_>) {
        self.totals.apply(event);
        self.tables
            .entry(event.table().to_string())
            .or_default()
            .apply(event);
    }

    #[must_use]
    pub fn table(&self, table: &str) -> Option<&Counters> {
        self.tables.get(table)
    }
}

///
/// TESTS
///
