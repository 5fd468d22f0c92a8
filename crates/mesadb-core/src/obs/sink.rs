///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl ExecKind {
    #[must_use]
    pub const fn is_write(self) -> bool {
        !matches!(self, Self::Select)
    }
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        table: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        table: &'a str,
        rows: u64,
    },
    RowsScanned {
        table: &'a str,
        rows: u64,
    },
    IndexHit {
        table: &'a str,
        column: &'a str,
    },
    IndexRebuild {
        table: &'a str,
        column: &'a str,
        rows: u64,
    },
    WriteFailed {
        table: &'a str,
    },
}

impl MetricsEvent<'_> {
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::ExecStart { table, .. }
            | Self::ExecFinish { table, .. }
            | Self::RowsScanned { table, .. }
            | Self::IndexHit { table, .. }
            | Self::IndexRebuild { table, .. }
            | Self::WriteFailed { table } => table,
        }
    }
}

///
/// MetricsSink
///
/// Extra observer for store events. The store always keeps its own
/// counters; an installed sink sees the same events afterwards.
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}
