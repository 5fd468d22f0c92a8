//! Observability: per-store counters and the sink boundary.
//!
//! Table and query code never touches counters directly; every
//! instrumentation point emits a [`MetricsEvent`] through the store.

mod metrics;
mod sink;

pub use metrics::{Counters, MetricsReport};
pub use sink::{ExecKind, MetricsEvent, MetricsSink};
