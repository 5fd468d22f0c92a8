use crate::{
    db::{
        index::{IndexKey, IndexStatus},
        query::{
            predicate::{Filter, Predicate},
            select::{OrderDirection, OrderTerm, QuerySpec},
        },
        record::{Collection, Record},
        table::Table,
    },
    error::InternalError,
    obs::{ExecKind, MetricsEvent},
    value::{Value, canonical_cmp},
};
use std::{cmp::Ordering, fmt};

///
/// AccessPath
/// How the candidate rows were obtained.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AccessPath<'a> {
    FullScan,
    Index { column: &'a str },
}

impl fmt::Display for AccessPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullScan => write!(f, "full_scan"),
            Self::Index { column } => write!(f, "index({column})"),
        }
    }
}

/// Run a select: seed, filter, sort, window, project.
pub(crate) fn load(table: &Table<'_>, spec: &QuerySpec) -> Result<Collection, InternalError> {
    let store = table.store();
    let name = table.name();
    store.record(MetricsEvent::ExecStart {
        kind: ExecKind::Select,
        table: name,
    });

    let (mut rows, path) = seed(table, &spec.filter)?;
    let scanned = rows.len();
    store.record(MetricsEvent::RowsScanned {
        table: name,
        rows: scanned as u64,
    });

    rows.retain(|record| spec.filter.matches(record));
    if !spec.order.is_empty() {
        rows.sort_by(|a, b| compare_rows(a, b, &spec.order));
    }

    let rows: Collection = window(rows, spec.range, spec.limit)
        .map(|record| spec.projection.apply(record))
        .collect();

    store.record(MetricsEvent::ExecFinish {
        kind: ExecKind::Select,
        table: name,
        rows: rows.len() as u64,
    });
    store.debug_log(|| {
        format!(
            "select {name}: access={path} scanned={scanned} returned={}",
            rows.len()
        )
    });

    Ok(rows)
}

/// Number of rows matching `filter`, through the same access path a
/// select would take.
pub(crate) fn count(table: &Table<'_>, filter: &Filter) -> Result<usize, InternalError> {
    let store = table.store();
    let name = table.name();
    store.record(MetricsEvent::ExecStart {
        kind: ExecKind::Select,
        table: name,
    });

    let (rows, path) = seed(table, filter)?;
    store.record(MetricsEvent::RowsScanned {
        table: name,
        rows: rows.len() as u64,
    });
    let matched = rows.iter().filter(|record| filter.matches(record)).count();

    store.record(MetricsEvent::ExecFinish {
        kind: ExecKind::Select,
        table: name,
        rows: matched as u64,
    });
    store.debug_log(|| {
        format!(
            "count {name}: access={path} scanned={} matched={matched}",
            rows.len()
        )
    });

    Ok(matched)
}

// Candidate rows. The first equality term on an indexed column whose
// value has an index key seeds from the index; every term is still
// applied afterwards, so the seed only has to be a superset.
fn seed<'f>(
    table: &Table<'_>,
    filter: &'f Filter,
) -> Result<(Collection, AccessPath<'f>), InternalError> {
    let store = table.store();
    let indexes = store.indexes();
    let name = table.name();

    if !indexes.is_enabled() {
        return Ok((table.select_all()?, AccessPath::FullScan));
    }

    let candidate = filter
        .predicates()
        .iter()
        .filter_map(Predicate::as_eq)
        .filter(|(column, _)| indexes.is_declared(name, column))
        .find_map(|(column, value)| IndexKey::from_value(value).map(|key| (column, key)));

    let Some((column, key)) = candidate else {
        return Ok((table.select_all()?, AccessPath::FullScan));
    };

    if let IndexStatus::Rebuilt { rows } =
        indexes.ensure_index(name, column, || table.select_all())?
    {
        store.record(MetricsEvent::IndexRebuild {
            table: name,
            column,
            rows: rows as u64,
        });
    }

    match indexes.lookup(name, column, &key) {
        Some(rows) => {
            store.record(MetricsEvent::IndexHit {
                table: name,
                column,
            });
            Ok((rows, AccessPath::Index { column }))
        }
        None => Ok((table.select_all()?, AccessPath::FullScan)),
    }
}

fn compare_rows(a: &Record, b: &Record, order: &[OrderTerm]) -> Ordering {
    order
        .iter()
        .map(|term| {
            let left = a.get(&term.column).unwrap_or(&Value::Null);
            let right = b.get(&term.column).unwrap_or(&Value::Null);
            let ord = canonical_cmp(left, right);

            match term.direction {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn window(
    rows: Collection,
    range: Option<(usize, usize)>,
    limit: Option<usize>,
) -> impl Iterator<Item = Record> {
    let (skip, take) = match (range, limit) {
        (Some((from, to)), _) if from > to => (0, 0),
        (Some((from, to)), _) => (from, (to - from).saturating_add(1)),
        (None, Some(n)) => (0, n),
        (None, None) => (0, usize::MAX),
    };

    rows.into_iter().skip(skip).take(take)
}
