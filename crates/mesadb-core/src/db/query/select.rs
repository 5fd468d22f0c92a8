use crate::{
    db::{
        query::{
            executor,
            predicate::{Filter, FilterExt},
        },
        record::Record,
        table::Table,
    },
    error::InternalError,
};

///
/// Projection
/// Columns kept in the result of a select.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<String>),
}

impl Projection {
    /// Parse a select list: `*` (or nothing) for every column, else a
    /// comma-separated list of names.
    #[must_use]
    pub fn parse(columns: &str) -> Self {
        let names: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() || names.iter().any(|c| c == "*") {
            Self::All
        } else {
            Self::Columns(names)
        }
    }

    pub(crate) fn apply(&self, record: Record) -> Record {
        match self {
            Self::All => record,
            Self::Columns(columns) => record.project(columns.iter().map(String::as_str)),
        }
    }
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// OrderTerm
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: OrderDirection,
}

///
/// QuerySpec
///
/// Accumulated read intent. Nothing here touches storage; the executor
/// turns it into rows.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySpec {
    pub projection: Projection,
    pub filter: Filter,
    pub order: Vec<OrderTerm>,
    pub limit: Option<usize>,
    /// Inclusive `[from, to]` slice; takes precedence over `limit`.
    pub range: Option<(usize, usize)>,
}

///
/// SelectQuery
///
/// Table-bound read builder.
///

#[derive(Clone)]
pub struct SelectQuery<'a> {
    table: Table<'a>,
    spec: QuerySpec,
}

impl<'a> SelectQuery<'a> {
    pub(crate) fn new(table: Table<'a>, projection: Projection) -> Self {
        Self {
            table,
            spec: QuerySpec {
                projection,
                ..QuerySpec::default()
            },
        }
    }

    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.table.name()
    }

    // ------------------------------------------------------------------
    // Ordering and windowing
    // ------------------------------------------------------------------

    /// Append a sort term. Later terms break ties of earlier ones; rows
    /// still tied keep their collection order.
    #[must_use]
    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.spec.order.push(OrderTerm {
            column: column.into(),
            direction: if ascending {
                OrderDirection::Asc
            } else {
                OrderDirection::Desc
            },
        });
        self
    }

    #[must_use]
    pub fn order_by(self, column: impl Into<String>) -> Self {
        self.order(column, true)
    }

    #[must_use]
    pub fn order_by_desc(self, column: impl Into<String>) -> Self {
        self.order(column, false)
    }

    /// Keep the first `n` rows. Ignored when a range is set.
    #[must_use]
    pub const fn limit(mut self, n: usize) -> Self {
        self.spec.limit = Some(n);
        self
    }

    /// Keep rows `from..=to`. An inverted range yields no rows.
    #[must_use]
    pub const fn range(mut self, from: usize, to: usize) -> Self {
        self.spec.range = Some((from, to));
        self
    }

    // ------------------------------------------------------------------
    // Result modes
    // ------------------------------------------------------------------

    /// Resolve to the first row, or `None` when nothing matched.
    #[must_use]
    pub const fn single(self) -> SingleQuery<'a> {
        SingleQuery { inner: self }
    }

    /// Resolve to the number of rows the filter matches.
    #[must_use]
    pub const fn count(self) -> CountQuery<'a> {
        CountQuery { inner: self }
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    pub fn execute(&self) -> Result<Vec<Record>, InternalError> {
        executor::load(&self.table, &self.spec)
    }
}

impl FilterExt for SelectQuery<'_> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.spec.filter
    }
}

///
/// SingleQuery
///

#[derive(Clone)]
pub struct SingleQuery<'a> {
    inner: SelectQuery<'a>,
}

impl SingleQuery<'_> {
    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        self.inner.spec()
    }

    /// Zero matching rows is `Ok(None)`, not an error.
    pub fn execute(&self) -> Result<Option<Record>, InternalError> {
        Ok(self.inner.execute()?.into_iter().next())
    }
}

impl FilterExt for SingleQuery<'_> {
    fn filter_mut(&mut self) -> &mut Filter {
        self.inner.filter_mut()
    }
}

///
/// CountQuery
///

#[derive(Clone)]
pub struct CountQuery<'a> {
    inner: SelectQuery<'a>,
}

impl CountQuery<'_> {
    /// Counts filter matches; order, limit and range do not apply.
    pub fn execute(&self) -> Result<usize, InternalError> {
        executor::count(&self.inner.table, &self.inner.spec.filter)
    }
}

impl FilterExt for CountQuery<'_> {
    fn filter_mut(&mut self) -> &mut Filter {
        self.inner.filter_mut()
    }
}
