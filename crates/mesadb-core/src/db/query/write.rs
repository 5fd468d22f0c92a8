use crate::{
    db::{
        query::predicate::{Filter, FilterExt},
        record::Record,
        table::Table,
    },
    error::InternalError,
};
use derive_more::{Deref, IntoIterator};

///
/// InsertRows
/// One record or a batch; either way a single write-back.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
pub struct InsertRows(Vec<Record>);

impl From<Record> for InsertRows {
    fn from(record: Record) -> Self {
        Self(vec![record])
    }
}

impl From<Vec<Record>> for InsertRows {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl<const N: usize> From<[Record; N]> for InsertRows {
    fn from(records: [Record; N]) -> Self {
        Self(records.into())
    }
}

///
/// InsertQuery
///

#[derive(Clone)]
pub struct InsertQuery<'a> {
    table: Table<'a>,
    rows: InsertRows,
}

impl<'a> InsertQuery<'a> {
    pub(crate) const fn new(table: Table<'a>, rows: InsertRows) -> Self {
        Self { table, rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Insert the rows and return them as stored (ids and timestamps
    /// filled in).
    pub fn execute(&self) -> Result<Vec<Record>, InternalError> {
        self.table.insert_records(self.rows.to_vec())
    }
}

///
/// UpdateQuery
///

#[derive(Clone)]
pub struct UpdateQuery<'a> {
    table: Table<'a>,
    patch: Record,
    filter: Filter,
}

impl<'a> UpdateQuery<'a> {
    pub(crate) const fn new(table: Table<'a>, patch: Record) -> Self {
        Self {
            table,
            patch,
            filter: Filter::new(),
        }
    }

    #[must_use]
    pub const fn patch(&self) -> &Record {
        &self.patch
    }

    /// Apply the patch to every matching row; returns exactly the
    /// updated rows. A filterless update is rejected.
    pub fn execute(&self) -> Result<Vec<Record>, InternalError> {
        self.table.update_matching(&self.filter, &self.patch)
    }
}

impl FilterExt for UpdateQuery<'_> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }
}

///
/// DeleteQuery
///

#[derive(Clone)]
pub struct DeleteQuery<'a> {
    table: Table<'a>,
    filter: Filter,
}

impl<'a> DeleteQuery<'a> {
    pub(crate) const fn new(table: Table<'a>) -> Self {
        Self {
            table,
            filter: Filter::new(),
        }
    }

    /// Remove every matching row; returns how many were removed.
    /// A filterless delete is rejected.
    pub fn execute(&self) -> Result<usize, InternalError> {
        self.table.delete_matching(&self.filter)
    }
}

impl FilterExt for DeleteQuery<'_> {
    fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }
}
