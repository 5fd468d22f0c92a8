//! Read-side equality indexes.
//!
//! An index maps a column value to the records holding it, in collection
//! order. Indexes are a cache only: every write primitive invalidates the
//! table's indexes and the next read rebuilds lazily with one full pass.
//! A missing or freshly rebuilt index answers exactly like a full scan.

use crate::{
    db::record::{Collection, ID_FIELD, Record},
    value::{Value, float_as_exact_int},
};
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet, HashMap},
};

///
/// IndexKey
///
/// Hashable normal form of an indexable value. Two values share a key
/// exactly when [`crate::value::value_eq`] holds between them, so an
/// integral float lands on the integer key.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum IndexKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
}

impl IndexKey {
    /// `None` for values an index cannot answer for (NaN, lists, maps).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) if f.is_nan() => None,
            Value::Float(f) => Some(
                float_as_exact_int(*f).map_or_else(|| Self::Float(f.to_bits()), Self::Int),
            ),
            Value::Text(s) => Some(Self::Text(s.clone())),
            Value::List(_) | Value::Map(_) => None,
        }
    }
}

///
/// IndexStatus
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexStatus {
    Fresh,
    Rebuilt { rows: usize },
}

#[derive(Debug, Default)]
struct ColumnIndex {
    entries: HashMap<IndexKey, Vec<Record>>,
}

impl ColumnIndex {
    fn build(column: &str, rows: &[Record]) -> Self {
        let mut entries: HashMap<IndexKey, Vec<Record>> = HashMap::new();
        for record in rows {
            if let Some(key) = record.get(column).and_then(IndexKey::from_value) {
                entries.entry(key).or_default().push(record.clone());
            }
        }

        Self { entries }
    }
}

///
/// IndexManager
///
/// Owns the built indexes of one store instance. `id` is indexed on every
/// table; further columns come from configuration.
///

#[derive(Debug)]
pub struct IndexManager {
    declared: BTreeMap<String, BTreeSet<String>>,
    built: RefCell<HashMap<String, HashMap<String, ColumnIndex>>>,
    enabled: Cell<bool>,
}

impl IndexManager {
    #[must_use]
    pub fn new(declared: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self {
            declared,
            built: RefCell::new(HashMap::new()),
            enabled: Cell::new(true),
        }
    }

    /// Whether `column` of `table` is a known index column.
    #[must_use]
    pub fn is_declared(&self, table: &str, column: &str) -> bool {
        column == ID_FIELD
            || self
                .declared
                .get(table)
                .is_some_and(|columns| columns.contains(column))
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Turn index use on or off. Disabling drops every built index.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        if !enabled {
            self.built.borrow_mut().clear();
        }
    }

    /// Whether a built, non-stale index exists for the pair.
    #[must_use]
    pub fn is_fresh(&self, table: &str, column: &str) -> bool {
        self.built
            .borrow()
            .get(table)
            .is_some_and(|columns| columns.contains_key(column))
    }

    /// Build the index if it is missing or stale; idempotent when fresh.
    /// `load` is only called on a rebuild, and a failed load leaves the
    /// index absent.
    pub fn ensure_index<E>(
        &self,
        table: &str,
        column: &str,
        load: impl FnOnce() -> Result<Collection, E>,
    ) -> Result<IndexStatus, E> {
        if self.is_fresh(table, column) {
            return Ok(IndexStatus::Fresh);
        }

        let rows = load()?;
        let index = ColumnIndex::build(column, &rows);
        self.built
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), index);

        Ok(IndexStatus::Rebuilt { rows: rows.len() })
    }

    /// Records whose `column` equals `key`, in collection order.
    /// `None` when no fresh index exists for the pair.
    #[must_use]
    pub fn lookup(&self, table: &str, column: &str, key: &IndexKey) -> Option<Vec<Record>> {
        let built = self.built.borrow();
        let index = built.get(table)?.get(column)?;

        Some(index.entries.get(key).cloned().unwrap_or_default())
    }

    /// Mark every index of `table` stale.
    pub fn invalidate(&self, table: &str) {
        self.built.borrow_mut().remove(table);
    }
}

///
/// TESTS
///
