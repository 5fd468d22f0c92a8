use crate::value::Value;
use derive_more::{Deref, DerefMut, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field holding the primary id of every record.
pub const ID_FIELD: &str = "id";

/// Insert timestamp, RFC 3339 UTC.
pub const CREATED_AT_FIELD: &str = "created_at";

/// Last-write timestamp, RFC 3339 UTC.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Fields the store manages on every table, schema or not.
pub const SYSTEM_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

///
/// Record
///
/// One schema-less row: an ordered map of field name to value.
///

#[derive(
    Clone, Debug, Default, Deref, DerefMut, Deserialize, IntoIterator, PartialEq, Serialize,
)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.0.get(ID_FIELD)
    }

    #[must_use]
    pub fn created_at(&self) -> Option<&str> {
        self.0.get(CREATED_AT_FIELD).and_then(Value::as_text)
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<&str> {
        self.0.get(UPDATED_AT_FIELD).and_then(Value::as_text)
    }

    /// Shallow merge: every field of `patch` overwrites the field here.
    pub fn merge(&mut self, patch: &Self) {
        for (field, value) in &patch.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Copy of this record restricted to `columns`. Absent columns are
    /// skipped rather than materialized as null.
    #[must_use]
    pub fn project<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Self {
        columns
            .into_iter()
            .filter_map(|c| self.0.get(c).map(|v| (c.to_string(), v.clone())))
            .collect()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Map(record.0)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

///
/// Collection
/// The ordered records of one table, in persisted order.
///

pub type Collection = Vec<Record>;

///
/// TESTS
///
