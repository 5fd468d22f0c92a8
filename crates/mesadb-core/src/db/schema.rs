use crate::{
    db::record::{ID_FIELD, Record, SYSTEM_FIELDS},
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("unknown field '{field}' for table '{table}'")]
    UnknownField { table: String, field: String },

    #[error("field 'id' of table '{table}' must be text or an integer")]
    InvalidId { table: String },

    #[error("update patch for table '{table}' may not change 'id'")]
    IdChange { table: String },
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Schema, err.to_string())
    }
}

///
/// Schema
///
/// Optional per-table field sets. A table with no entry is open: any
/// field is accepted. A table with an entry accepts its declared fields
/// plus the system fields.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl Schema {
    #[must_use]
    pub const fn new(tables: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { tables }
    }

    #[must_use]
    pub fn fields(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(table)
    }

    /// Whether `field` may appear on `table`.
    #[must_use]
    pub fn allows(&self, table: &str, field: &str) -> bool {
        SYSTEM_FIELDS.contains(&field)
            || self
                .tables
                .get(table)
                .is_none_or(|fields| fields.contains(field))
    }

    /// Check a record about to be inserted.
    pub fn validate_insert(&self, table: &str, record: &Record) -> Result<(), SchemaError> {
        if let Some(id) = record.id()
            && !matches!(id, Value::Text(_) | Value::Int(_))
        {
            return Err(SchemaError::InvalidId {
                table: table.to_string(),
            });
        }

        self.check_fields(table, record)
    }

    /// Check an update patch.
    pub fn validate_patch(&self, table: &str, patch: &Record) -> Result<(), SchemaError> {
        if patch.contains_key(ID_FIELD) {
            return Err(SchemaError::IdChange {
                table: table.to_string(),
            });
        }

        self.check_fields(table, patch)
    }

    fn check_fields(&self, table: &str, record: &Record) -> Result<(), SchemaError> {
        match record.keys().find(|field| !self.allows(table, field)) {
            Some(field) => Err(SchemaError::UnknownField {
                table: table.to_string(),
                field: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

///
/// TESTS
///
