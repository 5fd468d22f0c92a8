//! Table access layer.
//!
//! The only place that reads or writes a table's durable key. Each write
//! primitive is one read-modify-write: read the collection, change it in
//! memory, write it back with a single `set`, then invalidate the table's
//! indexes. A failed `set` leaves the previous collection in place.

use crate::{
    db::{
        Store,
        identity::Timestamp,
        index::IndexKey,
        query::{
            DeleteQuery, Filter, InsertQuery, InsertRows, Projection, SelectQuery, UpdateQuery,
        },
        record::{CREATED_AT_FIELD, Collection, ID_FIELD, Record, UPDATED_AT_FIELD},
    },
    error::InternalError,
    obs::{ExecKind, MetricsEvent},
    storage::codec,
    value::Value,
};
use std::collections::HashSet;

///
/// Table
///
/// Handle for one table of a store. Cheap to create; holds no data.
///

#[derive(Clone)]
pub struct Table<'a> {
    store: &'a Store,
    name: String,
}

impl<'a> Table<'a> {
    pub(crate) const fn new(store: &'a Store, name: String) -> Self {
        Self { store, name }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn store(&self) -> &'a Store {
        self.store
    }

    #[must_use]
    pub fn storage_key(&self) -> String {
        self.store.storage_key(&self.name)
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Start a read. `columns` is `*` or a comma-separated list.
    #[must_use]
    pub fn select(self, columns: &str) -> SelectQuery<'a> {
        SelectQuery::new(self, Projection::parse(columns))
    }

    #[must_use]
    pub fn insert(self, rows: impl Into<InsertRows>) -> InsertQuery<'a> {
        InsertQuery::new(self, rows.into())
    }

    #[must_use]
    pub const fn update(self, patch: Record) -> UpdateQuery<'a> {
        UpdateQuery::new(self, patch)
    }

    #[must_use]
    pub const fn delete(self) -> DeleteQuery<'a> {
        DeleteQuery::new(self)
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// The whole collection in persisted order. A missing key or a corrupt
    /// payload reads as empty; a failing blob store is an error.
    pub fn select_all(&self) -> Result<Collection, InternalError> {
        let key = self.storage_key();

        match self.store.blobs().get(&key)? {
            Some(text) => Ok(codec::decode(&key, &text)),
            None => {
                self.store
                    .debug_log(|| format!("table {}: no collection at '{key}'", self.name));
                Ok(Collection::new())
            }
        }
    }

    /// Append `records` with ids and timestamps filled in. Caller ids are
    /// kept; an id already present in the table or repeated within the
    /// batch rejects the whole batch.
    pub fn insert_records(&self, records: Vec<Record>) -> Result<Vec<Record>, InternalError> {
        self.record_start(ExecKind::Insert);
        for record in &records {
            self.store.schema().validate_insert(&self.name, record)?;
        }

        let mut rows = self.select_all()?;
        let now = Timestamp::now()?;
        let mut seen: HashSet<IndexKey> = rows
            .iter()
            .filter_map(|row| row.id().and_then(IndexKey::from_value))
            .collect();

        let mut inserted = Vec::with_capacity(records.len());
        for mut record in records {
            if record.id().is_none() {
                let id = self.store.next_id(now.millis);
                record.insert(ID_FIELD.to_string(), Value::Text(id.to_string()));
            }
            for field in [CREATED_AT_FIELD, UPDATED_AT_FIELD] {
                record
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Text(now.rfc3339.clone()));
            }

            let id = record.id().cloned().unwrap_or_default();
            if !IndexKey::from_value(&id).is_some_and(|key| seen.insert(key)) {
                tracing::error!(table = %self.name, %id, "duplicate id rejected");
                return Err(InternalError::table_invariant(format!(
                    "duplicate id {id} in table '{}'",
                    self.name
                )));
            }

            inserted.push(record);
        }

        rows.extend(inserted.iter().cloned());
        self.write_back(&rows)?;
        self.record_finish(ExecKind::Insert, inserted.len());

        Ok(inserted)
    }

    /// Merge `patch` into every row matching `filter` and refresh its
    /// `updated_at`. Returns exactly the updated rows.
    pub fn update_matching(
        &self,
        filter: &Filter,
        patch: &Record,
    ) -> Result<Vec<Record>, InternalError> {
        self.record_start(ExecKind::Update);
        Self::require_filter(filter, "update")?;
        self.store.schema().validate_patch(&self.name, patch)?;

        let mut rows = self.select_all()?;
        let now = Timestamp::now()?;
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            row.merge(patch);
            row.insert(
                UPDATED_AT_FIELD.to_string(),
                Value::Text(now.rfc3339.clone()),
            );
            updated.push(row.clone());
        }

        if updated.is_empty() {
            self.store.indexes().invalidate(&self.name);
        } else {
            self.write_back(&rows)?;
        }
        self.record_finish(ExecKind::Update, updated.len());

        Ok(updated)
    }

    /// Remove every row matching `filter`; returns the number removed.
    pub fn delete_matching(&self, filter: &Filter) -> Result<usize, InternalError> {
        self.record_start(ExecKind::Delete);
        Self::require_filter(filter, "delete")?;

        let mut rows = self.select_all()?;
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));
        let removed = before - rows.len();

        if removed == 0 {
            self.store.indexes().invalidate(&self.name);
        } else {
            self.write_back(&rows)?;
        }
        self.record_finish(ExecKind::Delete, removed);

        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_filter(filter: &Filter, op: &str) -> Result<(), InternalError> {
        if filter.is_empty() {
            return Err(InternalError::table_unsupported(format!(
                "{op} without a filter is not supported"
            )));
        }

        Ok(())
    }

    // One `set` for the whole collection. Indexes are invalidated whether
    // or not the write lands.
    fn write_back(&self, rows: &[Record]) -> Result<(), InternalError> {
        let key = self.storage_key();
        let result = codec::encode(rows)
            .map_err(InternalError::from)
            .and_then(|text| {
                self.store
                    .blobs()
                    .set(&key, &text)
                    .map_err(InternalError::from)
            });
        self.store.indexes().invalidate(&self.name);

        if let Err(err) = &result {
            self.store.record(MetricsEvent::WriteFailed { table: &self.name });
            tracing::warn!(table = %self.name, key = %key, error = %err, "write-back failed");
        }

        result
    }

    fn record_start(&self, kind: ExecKind) {
        self.store.record(MetricsEvent::ExecStart {
            kind,
            table: &self.name,
        });
    }

    fn record_finish(&self, kind: ExecKind, rows: usize) {
        self.store.record(MetricsEvent::ExecFinish {
            kind,
            table: &self.name,
            rows: rows as u64,
        });
        self.store
            .debug_log(|| format!("{kind:?} {}: {rows} row(s)", self.name));
    }
}
