//! The embedded document store.
//!
//! A [`Store`] owns every piece of per-instance state: blob store,
//! indexes, id generator, session, procedures and counters. Nothing is
//! process-global, so isolated stores coexist freely in one process.
//!
//! Two stores sharing one blob store do not coordinate: each write is a
//! whole-collection read-modify-write, and the later writer wins.

pub(crate) mod identity;
pub mod index;
pub mod query;
pub mod record;
pub mod schema;
pub mod table;

#[cfg(test)]
mod tests;

use crate::{
    auth::{Auth, CredentialVerifier, DevCredential, PasswordHashVerifier, Session},
    config::StoreConfig,
    db::{identity::IdGenerator, index::IndexManager, schema::Schema, table::Table},
    error::InternalError,
    obs::{MetricsEvent, MetricsReport, MetricsSink},
    rpc::RpcRegistry,
    storage::{self, BlobStore, MemoryBlobStore},
    value::Value,
};
use std::cell::{Cell, RefCell};
use ulid::Ulid;

///
/// Store
///

pub struct Store {
    config: StoreConfig,
    blobs: Box<dyn BlobStore>,
    schema: Schema,
    indexes: IndexManager,
    ids: RefCell<IdGenerator>,
    session: RefCell<Option<Session>>,
    verifier: Box<dyn CredentialVerifier>,
    rpc: RpcRegistry,
    metrics: RefCell<MetricsReport>,
    sink: Option<Box<dyn MetricsSink>>,
    debug: Cell<bool>,
}

impl Store {
    /// Open a store over `blobs`, restoring any persisted session.
    pub fn open(config: StoreConfig, blobs: impl BlobStore + 'static) -> Result<Self, InternalError> {
        config.validate()?;

        let verifier: Box<dyn CredentialVerifier> = match &config.dev_credential {
            Some(secret) => Box::new(DevCredential::new(secret.clone())),
            None => Box::new(PasswordHashVerifier),
        };
        let store = Self {
            schema: Schema::new(config.tables_by_name()),
            indexes: IndexManager::new(config.indexes_by_name()),
            ids: RefCell::new(IdGenerator::new()),
            session: RefCell::new(None),
            verifier,
            rpc: RpcRegistry::with_builtins(),
            metrics: RefCell::new(MetricsReport::default()),
            sink: None,
            debug: Cell::new(config.debug),
            blobs: Box::new(blobs),
            config,
        };
        store.restore_session()?;

        Ok(store)
    }

    /// Default-configured store over a private in-memory blob store.
    pub fn in_memory() -> Result<Self, InternalError> {
        Self::open(StoreConfig::default(), MemoryBlobStore::new())
    }

    /// Replace the credential check used by sign-in.
    #[must_use]
    pub fn with_verifier(mut self, verifier: impl CredentialVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Forward every metrics event to `sink` as well.
    #[must_use]
    pub fn with_metrics_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    // ------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------

    /// Table handle. The name is snake_cased, so `orderItems` and
    /// `order_items` are the same table.
    #[must_use]
    pub fn from(&self, table: impl Into<String>) -> Table<'_> {
        Table::new(self, storage::table_name(&table.into()))
    }

    #[must_use]
    pub const fn auth(&self) -> Auth<'_> {
        Auth::new(self)
    }

    /// Call a named procedure. Unknown names are an `Unsupported` error.
    pub fn rpc(&self, name: &str, params: &Value) -> Result<Value, InternalError> {
        self.debug_log(|| format!("rpc {name}"));
        self.rpc.call(self, name, params)
    }

    pub fn register_rpc<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Self, &Value) -> Result<Value, InternalError> + 'static,
    {
        self.rpc.register(name, handler);
    }

    /// Tables that currently have a persisted collection.
    pub fn tables(&self) -> Result<Vec<String>, InternalError> {
        let session_key = self.session_key();
        let tables = self
            .blobs
            .keys()?
            .iter()
            .filter(|key| **key != session_key)
            .filter_map(|key| storage::table_from_key(&self.config.namespace, key))
            .map(String::from)
            .collect();

        Ok(tables)
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Turn executor traces on. Returns `self` for chaining at call sites.
    pub fn debug(&self) -> &Self {
        self.debug.set(true);
        self
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.set(debug);
    }

    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug.get()
    }

    #[must_use]
    pub fn metrics_report(&self) -> MetricsReport {
        self.metrics.borrow().clone()
    }

    pub fn metrics_reset(&self) {
        *self.metrics.borrow_mut() = MetricsReport::default();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub const fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn rpc_registry(&self) -> &RpcRegistry {
        &self.rpc
    }

    pub(crate) fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub(crate) fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    pub(crate) fn storage_key(&self, table: &str) -> String {
        storage::storage_key(&self.config.namespace, table)
    }

    pub(crate) fn next_id(&self, millis: u64) -> Ulid {
        self.ids.borrow_mut().next_id(millis)
    }

    pub(crate) fn record(&self, event: MetricsEvent<'_>) {
        self.metrics.borrow_mut().apply(&event);
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }

    pub(crate) fn debug_log(&self, message: impl FnOnce() -> String) {
        if self.debug.get() {
            tracing::debug!(target: "mesadb::exec", "{}", message());
        }
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    fn session_key(&self) -> String {
        self.storage_key(&self.config.session_key)
    }

    pub(crate) fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    // `None` clears. The in-memory session only changes once the blob
    // store accepted the write.
    pub(crate) fn persist_session(&self, session: Option<&Session>) -> Result<(), InternalError> {
        let key = self.session_key();
        match session {
            Some(session) => {
                let text = serde_json::to_string(session).map_err(|err| {
                    InternalError::storage_internal(format!("session encode: {err}"))
                })?;
                self.blobs.set(&key, &text)?;
            }
            None => self.blobs.remove(&key)?,
        }
        *self.session.borrow_mut() = session.cloned();

        Ok(())
    }

    fn restore_session(&self) -> Result<(), InternalError> {
        let key = self.session_key();
        let Some(text) = self.blobs.get(&key)? else {
            return Ok(());
        };

        match serde_json::from_str::<Session>(&text) {
            Ok(session) => *self.session.borrow_mut() = Some(session),
            Err(err) => tracing::warn!(key = %key, error = %err, "discarding corrupt session"),
        }

        Ok(())
    }
}

