//! Named procedures with no table-level equivalent.

mod builtins;

use crate::{
    db::Store,
    error::{ErrorClass, ErrorOrigin, InternalError},
    value::Value,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// RpcError
///

#[derive(Debug, ThisError)]
pub enum RpcError {
    #[error("rpc '{name}' is not implemented")]
    NotImplemented { name: String },
}

impl From<RpcError> for InternalError {
    fn from(err: RpcError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Rpc, err.to_string())
    }
}

/// A procedure body. Handlers run against the calling store.
pub type RpcHandler = Box<dyn Fn(&Store, &Value) -> Result<Value, InternalError>>;

///
/// RpcRegistry
///

pub struct RpcRegistry {
    handlers: BTreeMap<String, RpcHandler>,
}

impl RpcRegistry {
    /// Registry with no procedures at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Registry preloaded with `dashboard_stats` and `check_in_reservation`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(builtins::DASHBOARD_STATS, builtins::dashboard_stats);
        registry.register(builtins::CHECK_IN_RESERVATION, builtins::check_in_reservation);

        registry
    }

    /// Add or replace a procedure.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Store, &Value) -> Result<Value, InternalError> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub(crate) fn call(
        &self,
        store: &Store,
        name: &str,
        params: &Value,
    ) -> Result<Value, InternalError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| RpcError::NotImplemented {
                name: name.to_string(),
            })?;

        handler(store, params)
    }
}

impl Default for RpcRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
