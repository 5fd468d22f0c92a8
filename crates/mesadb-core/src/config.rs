use crate::{
    db::record::{ID_FIELD, SYSTEM_FIELDS},
    error::{ErrorClass, ErrorOrigin, InternalError},
    storage,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

/// Default durable key prefix.
pub const DEFAULT_NAMESPACE: &str = "mesa";

/// Default key suffix for the persisted session.
pub const DEFAULT_SESSION_KEY: &str = "session";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("session key must not be empty")]
    EmptySessionKey,

    #[error("index on '{table}.{column}' names a field the table does not declare")]
    UndeclaredIndexColumn { table: String, column: String },

    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorClass::Invalid, ErrorOrigin::Config, err.to_string())
    }
}

///
/// StoreConfig
///
/// Everything a store instance needs besides its blob store.
/// Deserializes from JSON; absent keys take their defaults.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Durable key prefix: tables live at `<namespace>_<table>`.
    pub namespace: String,

    /// The session lives at `<namespace>_<session_key>`.
    pub session_key: String,

    /// Indexed columns per table. `id` is always indexed.
    pub indexes: BTreeMap<String, BTreeSet<String>>,

    /// Declared field sets; tables missing here are schema-less.
    pub tables: BTreeMap<String, BTreeSet<String>>,

    /// Fixed development password. When unset, sign-in verifies the
    /// user's stored `password_hash` instead.
    pub dev_credential: Option<String>,

    pub debug: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            indexes: default_indexes(),
            tables: BTreeMap::new(),
            dev_credential: None,
            debug: false,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&text)
    }

    /// Index an additional column.
    #[must_use]
    pub fn with_index(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.indexes
            .entry(table.into())
            .or_default()
            .insert(column.into());
        self
    }

    /// Declare the field set of a table.
    #[must_use]
    pub fn with_table<I, S>(mut self, table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables
            .insert(table.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_dev_credential(mut self, secret: impl Into<String>) -> Self {
        self.dev_credential = Some(secret.into());
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.session_key.trim().is_empty() {
            return Err(ConfigError::EmptySessionKey);
        }

        let tables = self.tables_by_name();
        for (table, columns) in self.indexes_by_name() {
            let Some(fields) = tables.get(&table) else {
                continue;
            };
            if let Some(column) = columns
                .iter()
                .find(|c| !fields.contains(*c) && !SYSTEM_FIELDS.contains(&c.as_str()))
            {
                return Err(ConfigError::UndeclaredIndexColumn {
                    table,
                    column: column.clone(),
                });
            }
        }

        Ok(())
    }

    /// Declared field sets keyed by canonical table name.
    pub(crate) fn tables_by_name(&self) -> BTreeMap<String, BTreeSet<String>> {
        by_table_name(&self.tables)
    }

    /// Index columns keyed by canonical table name.
    pub(crate) fn indexes_by_name(&self) -> BTreeMap<String, BTreeSet<String>> {
        by_table_name(&self.indexes)
    }
}

// Spellings of one table merge their column sets.
fn by_table_name(map: &BTreeMap<String, BTreeSet<String>>) -> BTreeMap<String, BTreeSet<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (table, columns) in map {
        out.entry(storage::table_name(table))
            .or_default()
            .extend(columns.iter().cloned());
    }

    out
}

/// Index columns for the restaurant tables: ids, status enums and
/// foreign keys.
#[must_use]
pub fn default_indexes() -> BTreeMap<String, BTreeSet<String>> {
    const DEFAULTS: &[(&str, &[&str])] = &[
        ("categories", &[]),
        ("menu_items", &["category_id"]),
        ("order_items", &["order_id", "menu_item_id"]),
        ("orders", &["status", "table_id"]),
        ("payments", &["order_id", "status"]),
        ("reservations", &["status", "table_id"]),
        ("tables", &["status"]),
        ("users", &["email"]),
    ];

    DEFAULTS
        .iter()
        .map(|(table, columns)| {
            let columns = std::iter::once(ID_FIELD)
                .chain(columns.iter().copied())
                .map(String::from)
                .collect();
            ((*table).to_string(), columns)
        })
        .collect()
}

///
/// TESTS
///
