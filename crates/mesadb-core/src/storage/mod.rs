//! Durable blob storage: a flat namespace of string keys, each holding
//! one serialized collection.
//!
//! This is the only "disk" in the system. Everything above it treats a
//! key as the unit of atomicity: a `set` either replaces the whole value
//! or leaves the previous one in place.

pub mod codec;
mod file;
mod memory;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use convert_case::{Case, Casing};
use thiserror::Error as ThisError;

///
/// StorageError
///

#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("i/o error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidKey(_) => ErrorClass::Invalid,
            Self::QuotaExceeded { .. } | Self::Unavailable(_) | Self::Io { .. } => {
                ErrorClass::Internal
            }
        }
    }
}

impl From<StorageError> for InternalError {
    fn from(err: StorageError) -> Self {
        Self::new(err.class(), ErrorOrigin::Storage, err.to_string())
    }
}

///
/// BlobStore
///
/// Synchronous get/set/remove primitive. Implementations use interior
/// mutability; the store is single-threaded and run-to-completion.
///

pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, in ascending order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Canonical table name. Spellings that normalize alike name one table.
#[must_use]
pub fn table_name(raw: &str) -> String {
    raw.to_case(Case::Snake)
}

/// Durable key for a table: `<namespace>_<table>`, both parts snake_cased.
#[must_use]
pub fn storage_key(namespace: &str, table: &str) -> String {
    format!("{}_{}", namespace.to_case(Case::Snake), table_name(table))
}

/// Inverse of [`storage_key`] for listing: the table part of `key` when
/// it lives under `namespace`.
#[must_use]
pub fn table_from_key<'a>(namespace: &str, key: &'a str) -> Option<&'a str> {
    let prefix = format!("{}_", namespace.to_case(Case::Snake));

    key.strip_prefix(prefix.as_str()).filter(|t| !t.is_empty())
}

///
/// TESTS
///
