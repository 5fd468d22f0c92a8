use crate::{
    db::Store,
    storage::{BlobStore, MemoryBlobStore, StorageError},
};
use std::{cell::Cell, rc::Rc};

///
/// FailingBlobStore
///
/// Memory blob store that can be told to reject `set` calls, for
/// exercising write-back failure paths. Clones share both the contents
/// and the failure switch.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct FailingBlobStore {
    inner: MemoryBlobStore,
    fail_sets: Rc<Cell<bool>>,
    fail_gets: Rc<Cell<bool>>,
}

impl FailingBlobStore {
    pub(crate) fn fail_sets(&self, fail: bool) {
        self.fail_sets.set(fail);
    }

    pub(crate) fn fail_gets(&self, fail: bool) {
        self.fail_gets.set(fail);
    }

    pub(crate) fn raw(&self, key: &str) -> Option<String> {
        self.inner.get(key).ok().flatten()
    }

    pub(crate) fn put_raw(&self, key: &str, value: &str) {
        self.inner.set(key, value).expect("memory set");
    }
}

impl BlobStore for FailingBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_gets.get() {
            return Err(StorageError::Unavailable(format!("injected read failure on {key}")));
        }

        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_sets.get() {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                needed: value.len(),
                available: 0,
            });
        }

        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }
}

/// Store over a fresh failing blob store, returning the handle that
/// controls failures.
pub(crate) fn failing_store() -> (Store, FailingBlobStore) {
    let blobs = FailingBlobStore::default();
    let store = Store::open(crate::config::StoreConfig::default(), blobs.clone()).expect("open");

    (store, blobs)
}
