use crate::storage::{BlobStore, StorageError};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

///
/// MemoryBlobStore
///
/// In-process blob store. Clones share the same underlying map, which is
/// how two store instances can be pointed at "the same disk".
///
/// An optional byte quota mimics the host storage limit; a `set` that
/// would exceed it fails and leaves the previous value untouched.
///

#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total stored bytes (keys plus values).
    #[must_use]
    pub const fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Total bytes currently held (keys plus values).
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let current = self.inner.borrow().get(key).map_or(0, |v| key.len() + v.len());
            let used = self.used_bytes() - current;
            let needed = key.len() + value.len();

            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }

        self.inner
            .borrow_mut()
            .insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().remove(key);

        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.borrow().keys().cloned().collect())
    }
}

///
/// TESTS
///
