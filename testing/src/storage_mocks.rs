//! In-memory storage doubles
//!
//! - [`InMemoryStorage`]: `HashMap`-backed stand-in for `localStorage`
//! - [`FailingStorage`]: every call fails, for error-path tests

use formlog_core::storage::{Storage, StorageError, StorageKey};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory key/value storage for fast, deterministic testing.
///
/// Clones share the same underlying map, so a test can keep a handle while
/// the store under test owns another.
///
/// # Example
///
/// ```
/// use formlog_testing::InMemoryStorage;
/// use formlog_core::storage::{Storage, StorageKey};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = InMemoryStorage::new();
/// let key = StorageKey::new("formData");
///
/// storage.set(&key, "{}".to_string())?;
/// assert_eq!(storage.get(&key)?, Some("{}".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl InMemoryStorage {
    /// Create a new empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-filled with one value
    #[must_use]
    pub fn with_value(key: StorageKey, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage
            .data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
        storage
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove everything (for test isolation)
    pub fn clear(&self) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self
            .data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &StorageKey, value: String) -> Result<(), StorageError> {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), value);
        Ok(())
    }
}

/// Storage whose every operation fails with [`StorageError::Unavailable`].
#[derive(Clone, Debug)]
pub struct FailingStorage {
    reason: String,
}

impl FailingStorage {
    /// Create a failing storage reporting `reason`
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Storage for FailingStorage {
    fn get(&self, _key: &StorageKey) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }

    fn set(&self, _key: &StorageKey, _value: String) -> Result<(), StorageError> {
        Err(StorageError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_data() {
        let storage = InMemoryStorage::new();
        let handle = storage.clone();
        let key = StorageKey::new("formData");

        storage.set(&key, "v1".to_string()).unwrap();
        storage.set(&key, "v2".to_string()).unwrap();

        assert_eq!(handle.get(&key).unwrap(), Some("v2".to_string()));
        assert_eq!(handle.len(), 1);

        handle.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn missing_key_is_none() {
        let storage = InMemoryStorage::with_value(StorageKey::new("a"), "1");
        assert_eq!(storage.get(&StorageKey::new("b")).unwrap(), None);
    }

    #[test]
    fn failing_storage_fails() {
        let storage = FailingStorage::new("disk full");
        let key = StorageKey::new("formData");
        assert_eq!(
            storage.set(&key, String::new()),
            Err(StorageError::Unavailable("disk full".to_string()))
        );
        assert!(storage.get(&key).is_err());
    }
}
