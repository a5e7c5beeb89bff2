//! Key/value storage collaborator.
//!
//! The form persists snapshots through an abstract [`Storage`] capability. The
//! core never names a concrete backend; it only records, via the
//! `localStorage` field of a log entry, that a read or write happened and
//! under which key.
//!
//! # Implementations
//!
//! - `InMemoryStorage` (in `formlog-testing`): `HashMap` behind a read-write lock
//! - `FailingStorage` (in `formlog-testing`): always errors, for failure paths

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for `StorageKey` parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid storage key: {0}")]
pub struct ParseStorageKeyError(String);

/// Name of a storage slot, e.g. `"formData"`.
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty or blank strings)
/// - `From::from()` and `new()`: No validation (for application-controlled keys)
///
/// # Examples
///
/// ```
/// use formlog_core::storage::StorageKey;
///
/// let key = StorageKey::new("formData");
/// assert_eq!(key.as_str(), "formData");
///
/// assert!("".parse::<StorageKey>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Create a new `StorageKey` from a string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the key into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StorageKey {
    type Err = ParseStorageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseStorageKeyError(
                "Storage key cannot be empty".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for StorageKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur during storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backend cannot be reached at all.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed a specific operation.
    #[error("Storage error for key {key}: {message}")]
    Backend {
        /// Key being read or written
        key: StorageKey,
        /// Backend-specific description
        message: String,
    },
}

/// Abstract key/value capability, modelled on browser `localStorage`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store holding
/// `Arc<dyn Storage>` can be shared across threads.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails. A missing key is `Ok(None)`.
    fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    fn set(&self, key: &StorageKey, value: String) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn get(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &StorageKey, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}
