//! Session configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `FORMLOG_STORAGE_KEY` | `formData` | storage slot for the saved form |
//! | `FORMLOG_AUTOSAVE` | `true` | persist after every edit and reset |
//! | `RUST_LOG` | `info` | tracing filter for binaries |

use formlog_core::form::FormEnvironment;
use formlog_core::storage::StorageKey;
use serde::{Deserialize, Serialize};
use std::env;

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "formData";

/// Configuration of a form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage slot holding the saved form
    pub storage_key: StorageKey,
    /// Persist the form after every edit and reset
    pub autosave: bool,
    /// Log level / filter (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: StorageKey::new(DEFAULT_STORAGE_KEY),
            autosave: true,
            log_level: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// Missing or malformed values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            storage_key: lookup("FORMLOG_STORAGE_KEY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.storage_key),
            autosave: lookup("FORMLOG_AUTOSAVE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.autosave),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Reducer environment for this configuration
    #[must_use]
    pub fn environment(&self) -> FormEnvironment {
        FormEnvironment::new(self.storage_key.clone(), self.autosave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(SessionConfig::from_lookup(lookup(&[])), SessionConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("FORMLOG_STORAGE_KEY", "orderForm"),
            ("FORMLOG_AUTOSAVE", "false"),
            ("RUST_LOG", "debug"),
        ]));

        assert_eq!(config.storage_key, StorageKey::new("orderForm"));
        assert!(!config.autosave);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.environment(),
            FormEnvironment::new(StorageKey::new("orderForm"), false)
        );
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("FORMLOG_STORAGE_KEY", "  "),
            ("FORMLOG_AUTOSAVE", "sometimes"),
        ]));

        assert_eq!(config.storage_key, StorageKey::new(DEFAULT_STORAGE_KEY));
        assert!(config.autosave);
    }
}
