//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core.
//! Nothing in this crate reads environment variables while handling a request.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_RESULTS_KEY};
use crate::validation::validate_storage_key;
use crate::{SessionError, SessionResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    results_key: String,
    seed_demo_accounts: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Validation` if `results_key` is not a safe storage key.
    pub fn new(
        data_dir: PathBuf,
        results_key: impl Into<String>,
        seed_demo_accounts: bool,
    ) -> SessionResult<Self> {
        let results_key = results_key.into();
        validate_storage_key(&results_key)
            .map_err(|e| SessionError::Validation(e.to_string()))?;

        Ok(Self {
            data_dir,
            results_key,
            seed_demo_accounts,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn results_key(&self) -> &str {
        &self.results_key
    }

    pub fn seed_demo_accounts(&self) -> bool {
        self.seed_demo_accounts
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            results_key: DEFAULT_RESULTS_KEY.to_owned(),
            seed_demo_accounts: true,
        }
    }
}

/// Parse a boolean flag from an optional environment value.
///
/// `None` or empty/whitespace yields `default`. Accepts `true/false`, `1/0`, `yes/no`
/// and `on/off`, case-insensitively.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> SessionResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(SessionError::Validation(format!(
            "expected a boolean flag, got {other:?}"
        ))),
    }
}
