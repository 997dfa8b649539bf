//! Input validation utilities.
//!
//! This module contains functions for validating inputs before they are used to
//! address persisted state.

use crate::constants::MAX_STORAGE_KEY_LEN;
use crate::{PersistenceError, PersistenceResult};

/// Validates that a storage key is safe to use as a file stem.
///
/// The on-disk key-value store maps each key to `<data_dir>/<key>.json`, so keys must not
/// be able to escape the data directory or name hidden files:
/// - Rejects empty or whitespace-only strings
/// - Bounds the length to avoid pathological inputs
/// - Restricts characters to ASCII alphanumerics, `.`, `-` and `_`
/// - Rejects a leading `.`
///
/// # Errors
///
/// Returns `PersistenceError::InvalidKey` if the key is invalid.
pub fn validate_storage_key(key: &str) -> PersistenceResult<()> {
    if key.trim().is_empty() {
        return Err(PersistenceError::InvalidKey(
            "storage key cannot be empty".into(),
        ));
    }

    if key.len() > MAX_STORAGE_KEY_LEN {
        return Err(PersistenceError::InvalidKey(format!(
            "storage key exceeds maximum length of {} characters",
            MAX_STORAGE_KEY_LEN
        )));
    }

    if key.starts_with('.') {
        return Err(PersistenceError::InvalidKey(
            "storage key must not start with '.'".into(),
        ));
    }

    let ok = key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(PersistenceError::InvalidKey(format!(
            "storage key {key:?} contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
        )));
    }

    Ok(())
}
