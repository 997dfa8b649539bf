//! Key-value persistence boundary.
//!
//! The session store mirrors its saved results into a [`KeyValueStore`] as a single JSON
//! document under a fixed key. Two backends are provided:
//!
//! - [`MemoryKeyValueStore`] keeps entries in process memory (tests, ephemeral sessions)
//! - [`FileKeyValueStore`] keeps one `<key>.json` file per entry in a data directory
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   labdiag_results.json    # JSON array of saved results
//! ```

use crate::constants::STORE_FILE_EXTENSION;
use crate::validation::validate_storage_key;
use crate::PersistenceResult;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key is absent.
    fn get(&self, key: &str) -> PersistenceResult<Option<String>>;

    /// Stores `value`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()>;

    /// Removes the key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> PersistenceResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-per-key store rooted at a data directory.
///
/// The directory is created on the first write. Writes go to a temporary sibling file
/// which is then renamed over the target, so readers never observe a half-written entry.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PersistenceResult<PathBuf> {
        validate_storage_key(key)?;
        Ok(self.root.join(format!("{key}.{STORE_FILE_EXTENSION}")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> PersistenceResult<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> PersistenceResult<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.root)?;

        let tmp = path.with_extension(format!("{STORE_FILE_EXTENSION}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PersistenceResult<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
