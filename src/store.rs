//! Persistence boundary: one JSON document per map id.
//!
//! The host's key-value store sits behind [`MapStore`]. Two stores ship with
//! the crate: [`MemoryStore`] for tests and embedding, and [`FileStore`],
//! which keeps `<map_id>.json` files in a directory and backs the CLI.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid map id: {0:?}")]
    InvalidMapId(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub trait MapStore {
    /// Raw stored JSON for `map_id`, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the store cannot be read.
    fn load(&self, map_id: &str) -> Result<Option<String>, StoreError>;

    /// Replace the stored JSON for `map_id`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the write did not happen.
    fn save(&mut self, map_id: &str, json: &str) -> Result<(), StoreError>;
}

/// Map ids become file names, so keep them to a safe alphabet.
fn validate_map_id(map_id: &str) -> Result<(), StoreError> {
    let valid = !map_id.is_empty()
        && map_id.len() <= 128
        && map_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid { Ok(()) } else { Err(StoreError::InvalidMapId(map_id.to_owned())) }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    maps: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored document.
    pub fn insert(&mut self, map_id: impl Into<String>, json: impl Into<String>) {
        self.maps.insert(map_id.into(), json.into());
    }

    #[must_use]
    pub fn get(&self, map_id: &str) -> Option<&str> {
        self.maps.get(map_id).map(String::as_str)
    }
}

impl MapStore for MemoryStore {
    fn load(&self, map_id: &str) -> Result<Option<String>, StoreError> {
        validate_map_id(map_id)?;
        Ok(self.maps.get(map_id).cloned())
    }

    fn save(&mut self, map_id: &str, json: &str) -> Result<(), StoreError> {
        validate_map_id(map_id)?;
        self.maps.insert(map_id.to_owned(), json.to_owned());
        Ok(())
    }
}

/// Stores each map as `<dir>/<map_id>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, map_id: &str) -> Result<PathBuf, StoreError> {
        validate_map_id(map_id)?;
        Ok(self.dir.join(format!("{map_id}.json")))
    }
}

impl MapStore for FileStore {
    fn load(&self, map_id: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(map_id)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Writes to a temporary file and renames it over the old one, so a
    /// failed write never leaves a half-written map behind.
    fn save(&mut self, map_id: &str, json: &str) -> Result<(), StoreError> {
        let path = self.path_for(map_id)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = self.dir.join(format!(".{map_id}.json.tmp"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = json.len(), "map written");
        Ok(())
    }
}
