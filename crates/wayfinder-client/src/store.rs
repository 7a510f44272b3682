//! File-backed key-value storage.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use wayfinder_core::error::PersistenceError;
use wayfinder_core::history::KeyValueStore;

/// String values under string keys, kept as one JSON object in a single file.
///
/// Writes go to a sibling temp file that is then renamed over the original,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.load()?.remove(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        let encoded = serde_json::to_string_pretty(&values)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, encoded)?;
        fs::rename(&temp, &self.path)?;
        tracing::debug!("Wrote {} to {}", key, self.path.display());
        Ok(())
    }
}
