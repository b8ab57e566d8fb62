//! Named model storage with version history

use super::record::ModelRecord;
use crate::error::{RbfError, Result};
use crate::inference::RbfClassifier;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Storage backend for trained classifiers.
///
/// Saving under an existing name appends a new version; loading returns the
/// most recent one.
pub trait ModelStore: Send + Sync {
    /// Append a new version of `name`.
    fn save(&self, name: &str, model: &RbfClassifier) -> Result<ModelRecord>;

    /// Every stored version of `name`, oldest first.
    fn history(&self, name: &str) -> Result<Vec<ModelRecord>>;

    /// Names with at least one stored version, sorted.
    fn names(&self) -> Result<Vec<String>>;

    /// Remove every stored model.
    fn clear(&self) -> Result<()>;

    /// Latest version of `name`, or [`RbfError::ModelNotFound`].
    fn load(&self, name: &str) -> Result<RbfClassifier> {
        latest(self.history(name)?)
            .ok_or_else(|| RbfError::ModelNotFound(name.to_string()))?
            .to_classifier()
    }
}

/// Newest record by creation time; later entries win ties.
fn latest(records: Vec<ModelRecord>) -> Option<ModelRecord> {
    records.into_iter().max_by_key(|r| r.created_at)
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<String, Vec<ModelRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelStore for InMemoryStore {
    fn save(&self, name: &str, model: &RbfClassifier) -> Result<ModelRecord> {
        let record = ModelRecord::new(name, model);
        self.records
            .write()
            .entry(name.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn history(&self, name: &str) -> Result<Vec<ModelRecord>> {
        Ok(self.records.read().get(name).cloned().unwrap_or_default())
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn clear(&self) -> Result<()> {
        self.records.write().clear();
        Ok(())
    }
}

/// Directory-backed store: one JSON file per model name holding its history
#[derive(Debug)]
pub struct LocalStore {
    base_dir: PathBuf,
    /// Serializes read-modify-write cycles on the history files
    write_lock: RwLock<()>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: RwLock::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn is_model_name(name: &str) -> bool {
        !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    fn model_file(&self, name: &str) -> Result<PathBuf> {
        if !Self::is_model_name(name) {
            return Err(RbfError::invalid(
                "name",
                name,
                "model names may only contain letters, digits, '_', '-' and '.'",
            ));
        }
        Ok(self.base_dir.join(format!("{}.json", name)))
    }

    /// `(name, path)` for each `*.json` file whose stem is a valid model name.
    fn model_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if Self::is_model_name(stem) => stem.to_string(),
                _ => continue,
            };
            files.push((name, path));
        }
        Ok(files)
    }

    fn read_history(path: &Path) -> Result<Vec<ModelRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl ModelStore for LocalStore {
    fn save(&self, name: &str, model: &RbfClassifier) -> Result<ModelRecord> {
        let path = self.model_file(name)?;
        let _guard = self.write_lock.write();

        let mut history = Self::read_history(&path)?;
        let record = ModelRecord::new(name, model);
        history.push(record.clone());

        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &history)?;

        info!(name, versions = history.len(), path = %path.display(), "model saved");
        Ok(record)
    }

    fn history(&self, name: &str) -> Result<Vec<ModelRecord>> {
        let path = self.model_file(name)?;
        let _guard = self.write_lock.read();
        Self::read_history(&path)
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .model_files()?
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Removes every stored model file. JSON files whose stem is not a valid
    /// model name were not written by the store and are left in place.
    fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.write();
        for (_, path) in self.model_files()? {
            fs::remove_file(&path)?;
            debug!(path = %path.display(), "removed model file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::NormalizationStats;
    use crate::training::RbfNetwork;
    use ndarray::array;

    fn classifier(bias: f64) -> RbfClassifier {
        let network =
            RbfNetwork::from_parts(array![[0.0, 1.0]], array![1.0], array![0.5], bias).unwrap();
        let stats = NormalizationStats::from_parts(array![0.0, 0.0], array![1.0, 1.0]).unwrap();
        RbfClassifier::new(network, stats).unwrap()
    }

    #[test]
    fn test_memory_store_latest_wins() {
        let store = InMemoryStore::new();
        store.save("m", &classifier(0.1)).unwrap();
        store.save("m", &classifier(0.2)).unwrap();
        assert_eq!(store.history("m").unwrap().len(), 2);
        assert_eq!(store.load("m").unwrap().network().bias(), 0.2);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(store.load("nope"), Err(RbfError::ModelNotFound(_))));
    }

    #[test]
    fn test_memory_store_clear() {
        let store = InMemoryStore::new();
        store.save("b", &classifier(0.0)).unwrap();
        store.save("a", &classifier(0.0)).unwrap();
        assert_eq!(store.names().unwrap(), vec!["a", "b"]);
        store.clear().unwrap();
        assert!(store.names().unwrap().is_empty());
    }

    #[test]
    fn test_local_store_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        assert!(store.save("../escape", &classifier(0.0)).is_err());
        assert!(store.save("", &classifier(0.0)).is_err());
    }

    #[test]
    fn test_local_store_skips_foreign_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path()).unwrap();
        store.save("a", &classifier(0.0)).unwrap();
        store.save("z", &classifier(0.0)).unwrap();
        fs::write(dir.path().join("my model.json"), "[]").unwrap();
        fs::write(dir.path().join(".hidden.json"), "[]").unwrap();

        assert_eq!(store.names().unwrap(), vec!["a", "z"]);
        store.clear().unwrap();
        assert!(store.names().unwrap().is_empty());
        assert!(matches!(store.load("z"), Err(RbfError::ModelNotFound(_))));
        assert!(dir.path().join("my model.json").exists());
    }
}
