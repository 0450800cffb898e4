//! Dataset Collection - ordered registry of unique datasets

use crate::dataset::{DatasetInfo, InfoLoader};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One registered source dataset.
///
/// Identity is the source file path; metadata is loaded lazily and is
/// immutable until an explicit reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    path: PathBuf,
    info: Option<DatasetInfo>,
}

impl Dataset {
    /// Register a dataset by name and source path. Metadata is not loaded.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            info: None,
        }
    }

    /// Dataset name (unique within its collection).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source file path (the dataset's identity).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loaded metadata, if [`DatasetCollection::load_info`] has run.
    #[must_use]
    pub fn info(&self) -> Option<&DatasetInfo> {
        self.info.as_ref()
    }

    /// Whether metadata has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.info.is_some()
    }
}

/// Per-dataset outcome of a [`DatasetCollection::load_info`] call.
#[derive(Debug)]
pub struct LoadReport {
    /// Names of datasets whose metadata loaded successfully in this call
    pub loaded: Vec<String>,
    /// `(dataset name, error)` for each dataset that failed to load
    pub failures: Vec<(String, Error)>,
}

impl LoadReport {
    /// Whether every dataset in the collection loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// An ordered set of datasets, unique by name.
///
/// Created once per experiment; mutated only by add operations. Every run
/// spec references datasets by index into this collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetCollection {
    name: String,
    root: PathBuf,
    datasets: Vec<Dataset>,
    complete: bool,
}

impl DatasetCollection {
    /// Create an empty collection with a name and a root path for derived
    /// artifacts.
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            datasets: Vec::new(),
            complete: false,
        }
    }

    /// Collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root path for artifacts derived from this collection.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of registered datasets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether the collection has no datasets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Registered datasets in insertion order.
    #[must_use]
    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Get a dataset by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Dataset> {
        self.datasets.get(index)
    }

    /// Whether every dataset's metadata loaded on the last
    /// [`load_info`](Self::load_info) call.
    #[must_use]
    pub fn is_fully_loaded(&self) -> bool {
        self.complete
    }

    /// Register a dataset. Names must be unique within the collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDataset`] if a dataset with the same
    /// name is already registered.
    pub fn add_dataset(&mut self, dataset: Dataset) -> Result<usize> {
        if self.datasets.iter().any(|d| d.name == dataset.name) {
            return Err(Error::DuplicateDataset {
                name: dataset.name,
            });
        }
        self.datasets.push(dataset);
        Ok(self.datasets.len() - 1)
    }

    /// Load metadata for every dataset that has none yet.
    ///
    /// A failure loading one dataset is reported per-dataset; the rest of
    /// the collection still loads (partial success). The collection is
    /// flagged incomplete until a call succeeds for every dataset.
    pub fn load_info(&mut self, loader: &impl InfoLoader) -> LoadReport {
        let mut report = LoadReport {
            loaded: Vec::new(),
            failures: Vec::new(),
        };
        for dataset in &mut self.datasets {
            if dataset.info.is_some() {
                continue;
            }
            match loader.load_info(&dataset.path) {
                Ok(info) => {
                    debug!(dataset = %dataset.name, n_trials = info.n_trials, "loaded dataset metadata");
                    dataset.info = Some(info);
                    report.loaded.push(dataset.name.clone());
                }
                Err(e) => {
                    warn!(dataset = %dataset.name, error = %e, "failed to load dataset metadata");
                    report.failures.push((dataset.name.clone(), e));
                }
            }
        }
        self.complete = self.datasets.iter().all(Dataset::is_loaded);
        report
    }

    /// Drop loaded metadata for every dataset, forcing the next
    /// [`load_info`](Self::load_info) to re-read source files.
    pub fn reload(&mut self) {
        for dataset in &mut self.datasets {
            dataset.info = None;
        }
        self.complete = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::JsonInfoLoader;

    fn write_sidecar(dir: &Path, name: &str, n_trials: usize) -> PathBuf {
        let path = dir.join(format!("{name}.json"));
        let info = DatasetInfo {
            n_trials,
            timebase_ms: 1.0,
            subject: "j".to_string(),
            session: "s1".to_string(),
        };
        std::fs::write(&path, serde_json::to_vec(&info).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut coll = DatasetCollection::new("exp", "/tmp/exp");
        coll.add_dataset(Dataset::new("ds1", "/data/ds1.json")).unwrap();
        let result = coll.add_dataset(Dataset::new("ds1", "/data/other.json"));
        assert!(matches!(result, Err(Error::DuplicateDataset { .. })));
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_partial_load_flags_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_sidecar(dir.path(), "good", 50);

        let mut coll = DatasetCollection::new("exp", dir.path());
        coll.add_dataset(Dataset::new("good", good)).unwrap();
        coll.add_dataset(Dataset::new("missing", dir.path().join("missing.json")))
            .unwrap();

        let report = coll.load_info(&JsonInfoLoader);
        assert!(!report.is_complete());
        assert_eq!(report.loaded, vec!["good".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "missing");
        assert!(!coll.is_fully_loaded());
        assert!(coll.get(0).unwrap().is_loaded());
        assert!(!coll.get(1).unwrap().is_loaded());
    }

    #[test]
    fn test_load_is_lazy_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sidecar(dir.path(), "ds1", 50);

        let mut coll = DatasetCollection::new("exp", dir.path());
        coll.add_dataset(Dataset::new("ds1", &path)).unwrap();
        assert!(!coll.get(0).unwrap().is_loaded());

        let report = coll.load_info(&JsonInfoLoader);
        assert!(report.is_complete());
        assert!(coll.is_fully_loaded());

        // Already-loaded datasets are not re-read
        let report = coll.load_info(&JsonInfoLoader);
        assert!(report.loaded.is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_reload_invalidates_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sidecar(dir.path(), "ds1", 50);

        let mut coll = DatasetCollection::new("exp", dir.path());
        coll.add_dataset(Dataset::new("ds1", &path)).unwrap();
        coll.load_info(&JsonInfoLoader);
        assert!(coll.is_fully_loaded());

        coll.reload();
        assert!(!coll.is_fully_loaded());
        assert!(!coll.get(0).unwrap().is_loaded());
    }
}
