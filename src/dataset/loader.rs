//! Metadata loaders - the dataset-format seam

use crate::dataset::DatasetInfo;
use crate::error::{Error, Result};
use std::path::Path;

/// Loads derived metadata for one source dataset file.
///
/// Implementations own all format-specific extraction. The registry only
/// requires that loading is deterministic for an unchanged source file.
pub trait InfoLoader {
    /// Load metadata for the dataset at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source file is missing or malformed.
    fn load_info(&self, path: &Path) -> Result<DatasetInfo>;
}

/// Reads dataset metadata from a JSON document at the source path.
///
/// Expected shape:
///
/// ```json
/// { "n_trials": 120, "timebase_ms": 1.0, "subject": "j", "session": "s1" }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonInfoLoader;

impl InfoLoader for JsonInfoLoader {
    fn load_info(&self, path: &Path) -> Result<DatasetInfo> {
        let bytes = std::fs::read(path).map_err(|e| {
            Error::DataPreparation {
                bucket: path.display().to_string(),
                reason: format!("failed to read dataset source: {e}"),
            }
        })?;
        serde_json::from_slice(&bytes).map_err(|e| Error::DataPreparation {
            bucket: path.display().to_string(),
            reason: format!("malformed dataset metadata: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_loader_reads_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ds1.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"n_trials": 80, "timebase_ms": 1.0, "subject": "j", "session": "s1"}}"#
        )
        .unwrap();

        let info = JsonInfoLoader.load_info(&path).unwrap();
        assert_eq!(info.n_trials, 80);
        assert_eq!(info.subject, "j");
    }

    #[test]
    fn test_json_loader_missing_file() {
        let result = JsonInfoLoader.load_info(Path::new("/nonexistent/ds.json"));
        assert!(matches!(result, Err(Error::DataPreparation { .. })));
    }

    #[test]
    fn test_json_loader_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, b"not json").unwrap();
        let result = JsonInfoLoader.load_info(&path);
        assert!(matches!(result, Err(Error::DataPreparation { .. })));
    }
}
