//! Run - one (parameter record, run spec) cell of the matrix

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the shared input-data artifact inside a data bucket directory.
pub const INPUT_FILE: &str = "lfads_input.json";

/// Name of the per-run configuration artifact inside a run directory.
pub const CONFIG_FILE: &str = "lfads_config.json";

/// One cell of the run matrix: a parameter record paired with a run spec,
/// with deterministically derived on-disk locations.
///
/// Runs are created once at matrix build time and never renamed. Two runs
/// sharing a run spec and differing only in parameters outside the
/// declared data-affecting subset share one common data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    param_index: usize,
    spec_index: usize,
    name: String,
    param_hash: ContentHash,
    data_bucket: ContentHash,
    run_dir: PathBuf,
    common_data_dir: PathBuf,
}

impl Run {
    pub(crate) fn new(
        param_index: usize,
        spec_index: usize,
        spec_name: &str,
        param_hash: ContentHash,
        data_bucket: ContentHash,
        base: &Path,
    ) -> Self {
        let run_dir = base
            .join(format!("param_{param_hash}"))
            .join(spec_name);
        let common_data_dir = base.join(format!("data_{data_bucket}"));
        Self {
            param_index,
            spec_index,
            name: format!("param_{param_hash}/{spec_name}"),
            param_hash,
            data_bucket,
            run_dir,
            common_data_dir,
        }
    }

    /// Row index into the matrix's parameter list.
    #[must_use]
    pub fn param_index(&self) -> usize {
        self.param_index
    }

    /// Column index into the matrix's run-spec list.
    #[must_use]
    pub fn spec_index(&self) -> usize {
        self.spec_index
    }

    /// Display name, `param_<hash>/<specName>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content hash of the full parameter record.
    #[must_use]
    pub fn param_hash(&self) -> &ContentHash {
        &self.param_hash
    }

    /// Content hash of the (run spec, data-affecting parameters) bucket.
    #[must_use]
    pub fn data_bucket(&self) -> &ContentHash {
        &self.data_bucket
    }

    /// Per-run directory: `root/<collection>/param_<hash>/<specName>`.
    #[must_use]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Shared data directory: `root/<collection>/data_<bucketHash>`.
    #[must_use]
    pub fn common_data_dir(&self) -> &Path {
        &self.common_data_dir
    }

    /// Path of this run's configuration artifact.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.run_dir.join(CONFIG_FILE)
    }

    /// Path of this run's shared input-data artifact.
    #[must_use]
    pub fn input_path(&self) -> PathBuf {
        self.common_data_dir.join(INPUT_FILE)
    }

    /// Whether the shared input artifact for this run's bucket exists.
    #[must_use]
    pub fn input_prepared(&self) -> bool {
        self.input_path().is_file()
    }
}
