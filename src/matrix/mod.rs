//! Run Matrix - the full parameter × run-spec grid
//!
//! [`RunMatrix`] composes parameter records and run specs into individual
//! [`Run`]s, each with a content-addressed on-disk location. After any
//! addition the grid is recomputed as the cartesian product of current
//! params × current specs, so `runs.len() == n_params * n_specs` always
//! holds, every cell populated exactly once.
//!
//! [`RunMatrix::prepare`] is the caching layer: each distinct
//! (run spec, data-affecting-parameter) bucket gets its shared input
//! artifact built exactly once, content-addressed by bucket hash, then
//! every run gets a configuration artifact derived from it. The operation
//! is idempotent.

mod export;
mod run;

pub use export::{DataExporter, ExportContext, InputManifest, JsonDataExporter};
pub use run::{Run, CONFIG_FILE, INPUT_FILE};

use crate::dataset::DatasetCollection;
use crate::error::{Error, Result};
use crate::hash::{self, ContentHash};
use crate::params::ParameterRecord;
use crate::runspec::RunSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the human-readable run listing regenerated by every
/// [`RunMatrix::prepare`] call.
pub const SUMMARY_FILE: &str = "summary.txt";

/// Row-major cell index for `(param_index, spec_index)`.
///
/// Pure function of the matrix dimensions; fixes submission priority for
/// the planner (earlier cells launch first).
#[must_use]
pub const fn cell_index(param_index: usize, spec_index: usize, n_specs: usize) -> usize {
    param_index * n_specs + spec_index
}

/// Per-run configuration artifact, derived from the shared input artifact.
///
/// Field order is fixed so serialization is byte-deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run display name (`param_<hash>/<specName>`)
    pub run_name: String,
    /// Run spec name
    pub spec_name: String,
    /// Dataset names in stitching order
    pub datasets: Vec<String>,
    /// Canonical `(field, value)` pairs of the full parameter record
    pub params: Vec<(String, String)>,
    /// Content hash of the parameter record
    pub param_hash: ContentHash,
    /// Relative path of the shared data directory (`data_<bucketHash>`)
    pub data_dir: String,
    /// Initial alignment seed, derived deterministically from the shared
    /// data bucket so all runs over one bucket agree
    pub alignment_seed: u64,
}

/// Outcome of one [`RunMatrix::prepare`] call.
#[derive(Debug)]
pub struct PrepareReport {
    /// Buckets whose shared artifact was built by this call
    pub exported_buckets: Vec<ContentHash>,
    /// Buckets whose shared artifact already existed and was reused
    pub reused_buckets: Vec<ContentHash>,
    /// Number of run config artifacts written by this call
    pub configs_written: usize,
    /// Number of run config artifacts that already existed
    pub configs_reused: usize,
    /// Per-bucket failures; other buckets proceeded
    pub failures: Vec<(ContentHash, Error)>,
    /// When the call completed
    pub completed_at: DateTime<Utc>,
}

impl PrepareReport {
    /// Whether every bucket prepared successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The full grid of runs for one collection of datasets.
#[derive(Debug)]
pub struct RunMatrix {
    name: String,
    root: PathBuf,
    collection: DatasetCollection,
    data_fields: Vec<String>,
    params: Vec<ParameterRecord>,
    specs: Vec<RunSpec>,
    runs: Vec<Run>,
}

impl RunMatrix {
    /// Create an empty matrix for `collection`, rooted at
    /// `root/<name>/`.
    ///
    /// `name` is the run-collection name used as a path component.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        collection: DatasetCollection,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            collection,
            data_fields: Vec::new(),
            params: Vec::new(),
            specs: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Declare which parameter fields affect shared data preparation
    /// (e.g. spike binning width). Runs differing only outside this
    /// subset share one data bucket. The subset is caller-declared,
    /// never inferred.
    #[must_use]
    pub fn with_data_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_fields = fields.into_iter().map(Into::into).collect();
        self.data_fields.sort();
        self.data_fields.dedup();
        self
    }

    /// Run-collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base directory: `root/<name>`.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// The dataset collection this matrix is built over.
    #[must_use]
    pub fn collection(&self) -> &DatasetCollection {
        &self.collection
    }

    /// Declared data-affecting parameter fields, sorted.
    #[must_use]
    pub fn data_fields(&self) -> &[String] {
        &self.data_fields
    }

    /// Number of parameter records.
    #[must_use]
    pub fn n_params(&self) -> usize {
        self.params.len()
    }

    /// Number of run specs.
    #[must_use]
    pub fn n_specs(&self) -> usize {
        self.specs.len()
    }

    /// Total number of runs (`n_params * n_specs`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether the matrix has no runs yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Parameter records in insertion order.
    #[must_use]
    pub fn params(&self) -> &[ParameterRecord] {
        &self.params
    }

    /// Run specs in insertion order.
    #[must_use]
    pub fn specs(&self) -> &[RunSpec] {
        &self.specs
    }

    /// Runs in row-major `(param_index, spec_index)` order.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Get the run at `(param_index, spec_index)`.
    #[must_use]
    pub fn get(&self, param_index: usize, spec_index: usize) -> Option<&Run> {
        if spec_index >= self.specs.len() {
            return None;
        }
        self.runs
            .get(cell_index(param_index, spec_index, self.specs.len()))
    }

    /// Add parameter records and recompute the grid.
    ///
    /// Records whose content hash is already present are skipped: same
    /// hash means the same run bucket (content-addressed
    /// de-duplication).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhashableField`] if a data-bucket hash cannot be
    /// derived (cannot occur for records built through the builder).
    pub fn add_params<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = ParameterRecord>,
    {
        for record in records {
            if self.params.iter().any(|p| p.hash() == record.hash()) {
                debug!(hash = %record.hash(), "skipping duplicate parameter record");
                continue;
            }
            self.params.push(record);
        }
        self.rebuild()
    }

    /// Add a run spec and recompute the grid.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if a spec with the same name exists
    ///   (names are path components and must be unique)
    /// - [`Error::InvalidDatasetIndex`] if the spec references a dataset
    ///   outside this matrix's collection
    pub fn add_run_spec(&mut self, spec: RunSpec) -> Result<()> {
        if self.specs.iter().any(|s| s.name() == spec.name()) {
            return Err(Error::Configuration(format!(
                "run spec '{}' already exists",
                spec.name()
            )));
        }
        if let Some(&max) = spec.dataset_indices().iter().max() {
            if max >= self.collection.len() {
                return Err(Error::InvalidDatasetIndex {
                    index: max,
                    len: self.collection.len(),
                });
            }
        }
        self.specs.push(spec);
        self.rebuild()
    }

    /// Data-bucket hash for one (spec, params) pair: the spec identity
    /// plus the data-affecting parameter subset.
    fn bucket_hash(&self, spec: &RunSpec, params: &ParameterRecord) -> Result<ContentHash> {
        let mut fragments = vec![("run_spec".to_string(), spec.identity().to_string())];
        fragments.extend(params.canonical_subset(&self.data_fields)?);
        Ok(hash::hash_record(
            fragments.iter().map(|(n, v)| (n.as_str(), v.clone())),
        ))
    }

    /// Recompute every cell of the grid in row-major order.
    fn rebuild(&mut self) -> Result<()> {
        let base = self.base_dir();
        let mut runs = Vec::with_capacity(self.params.len() * self.specs.len());
        for (param_index, params) in self.params.iter().enumerate() {
            for (spec_index, spec) in self.specs.iter().enumerate() {
                let bucket = self.bucket_hash(spec, params)?;
                runs.push(Run::new(
                    param_index,
                    spec_index,
                    spec.name(),
                    params.hash().clone(),
                    bucket,
                    &base,
                ));
            }
        }
        self.runs = runs;
        Ok(())
    }

    /// Ensure every shared input artifact and run config exists on disk.
    ///
    /// For each distinct (run spec, data-affecting-parameter) bucket the
    /// shared artifact is built if absent and reused if a matching hash
    /// directory already exists. Then every run's configuration artifact
    /// is written, deriving run-specific settings (alignment seed) from
    /// the bucket. The human-readable summary is regenerated.
    ///
    /// Idempotent: a second call with no intervening additions performs
    /// no redundant work and leaves existing artifacts byte-identical.
    ///
    /// A failure in one bucket is isolated: runs over other buckets still
    /// prepare, and the failure is recorded in the report.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures outside bucket isolation
    /// (creating the base directory, writing the summary).
    pub fn prepare(&self, exporter: &impl DataExporter) -> Result<PrepareReport> {
        let base = self.base_dir();
        std::fs::create_dir_all(&base)?;

        let mut report = PrepareReport {
            exported_buckets: Vec::new(),
            reused_buckets: Vec::new(),
            configs_written: 0,
            configs_reused: 0,
            failures: Vec::new(),
            completed_at: Utc::now(),
        };

        // One representative run per bucket, in row-major order.
        let mut buckets: BTreeMap<ContentHash, &Run> = BTreeMap::new();
        for run in &self.runs {
            buckets.entry(run.data_bucket().clone()).or_insert(run);
        }

        let mut failed: Vec<ContentHash> = Vec::new();
        for (bucket, &run) in &buckets {
            if run.input_prepared() {
                debug!(bucket = %bucket, "reusing shared data bucket");
                report.reused_buckets.push(bucket.clone());
                continue;
            }
            match self.export_bucket(exporter, run) {
                Ok(()) => {
                    info!(bucket = %bucket, dir = %run.common_data_dir().display(), "exported shared data bucket");
                    report.exported_buckets.push(bucket.clone());
                }
                Err(e) => {
                    warn!(bucket = %bucket, error = %e, "data bucket export failed");
                    failed.push(bucket.clone());
                    report.failures.push((bucket.clone(), e));
                }
            }
        }

        for run in &self.runs {
            if failed.contains(run.data_bucket()) {
                continue;
            }
            if self.write_run_config(run)? {
                report.configs_written += 1;
            } else {
                report.configs_reused += 1;
            }
        }

        self.write_summary(&base)?;
        report.completed_at = Utc::now();
        Ok(report)
    }

    fn export_bucket(&self, exporter: &impl DataExporter, run: &Run) -> Result<()> {
        let spec = &self.specs[run.spec_index()];
        let params = &self.params[run.param_index()];
        let datasets = spec
            .dataset_indices()
            .iter()
            .filter_map(|&i| self.collection.get(i))
            .collect();
        std::fs::create_dir_all(run.common_data_dir()).map_err(|e| Error::DataPreparation {
            bucket: run.data_bucket().to_string(),
            reason: e.to_string(),
        })?;
        let ctx = ExportContext {
            spec,
            params,
            data_fields: &self.data_fields,
            datasets,
        };
        exporter
            .export(&ctx, run.common_data_dir())
            .map_err(|e| Error::DataPreparation {
                bucket: run.data_bucket().to_string(),
                reason: e.to_string(),
            })
    }

    /// Write the run config if absent. Returns `true` if written.
    fn write_run_config(&self, run: &Run) -> Result<bool> {
        let path = run.config_path();
        if path.is_file() {
            return Ok(false);
        }
        std::fs::create_dir_all(run.run_dir())?;
        let spec = &self.specs[run.spec_index()];
        let params = &self.params[run.param_index()];
        let all_fields: Vec<String> = params.fields().map(|(n, _)| n.to_string()).collect();
        let config = RunConfig {
            run_name: run.name().to_string(),
            spec_name: spec.name().to_string(),
            datasets: spec.dataset_names().to_vec(),
            params: params.canonical_subset(&all_fields)?,
            param_hash: run.param_hash().clone(),
            data_dir: format!("data_{}", run.data_bucket()),
            alignment_seed: alignment_seed(run.data_bucket()),
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&config)?)?;
        Ok(true)
    }

    /// Regenerate `summary.txt`. Content is byte-deterministic, so the
    /// file is rewritten only when it actually changed.
    fn write_summary(&self, base: &Path) -> Result<()> {
        use std::fmt::Write;
        let mut text = String::new();
        let _ = writeln!(
            text,
            "run collection '{}': {} params x {} specs = {} runs",
            self.name,
            self.params.len(),
            self.specs.len(),
            self.runs.len()
        );
        for run in &self.runs {
            let params = &self.params[run.param_index()];
            let fields: Vec<String> = params
                .fields()
                .map(|(n, v)| format!("{n}={v}"))
                .collect();
            let _ = writeln!(
                text,
                "{}  data_{}  [{}]",
                run.name(),
                run.data_bucket(),
                fields.join(", ")
            );
        }
        let path = base.join(SUMMARY_FILE);
        if std::fs::read(&path).is_ok_and(|existing| existing == text.as_bytes()) {
            return Ok(());
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Derive a deterministic alignment seed from a data-bucket hash.
///
/// All runs over one bucket get the same seed, so their initial alignment
/// guesses agree without re-reading the shared artifact.
#[must_use]
pub fn alignment_seed(bucket: &ContentHash) -> u64 {
    u64::from_str_radix(bucket.as_str(), 16).unwrap_or(0)
}
