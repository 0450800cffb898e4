//! Error types for lfads-sweep
//!
//! Planning-time errors abort plan construction entirely (no partial plan);
//! preparation errors are isolated per data bucket; load errors are isolated
//! per run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// lfads-sweep error types
#[derive(Error, Debug)]
pub enum Error {
    /// A parameter field cannot be canonically serialized for hashing
    /// (e.g. a NaN or infinite float value).
    #[error("unhashable field '{field}': {reason}")]
    UnhashableField {
        /// Name of the offending field
        field: String,
        /// Why the value has no canonical form
        reason: String,
    },

    /// A dataset with the same name is already registered, or a run spec
    /// references the same dataset index twice.
    #[error("duplicate dataset '{name}'")]
    DuplicateDataset {
        /// Dataset name or index that was repeated
        name: String,
    },

    /// A run spec references a dataset index outside the collection.
    #[error("dataset index {index} out of range (collection has {len} datasets)")]
    InvalidDatasetIndex {
        /// The offending index
        index: usize,
        /// Number of datasets in the collection
        len: usize,
    },

    /// A run spec was created with no dataset indices.
    #[error("run spec '{name}' has no datasets")]
    EmptyRunSpec {
        /// Name of the empty run spec
        name: String,
    },

    /// Invalid sweep or matrix configuration, reported before any
    /// filesystem mutation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A shared data bucket could not be prepared. Fatal for the affected
    /// bucket only; other buckets proceed.
    #[error("data preparation failed for bucket {bucket}: {reason}")]
    DataPreparation {
        /// Content hash of the affected bucket
        bucket: String,
        /// Underlying failure
        reason: String,
    },

    /// Plan construction failed (e.g. empty device list with a
    /// device-requiring job, or an unprepared shared data bucket).
    #[error("scheduling error: {0}")]
    Scheduling(String),

    /// An external training process exited non-zero. Recorded per job,
    /// never fatal to the rest of the queue.
    #[error("job '{run}' failed with exit code {code}")]
    JobExecution {
        /// Run name of the failed job
        run: String,
        /// Process exit code
        code: i32,
    },

    /// The training process has not yet produced output for this run.
    #[error("artifact not found: {path}")]
    ArtifactNotFound {
        /// Expected artifact location
        path: PathBuf,
    },

    /// An output artifact exists but is malformed.
    #[error("artifact corrupt at {path}: {reason}")]
    ArtifactCorrupt {
        /// Artifact location
        path: PathBuf,
        /// Size/shape mismatch or parse failure description
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
