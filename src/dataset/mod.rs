//! Dataset registry - source files and their derived metadata
//!
//! A [`DatasetCollection`] is an ordered set of datasets, unique by name,
//! created once per experiment and referenced by every run spec. Metadata
//! (trial count, timebase, subject/session tags) is populated lazily on
//! first load and is immutable afterwards; only an explicit reload
//! invalidates it.
//!
//! Dataset-specific extraction lives behind the [`InfoLoader`] trait so
//! callers plug in their own format readers. [`JsonInfoLoader`] reads a
//! JSON sidecar and is enough for tests and simple deployments.

mod collection;
mod loader;

pub use collection::{Dataset, DatasetCollection, LoadReport};
pub use loader::{InfoLoader, JsonInfoLoader};

use serde::{Deserialize, Serialize};

/// Metadata derived from one source dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    /// Number of trials in the dataset
    pub n_trials: usize,
    /// Sampling timebase in milliseconds
    pub timebase_ms: f64,
    /// Subject identifier
    pub subject: String,
    /// Recording session tag (e.g. a date string)
    pub session: String,
}
