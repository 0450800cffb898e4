//! # lfads-sweep: run-matrix bookkeeping for LFADS hyperparameter sweeps
//!
//! lfads-sweep names, places, and schedules large sweeps of training runs.
//! It never performs the training computation itself: the trainer is an
//! opaque executable invoked once per run by a generated launcher.
//!
//! The pipeline is one-way:
//!
//! ```text
//! Datasets + Sweep + RunSpecs -> RunMatrix -> ExecutionPlan -> (trainer) -> results
//! ```
//!
//! - Every run's directory is content-addressed: identical parameter
//!   records map to identical locations, so repeated sweeps de-duplicate.
//! - Runs differing only in parameters that do not affect preprocessing
//!   share one exported data directory (a content-addressed build cache).
//! - Plans are static priority orders with a dynamic admission rule; the
//!   launcher script is only a serialization adapter over the plan.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lfads_sweep::dataset::{Dataset, DatasetCollection, JsonInfoLoader};
//! use lfads_sweep::matrix::{JsonDataExporter, RunMatrix};
//! use lfads_sweep::params::{ParameterRecord, Sweep};
//! use lfads_sweep::plan::{build_plan, PlannerConfig};
//! use lfads_sweep::runspec::RunSpec;
//!
//! let mut datasets = DatasetCollection::new("reaching", "/data");
//! datasets.add_dataset(Dataset::new("ds1", "/data/ds1.json"))?;
//! datasets.load_info(&JsonInfoLoader);
//!
//! let base = ParameterRecord::builder()
//!     .field("learning_rate", 0.01)
//!     .field("spike_bin_ms", 2i64)
//!     .build()?;
//!
//! let spec = RunSpec::single(&datasets, 0)?;
//! let mut matrix = RunMatrix::new("pbt_sweep", "/runs", datasets)
//!     .with_data_fields(["spike_bin_ms"]);
//! matrix.add_params(Sweep::over(&base, "learning_rate", [0.01, 0.001])?)?;
//! matrix.add_run_spec(spec)?;
//!
//! matrix.prepare(&JsonDataExporter)?;
//!
//! let plan = build_plan(&matrix, &PlannerConfig {
//!     max_concurrent: 4,
//!     devices: vec![0, 1],
//!     ..PlannerConfig::default()
//! })?;
//! std::fs::write("/runs/launch.sh", plan.to_launcher_script())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod dataset;
pub mod error;
pub mod hash;
pub mod matrix;
pub mod params;
pub mod plan;
pub mod results;
pub mod runspec;

pub use error::{Error, Result};
pub use hash::ContentHash;
pub use matrix::{Run, RunMatrix};
pub use plan::{build_plan, ExecutionPlan, PlannerConfig};
pub use runspec::RunSpec;
