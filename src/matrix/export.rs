//! Data export seam and the default JSON exporter

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::matrix::run::INPUT_FILE;
use crate::params::ParameterRecord;
use crate::runspec::RunSpec;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything an exporter needs to build one shared input-data artifact.
pub struct ExportContext<'a> {
    /// The run spec whose datasets are exported jointly
    pub spec: &'a RunSpec,
    /// A representative parameter record for the bucket
    pub params: &'a ParameterRecord,
    /// The declared data-affecting field names
    pub data_fields: &'a [String],
    /// The spec's datasets, in stitching order
    pub datasets: Vec<&'a Dataset>,
}

/// Builds the shared input-data artifact for one data bucket.
///
/// Dataset-specific extraction and formatting is supplied by the caller
/// through this trait; the matrix only guarantees each bucket is exported
/// exactly once and reused thereafter. Exports must be deterministic:
/// re-exporting the same bucket must produce byte-identical output.
pub trait DataExporter {
    /// Write the shared input artifact into `dest` (an existing, empty
    /// bucket directory). The artifact file must be named
    /// [`INPUT_FILE`](crate::matrix::INPUT_FILE).
    ///
    /// # Errors
    ///
    /// Any error fails the bucket; other buckets still proceed.
    fn export(&self, ctx: &ExportContext<'_>, dest: &Path) -> Result<()>;
}

/// Shared input-data manifest written by [`JsonDataExporter`].
///
/// Field order is fixed so serialization is byte-deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputManifest {
    /// Run spec name
    pub spec_name: String,
    /// Dataset names in stitching order
    pub datasets: Vec<String>,
    /// Total trial count across datasets, if metadata was loaded
    pub n_trials_total: Option<usize>,
    /// Canonical `(field, value)` pairs of the data-affecting parameters
    pub data_params: Vec<(String, String)>,
}

/// Default exporter: writes a JSON manifest describing the bucket.
///
/// Sufficient for tests and for deployments where the training process
/// performs its own spike extraction from the manifest.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDataExporter;

impl DataExporter for JsonDataExporter {
    fn export(&self, ctx: &ExportContext<'_>, dest: &Path) -> Result<()> {
        let n_trials_total = ctx
            .datasets
            .iter()
            .map(|d| d.info().map(|i| i.n_trials))
            .sum::<Option<usize>>();
        let manifest = InputManifest {
            spec_name: ctx.spec.name().to_string(),
            datasets: ctx.spec.dataset_names().to_vec(),
            n_trials_total,
            data_params: ctx
                .params
                .canonical_subset(ctx.data_fields)
                .map_err(|e| Error::DataPreparation {
                    bucket: dest.display().to_string(),
                    reason: e.to_string(),
                })?,
        };
        let bytes = serde_json::to_vec_pretty(&manifest)?;
        std::fs::write(dest.join(INPUT_FILE), bytes)?;
        Ok(())
    }
}
