//! Result loading - posterior means produced by the external trainer
//!
//! The training process writes one structured numeric artifact per run.
//! Loading validates shape against the run's declared trial count; a
//! missing artifact and a corrupt artifact are distinct errors, and batch
//! loading isolates failures per run.

use crate::error::{Error, Result};
use crate::matrix::RunMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Name of the per-run output artifact. Its presence is also the
/// completion marker the planner's `skip_completed` filter checks.
pub const POSTERIOR_MEANS_FILE: &str = "posterior_means.json";

/// A dense rank-3 tensor stored flat in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor3 {
    /// Dimension sizes, outermost first
    pub shape: [usize; 3],
    /// Row-major values; `values.len() == shape[0] * shape[1] * shape[2]`
    pub values: Vec<f64>,
}

impl Tensor3 {
    /// Whether the flat buffer matches the declared shape.
    #[must_use]
    pub fn shape_consistent(&self) -> bool {
        self.values.len() == self.shape.iter().product::<usize>()
    }

    /// Value at `(i, j, k)`, if in bounds.
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<f64> {
        if i >= self.shape[0] || j >= self.shape[1] || k >= self.shape[2] {
            return None;
        }
        self.values
            .get((i * self.shape[1] + j) * self.shape[2] + k)
            .copied()
    }
}

/// Per-trial inferred outputs of one run.
///
/// Axis conventions follow the trainer's artifact schema:
/// `rates[neuron, time, trial]`, `factors[factor, time, trial]`,
/// `generator_states[unit, time, trial]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorMeans {
    /// Inferred firing rates
    pub rates: Tensor3,
    /// Latent factor trajectories
    pub factors: Tensor3,
    /// Generator unit states, if the trainer exported them
    pub generator_states: Option<Tensor3>,
}

/// Load the posterior-means artifact from one run directory.
///
/// `expected_trials`, when known (dataset metadata loaded), is checked
/// against the trial axis of every tensor.
///
/// # Errors
///
/// - [`Error::ArtifactNotFound`] if the trainer has not yet produced
///   output for this run
/// - [`Error::ArtifactCorrupt`] if the artifact is unparsable, a tensor's
///   buffer disagrees with its declared shape, or the trial axis
///   disagrees with `expected_trials`
pub fn load_posterior_means(
    run_dir: &Path,
    expected_trials: Option<usize>,
) -> Result<PosteriorMeans> {
    let path = run_dir.join(POSTERIOR_MEANS_FILE);
    if !path.is_file() {
        return Err(Error::ArtifactNotFound { path });
    }
    let bytes = std::fs::read(&path)?;
    let means: PosteriorMeans =
        serde_json::from_slice(&bytes).map_err(|e| Error::ArtifactCorrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    for (name, tensor) in [
        ("rates", Some(&means.rates)),
        ("factors", Some(&means.factors)),
        ("generator_states", means.generator_states.as_ref()),
    ] {
        let Some(tensor) = tensor else { continue };
        if !tensor.shape_consistent() {
            return Err(Error::ArtifactCorrupt {
                path: path.clone(),
                reason: format!(
                    "{name}: buffer of {} values disagrees with shape {:?}",
                    tensor.values.len(),
                    tensor.shape
                ),
            });
        }
        if let Some(expected) = expected_trials {
            if tensor.shape[2] != expected {
                return Err(Error::ArtifactCorrupt {
                    path: path.clone(),
                    reason: format!(
                        "{name}: trial axis {} disagrees with declared trial count {expected}",
                        tensor.shape[2]
                    ),
                });
            }
        }
    }
    debug!(path = %path.display(), "loaded posterior means");
    Ok(means)
}

/// Load posterior means for every run of a matrix.
///
/// One run's missing or corrupt artifact never aborts loading of the
/// others; each run gets its own `Result`. The expected trial count per
/// run is the sum over its spec's datasets, when metadata is loaded.
#[must_use]
pub fn load_all(matrix: &RunMatrix) -> Vec<(String, Result<PosteriorMeans>)> {
    matrix
        .runs()
        .iter()
        .map(|run| {
            let spec = &matrix.specs()[run.spec_index()];
            let expected = spec
                .dataset_indices()
                .iter()
                .map(|&i| {
                    matrix
                        .collection()
                        .get(i)
                        .and_then(|d| d.info().map(|info| info.n_trials))
                })
                .sum::<Option<usize>>();
            (
                run.name().to_string(),
                load_posterior_means(run.run_dir(), expected),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(shape: [usize; 3]) -> Tensor3 {
        Tensor3 {
            shape,
            values: vec![0.5; shape.iter().product()],
        }
    }

    fn write_artifact(dir: &Path, means: &PosteriorMeans) {
        std::fs::write(
            dir.join(POSTERIOR_MEANS_FILE),
            serde_json::to_vec(means).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_posterior_means(dir.path(), None);
        assert!(matches!(result, Err(Error::ArtifactNotFound { .. })));
    }

    #[test]
    fn test_load_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let means = PosteriorMeans {
            rates: tensor([4, 10, 3]),
            factors: tensor([2, 10, 3]),
            generator_states: None,
        };
        write_artifact(dir.path(), &means);

        let loaded = load_posterior_means(dir.path(), Some(3)).unwrap();
        assert_eq!(loaded, means);
        assert_eq!(loaded.rates.get(0, 0, 0), Some(0.5));
        assert_eq!(loaded.rates.get(4, 0, 0), None);
    }

    #[test]
    fn test_unparsable_artifact_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(POSTERIOR_MEANS_FILE), b"garbage").unwrap();
        let result = load_posterior_means(dir.path(), None);
        assert!(matches!(result, Err(Error::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_shape_buffer_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut means = PosteriorMeans {
            rates: tensor([4, 10, 3]),
            factors: tensor([2, 10, 3]),
            generator_states: None,
        };
        means.rates.values.pop();
        write_artifact(dir.path(), &means);
        let result = load_posterior_means(dir.path(), None);
        assert!(matches!(result, Err(Error::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_trial_count_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let means = PosteriorMeans {
            rates: tensor([4, 10, 3]),
            factors: tensor([2, 10, 3]),
            generator_states: None,
        };
        write_artifact(dir.path(), &means);
        let result = load_posterior_means(dir.path(), Some(5));
        assert!(matches!(result, Err(Error::ArtifactCorrupt { .. })));
    }
}
