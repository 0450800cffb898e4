//! Run Spec - a named grouping of datasets trained jointly
//!
//! A single-dataset spec trains one dataset alone; a multi-dataset
//! ("stitched") spec trains several datasets under one shared model. Index
//! order matters for stitching, but spec identity hashes over the *sorted*
//! dataset-name set plus its cardinality, so a single-dataset spec and a
//! stitched grouping can never collide.

use crate::dataset::DatasetCollection;
use crate::error::{Error, Result};
use crate::hash::{self, ContentHash};
use serde::{Deserialize, Serialize};

/// A named, validated subset of datasets from one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    name: String,
    dataset_indices: Vec<usize>,
    dataset_names: Vec<String>,
    identity: ContentHash,
}

impl RunSpec {
    /// Create a run spec over `dataset_indices` of `collection`.
    ///
    /// Index order is preserved (it matters for stitching).
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyRunSpec`] if `dataset_indices` is empty
    /// - [`Error::InvalidDatasetIndex`] if an index is out of range
    /// - [`Error::DuplicateDataset`] if an index appears twice
    pub fn new(
        name: impl Into<String>,
        collection: &DatasetCollection,
        dataset_indices: Vec<usize>,
    ) -> Result<Self> {
        let name = name.into();
        if dataset_indices.is_empty() {
            return Err(Error::EmptyRunSpec { name });
        }
        let mut seen = std::collections::BTreeSet::new();
        for &index in &dataset_indices {
            if index >= collection.len() {
                return Err(Error::InvalidDatasetIndex {
                    index,
                    len: collection.len(),
                });
            }
            if !seen.insert(index) {
                return Err(Error::DuplicateDataset {
                    name: collection
                        .get(index)
                        .map_or_else(|| index.to_string(), |d| d.name().to_string()),
                });
            }
        }

        let dataset_names: Vec<String> = dataset_indices
            .iter()
            .map(|&i| collection.get(i).map(|d| d.name().to_string()))
            .collect::<Option<_>>()
            .unwrap_or_default();

        // Identity ignores stitching order: sorted names + count.
        let mut sorted = dataset_names.clone();
        sorted.sort();
        let mut fragments = vec![("n_datasets", sorted.len().to_string())];
        let keys: Vec<String> = (0..sorted.len()).map(|i| format!("dataset_{i}")).collect();
        for (key, dataset) in keys.iter().zip(&sorted) {
            fragments.push((key.as_str(), dataset.clone()));
        }
        let identity = hash::hash_record(fragments);

        Ok(Self {
            name,
            dataset_indices,
            dataset_names,
            identity,
        })
    }

    /// Convenience constructor for a single-dataset spec named after the
    /// dataset itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDatasetIndex`] if `index` is out of range.
    pub fn single(collection: &DatasetCollection, index: usize) -> Result<Self> {
        let dataset = collection.get(index).ok_or(Error::InvalidDatasetIndex {
            index,
            len: collection.len(),
        })?;
        Self::new(dataset.name().to_string(), collection, vec![index])
    }

    /// Convenience constructor for a stitched spec over every dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRunSpec`] if the collection is empty.
    pub fn all(name: impl Into<String>, collection: &DatasetCollection) -> Result<Self> {
        Self::new(name, collection, (0..collection.len()).collect())
    }

    /// Spec name (used as a path component).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dataset indices in stitching order.
    #[must_use]
    pub fn dataset_indices(&self) -> &[usize] {
        &self.dataset_indices
    }

    /// Dataset names in stitching order.
    #[must_use]
    pub fn dataset_names(&self) -> &[String] {
        &self.dataset_names
    }

    /// Number of datasets trained jointly under this spec.
    #[must_use]
    pub fn n_datasets(&self) -> usize {
        self.dataset_indices.len()
    }

    /// Whether this spec stitches more than one dataset.
    #[must_use]
    pub fn is_stitched(&self) -> bool {
        self.dataset_indices.len() > 1
    }

    /// Content hash over the sorted dataset-identity set.
    #[must_use]
    pub fn identity(&self) -> &ContentHash {
        &self.identity
    }
}
