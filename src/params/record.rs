//! Parameter Record - typed hyperparameter mapping with content identity

use crate::error::{Error, Result};
use crate::hash::{self, ContentHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed hyperparameter value.
///
/// Values must have a canonical textual form to participate in content
/// hashing; non-finite floats do not, and fail fast at record build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer-valued hyperparameter (unit counts, seeds, epochs)
    Int(i64),
    /// Real-valued hyperparameter (learning rates, dropout)
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Enumerated/string-valued hyperparameter
    Str(String),
}

impl ParamValue {
    /// Render the canonical fragment used for hashing and display.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhashableField`] for NaN or infinite floats,
    /// which have no stable canonical form.
    pub fn canonical(&self, field: &str) -> Result<String> {
        match self {
            Self::Int(v) => Ok(format!("i:{v}")),
            Self::Float(v) => {
                if v.is_finite() {
                    Ok(format!("f:{v}"))
                } else {
                    Err(Error::UnhashableField {
                        field: field.to_string(),
                        reason: "non-finite float".to_string(),
                    })
                }
            }
            Self::Bool(v) => Ok(format!("b:{v}")),
            Self::Str(v) => Ok(format!("s:{v}")),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// An immutable hyperparameter record with a derived content hash.
///
/// Fields are stored sorted by name, so two records with identical field
/// values hash identically regardless of creation order. The hash is
/// syntactic: any field change changes the hash, whether or not the field
/// affects training semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    fields: BTreeMap<String, ParamValue>,
    hash: ContentHash,
}

impl ParameterRecord {
    /// Create a builder for a parameter record.
    #[must_use]
    pub fn builder() -> ParameterRecordBuilder {
        ParameterRecordBuilder::default()
    }

    /// Get the content hash of this record.
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Get a field value by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ParamValue> {
        self.fields.get(field)
    }

    /// Iterate over `(name, value)` pairs in sorted field order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Create a copy of this record with one field overridden.
    ///
    /// The content hash is recomputed for the new record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhashableField`] if the new value has no
    /// canonical form.
    pub fn with_field(&self, field: &str, value: impl Into<ParamValue>) -> Result<Self> {
        let mut fields = self.fields.clone();
        fields.insert(field.to_string(), value.into());
        Self::from_fields(fields)
    }

    /// Render the canonical fragments of a subset of fields, in sorted
    /// order. Used for data-bucket hashing, where only the declared
    /// data-affecting fields count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhashableField`] if a selected value has no
    /// canonical form.
    pub fn canonical_subset(&self, select: &[String]) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for (name, value) in &self.fields {
            if select.contains(name) {
                out.push((name.clone(), value.canonical(name)?));
            }
        }
        Ok(out)
    }

    fn from_fields(fields: BTreeMap<String, ParamValue>) -> Result<Self> {
        let mut fragments = Vec::with_capacity(fields.len());
        for (name, value) in &fields {
            fragments.push((name.as_str(), value.canonical(name)?));
        }
        let hash = hash::hash_record(fragments);
        Ok(Self { fields, hash })
    }
}

/// Builder for [`ParameterRecord`].
#[derive(Debug, Default)]
pub struct ParameterRecordBuilder {
    fields: BTreeMap<String, ParamValue>,
}

impl ParameterRecordBuilder {
    /// Set a hyperparameter field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build the record, computing its content hash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnhashableField`] if any value has no canonical
    /// form (NaN/infinite float).
    pub fn build(self) -> Result<ParameterRecord> {
        ParameterRecord::from_fields(self.fields)
    }
}
