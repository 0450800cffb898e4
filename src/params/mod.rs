//! Hyperparameter records and sweep expansion
//!
//! A [`ParameterRecord`] is a flat mapping of named hyperparameters to typed
//! values, with a content hash derived once at construction. [`Sweep`]
//! expands one or more varying fields into the full set of concrete records.
//!
//! ## Example
//!
//! ```rust
//! use lfads_sweep::params::{ParameterRecord, ParamValue, Sweep};
//!
//! let base = ParameterRecord::builder()
//!     .field("learning_rate", 0.01)
//!     .field("gen_units", 64i64)
//!     .build()?;
//!
//! let records = Sweep::over(&base, "learning_rate", [0.01, 0.003, 0.001])?;
//! assert_eq!(records.len(), 3);
//! # Ok::<(), lfads_sweep::Error>(())
//! ```

mod record;
mod sweep;

pub use record::{ParamValue, ParameterRecord, ParameterRecordBuilder};
pub use sweep::Sweep;
