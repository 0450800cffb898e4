//! Content hashing for run identity and path derivation
//!
//! Identity is a pure function of field values: fields are sorted by name,
//! rendered in a canonical form, and digested with SHA-256. Two records with
//! identical field values hash identically regardless of insertion order or
//! platform. Identical hashes are deliberately treated as the same run
//! bucket (content-addressed de-duplication).
//!
//! The hash domain carries a schema version so that a future change to the
//! canonical form cannot silently mix incompatible hash spaces.

use sha2::{Digest, Sha256};
use std::fmt;

/// Version of the canonical serialization. Bump on any change to the
/// canonical form so old and new hashes never collide by accident.
pub const HASH_SCHEMA_VERSION: u32 = 1;

/// Truncated digest length in hex characters. 48 bits keeps accidental
/// collision probability negligible for sweeps in the low thousands.
pub const HASH_LEN: usize = 12;

/// A truncated, hex-encoded content hash.
///
/// Stable across process restarts and platforms; used directly as a
/// directory-name component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Get the hex digest as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash a sequence of canonical `(name, value)` fragments.
///
/// Callers are responsible for producing fragments in sorted field order;
/// [`hash_record`] does this for you.
#[must_use]
pub fn hash_fragments<'a, I>(fragments: I) -> ContentHash
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut hasher = Sha256::new();
    hasher.update(HASH_SCHEMA_VERSION.to_le_bytes());
    for (name, value) in fragments {
        hasher.update(name.as_bytes());
        hasher.update([0x1f]); // unit separator, keeps "ab"+"c" != "a"+"bc"
        hasher.update(value.as_bytes());
        hasher.update([0x1e]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(HASH_LEN + 1);
    for byte in digest.iter().take(HASH_LEN.div_ceil(2)) {
        use fmt::Write as _;
        let _ = write!(hex, "{byte:02x}");
    }
    hex.truncate(HASH_LEN);
    ContentHash(hex)
}

/// Hash a record of named fields, sorting by field name first.
///
/// The input may arrive in any order; output is order-independent.
#[must_use]
pub fn hash_record<'a, I>(fields: I) -> ContentHash
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut sorted: Vec<(&str, String)> = fields.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    hash_fragments(sorted.iter().map(|(n, v)| (*n, v.as_str())))
}
