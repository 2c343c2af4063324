//! Fingerprint value object.

use super::Id;
use serde::{Deserialize, Serialize};

/// One cryptographic digest of a managed file, taken at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub id: Id,
    /// File name the digest was taken from.
    pub name: String,
    /// Digest algorithm, e.g. `md5`.
    pub algorithm: String,
    /// Hex-encoded digest value.
    pub fingerprint: String,
    /// Unix epoch milliseconds.
    pub timestamp_ms: i64,
}
