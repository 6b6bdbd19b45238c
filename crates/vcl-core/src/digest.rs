//! # Content Digests
//!
//! Defines [`ContentDigest`] and [`DigestAlgorithm`], plus the sanctioned
//! SHA-256 computation paths. All digests carry an algorithm tag so that
//! verification code can select the correct hash function if the stack ever
//! migrates algorithms.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] only accepts [`CanonicalBytes`] — every digest of a
//! structured document is computed from properly canonicalized data.
//! [`sha256_raw()`] exists for opaque byte payloads (blob contents), which
//! have no structure to canonicalize.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// The hash algorithm used to compute a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    /// SHA-256 — the stack's standard content addressing algorithm.
    Sha256,
}

/// A content digest with its algorithm tag.
///
/// The 32-byte digest and its algorithm are always stored together so that
/// verification code can select the correct hash function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new SHA-256 content digest from raw bytes.
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
///
/// This is the standard digest path for structured documents. The input
/// must be [`CanonicalBytes`] — raw byte slices are not accepted.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    ContentDigest::sha256(sha256_raw(data.as_bytes()))
}

/// Compute a raw SHA-256 hash over opaque bytes.
///
/// For unstructured payloads only (blob contents). Structured documents
/// must go through [`sha256_digest()`].
pub fn sha256_raw(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
