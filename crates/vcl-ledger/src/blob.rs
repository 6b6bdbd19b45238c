//! # Write-Once Blob Store
//!
//! A content store keyed by random 32-byte [`BlobId`]s. Blobs are
//! write-once: a given id may be written exactly once, and reads return
//! the stored bytes verbatim. There is no update, no owner change, and no
//! deletion.
//!
//! Payloads are arbitrary bytes. Helpers accept text and structured JSON
//! (serialized through the canonical pipeline so a JSON blob has exactly
//! one byte form).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcl_core::{BlobId, CanonicalBytes, CanonicalizationError, Did};
use vcl_crypto::{bytes_to_hex, CryptoError, Ed25519Signature, KeyProvider};

/// Maximum blob payload size in bytes.
pub const MAX_BLOB_BYTES: usize = 1024;

/// Errors from blob store operations.
#[derive(Error, Debug)]
pub enum BlobError {
    /// A blob with this identifier was already written.
    #[error("blob already exists: {0}")]
    AlreadyExists(BlobId),

    /// No blob with this identifier.
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// The payload exceeds [`MAX_BLOB_BYTES`].
    #[error("blob too large: {size} bytes (max {max})")]
    TooLarge {
        /// The rejected payload size.
        size: usize,
        /// The enforced maximum.
        max: usize,
    },

    /// Canonicalization of a JSON payload or signing input failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The signing backend failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),
}

/// A blob awaiting storage: identifier, payload, and author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// The blob identifier — chosen randomly by the author.
    pub id: BlobId,
    /// The payload bytes.
    #[serde(with = "serde_bytes_hex")]
    pub bytes: Vec<u8>,
    /// The authoring DID. The store transaction must be signed by this
    /// DID's currently-registered key.
    pub author: Did,
}

impl Blob {
    /// Create a blob from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::TooLarge`] when the payload exceeds
    /// [`MAX_BLOB_BYTES`].
    pub fn new(id: BlobId, bytes: impl Into<Vec<u8>>, author: Did) -> Result<Self, BlobError> {
        let bytes = bytes.into();
        if bytes.len() > MAX_BLOB_BYTES {
            return Err(BlobError::TooLarge {
                size: bytes.len(),
                max: MAX_BLOB_BYTES,
            });
        }
        Ok(Self { id, bytes, author })
    }

    /// Create a blob from a UTF-8 string payload.
    pub fn from_text(id: BlobId, text: &str, author: Did) -> Result<Self, BlobError> {
        Self::new(id, text.as_bytes().to_vec(), author)
    }

    /// Create a blob from a structured JSON payload.
    ///
    /// The value is serialized through the canonical pipeline so that the
    /// same document always produces the same stored bytes.
    pub fn from_json(
        id: BlobId,
        value: &serde_json::Value,
        author: Did,
    ) -> Result<Self, BlobError> {
        let canonical = CanonicalBytes::new(value)?;
        Self::new(id, canonical.into_bytes(), author)
    }

    /// Canonical signing input for the store transaction.
    ///
    /// The payload is hex-encoded so the signed document is valid JSON
    /// regardless of the blob's content.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(&serde_json::json!({
            "id": self.id.to_hex(),
            "blob": bytes_to_hex(&self.bytes),
            "author": self.author.as_str(),
        }))
    }

    /// Sign the store transaction with the author's current key.
    pub fn sign(&self, author_key: &dyn KeyProvider) -> Result<Ed25519Signature, BlobError> {
        Ok(author_key.sign(&self.signing_input()?)?)
    }
}

/// Hex-string serde for blob payload bytes.
mod serde_bytes_hex {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use vcl_crypto::{bytes_to_hex, hex_to_bytes};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex_to_bytes(&s).map_err(D::Error::custom)
    }
}

/// A stored blob: payload and author, frozen at write time.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// The payload bytes, returned verbatim on every read.
    pub bytes: Vec<u8>,
    /// The authoring DID.
    pub author: Did,
}

/// The blob store state. Owned by the ledger state machine.
#[derive(Debug, Default)]
pub(crate) struct BlobStore {
    blobs: BTreeMap<BlobId, StoredBlob>,
}

impl BlobStore {
    /// Store a blob. Write-once: a second put with the same id fails.
    pub(crate) fn put(&mut self, blob: Blob) -> Result<(), BlobError> {
        if blob.bytes.len() > MAX_BLOB_BYTES {
            return Err(BlobError::TooLarge {
                size: blob.bytes.len(),
                max: MAX_BLOB_BYTES,
            });
        }
        if self.blobs.contains_key(&blob.id) {
            return Err(BlobError::AlreadyExists(blob.id));
        }
        self.blobs.insert(
            blob.id,
            StoredBlob {
                bytes: blob.bytes,
                author: blob.author,
            },
        );
        Ok(())
    }

    /// Fetch a stored blob.
    pub(crate) fn get(&self, id: &BlobId) -> Result<&StoredBlob, BlobError> {
        self.blobs.get(id).ok_or(BlobError::NotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn author() -> Did {
        Did::random("vcl").unwrap()
    }

    #[test]
    fn put_and_get_roundtrip() {
        let mut store = BlobStore::default();
        let id = BlobId::random();
        let blob = Blob::from_text(id, "hello world", author()).unwrap();
        store.put(blob).unwrap();

        let stored = store.get(&id).unwrap();
        assert_eq!(stored.bytes, b"hello world");
    }

    #[test]
    fn double_put_fails() {
        let mut store = BlobStore::default();
        let id = BlobId::random();
        store
            .put(Blob::from_text(id, "first", author()).unwrap())
            .unwrap();

        let result = store.put(Blob::from_text(id, "second", author()).unwrap());
        assert!(matches!(result, Err(BlobError::AlreadyExists(_))));

        // First write is untouched.
        assert_eq!(store.get(&id).unwrap().bytes, b"first");
    }

    #[test]
    fn get_missing_fails() {
        let store = BlobStore::default();
        assert!(matches!(
            store.get(&BlobId::random()),
            Err(BlobError::NotFound(_))
        ));
    }

    #[test]
    fn oversized_payload_rejected() {
        let id = BlobId::random();
        let result = Blob::new(id, vec![0u8; MAX_BLOB_BYTES + 1], author());
        assert!(matches!(result, Err(BlobError::TooLarge { .. })));
    }

    #[test]
    fn max_size_payload_accepted() {
        let id = BlobId::random();
        assert!(Blob::new(id, vec![0u8; MAX_BLOB_BYTES], author()).is_ok());
    }

    #[test]
    fn json_payload_is_canonical() {
        let id = BlobId::random();
        let a = Blob::from_json(id, &json!({"b": 1, "a": 2}), author()).unwrap();
        let b = Blob::from_json(id, &json!({"a": 2, "b": 1}), author()).unwrap();
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.bytes, br#"{"a":2,"b":1}"#.to_vec());
    }

    #[test]
    fn blob_serde_roundtrip() {
        let blob = Blob::from_text(BlobId::random(), "payload", author()).unwrap();
        let json_str = serde_json::to_string(&blob).unwrap();
        let back: Blob = serde_json::from_str(&json_str).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn signing_input_changes_with_payload() {
        let id = BlobId::random();
        let a = Blob::from_text(id, "one", author()).unwrap();
        let b = Blob::from_text(id, "two", a.author.clone()).unwrap();
        assert_ne!(
            a.signing_input().unwrap().as_bytes(),
            b.signing_input().unwrap().as_bytes()
        );
    }
}
