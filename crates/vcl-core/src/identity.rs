//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the VCL stack.
//! Each identifier is a distinct type — you cannot pass a [`BlobId`] where
//! a [`RegistryId`] is expected.
//!
//! ## Validation
//!
//! [`Did`] validates W3C DID syntax at construction time. The fixed-size
//! identifiers ([`RegistryId`], [`BlobId`], [`RevokeId`]) are 32 random
//! bytes, serialized as lowercase hex with a `0x` prefix; parsing validates
//! length and character set.

use rand_core::{OsRng, RngCore};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::ContentDigest;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// DID (validated string identifier)
// ---------------------------------------------------------------------------

/// W3C Decentralized Identifier (DID).
///
/// Format: `did:<method>:<method-specific-id>` where method is lowercase
/// alphanumeric and method-specific-id is non-empty.
///
/// Reference: <https://www.w3.org/TR/did-core/#did-syntax>
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Did(String);

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Create a fresh DID under the given method with a random 32-byte
    /// hex identifier.
    pub fn random(method: &str) -> Result<Self, ValidationError> {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self::new(format!("did:{method}:0x{}", hex_encode(&bytes)))
    }

    /// Parse a DID URL (`did:method:id#fragment`), discarding the fragment.
    ///
    /// Verification methods in proofs are DID URLs; resolution operates on
    /// the bare DID.
    pub fn from_url(url: &str) -> Result<Self, ValidationError> {
        let bare = url.split('#').next().unwrap_or(url);
        Self::new(bare)
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if !s.starts_with("did:") {
            return Err(ValidationError::InvalidDid(s.to_string()));
        }

        let rest = &s[4..];
        match rest.find(':') {
            None => Err(ValidationError::InvalidDid(s.to_string())),
            Some(pos) => {
                let method = &rest[..pos];
                let identifier = &rest[pos + 1..];

                if method.is_empty()
                    || !method
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
                {
                    return Err(ValidationError::InvalidDid(s.to_string()));
                }
                if identifier.is_empty() {
                    return Err(ValidationError::InvalidDid(s.to_string()));
                }
                Ok(())
            }
        }
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the DID method (the part between the first and second colons).
    pub fn method(&self) -> &str {
        let rest = &self.0[4..];
        let colon_pos = rest.find(':').expect("validated at construction");
        &rest[..colon_pos]
    }

    /// Return the method-specific identifier (everything after `did:method:`).
    pub fn method_specific_id(&self) -> &str {
        let rest = &self.0[4..];
        let colon_pos = rest.find(':').expect("validated at construction");
        &rest[colon_pos + 1..]
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Did::new(s).map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Fixed-size random identifiers (32 bytes, hex-serialized)
// ---------------------------------------------------------------------------

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn parse_hex32(kind: &'static str, s: &str) -> Result<[u8; 32], ValidationError> {
    let invalid = || ValidationError::InvalidHexId {
        kind,
        value: s.to_string(),
    };
    let hex = s.strip_prefix("0x").unwrap_or(s);
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk).map_err(|_| invalid())?;
        bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
    }
    Ok(bytes)
}

fn random_bytes32() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Identifier of a revocation registry — 32 random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId([u8; 32]);

impl RegistryId {
    /// Create a new random registry identifier from the OS CSPRNG.
    pub fn random() -> Self {
        Self(random_bytes32())
    }

    /// Create a registry identifier from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string (64 hex chars, optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        Ok(Self(parse_hex32("registry", s)?))
    }

    /// Access the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the identifier as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex_encode(&self.0))
    }
}

impl std::fmt::Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for RegistryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RegistryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RegistryId::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Identifier of a stored blob — 32 random bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId([u8; 32]);

impl BlobId {
    /// Create a new random blob identifier from the OS CSPRNG.
    pub fn random() -> Self {
        Self(random_bytes32())
    }

    /// Create a blob identifier from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a hex string (64 hex chars, optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        Ok(Self(parse_hex32("blob", s)?))
    }

    /// Access the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the identifier as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex_encode(&self.0))
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for BlobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BlobId::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Identifier of a revocation entry — 32 bytes, either random or derived
/// from a credential's stable fields via [`RevokeId::from_digest()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevokeId([u8; 32]);

impl RevokeId {
    /// Create a new random revocation identifier from the OS CSPRNG.
    pub fn random() -> Self {
        Self(random_bytes32())
    }

    /// Create a revocation identifier from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a revocation identifier from a content digest.
    ///
    /// Used to map a credential's stable fields to a deterministic
    /// revocation id.
    pub fn from_digest(digest: &ContentDigest) -> Self {
        Self(digest.bytes)
    }

    /// Parse from a hex string (64 hex chars, optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        Ok(Self(parse_hex32("revoke", s)?))
    }

    /// Access the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the identifier as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex_encode(&self.0))
    }
}

impl std::fmt::Display for RevokeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for RevokeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RevokeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RevokeId::from_hex(&s).map_err(D::Error::custom)
    }
}
