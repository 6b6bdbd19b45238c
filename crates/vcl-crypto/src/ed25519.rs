//! # Ed25519 Signing and Verification
//!
//! Ed25519 digital signatures for credentials, DID key rotation payloads,
//! and revocation-registry authorization proofs.
//!
//! ## Security Invariant
//!
//! [`SigningKey::sign()`] and [`VerifyingKey::verify()`] only accept
//! [`CanonicalBytes`](vcl_core::CanonicalBytes). This prevents signature
//! disagreement from non-canonical serialization: there is no API to sign
//! raw bytes of a structured document.

use ed25519_dalek::{Signer, Verifier};
use rand_core::CryptoRngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use vcl_core::CanonicalBytes;

use crate::error::CryptoError;

/// Hex-encode a byte slice as lowercase hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a lowercase/uppercase hex string into bytes.
///
/// # Errors
///
/// Returns [`CryptoError::HexDecode`] on odd length or non-hex characters.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, CryptoError> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() % 2 != 0 {
        return Err(CryptoError::HexDecode(format!(
            "odd length: {} chars",
            hex.len()
        )));
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair)
                .map_err(|_| CryptoError::HexDecode("non-ASCII input".to_string()))?;
            u8::from_str_radix(s, 16)
                .map_err(|_| CryptoError::HexDecode(format!("invalid hex pair {s:?}")))
        })
        .collect()
}

/// An Ed25519 digital signature (64 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(ed25519_dalek::Signature);

impl Ed25519Signature {
    /// Construct from a 64-byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] on wrong length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&arr)))
    }

    /// Parse from a hex string (128 hex chars).
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(hex)?;
        Self::from_slice(&bytes)
    }

    /// Return the signature as a 64-byte array.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Return the signature as 128 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.to_bytes())
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ed25519Signature::from_hex(&s).map_err(D::Error::custom)
    }
}

/// An Ed25519 signing (private) key.
///
/// Wraps `ed25519_dalek::SigningKey`; key material is zeroized on drop by
/// the underlying implementation.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a new random key from the given CSPRNG.
    pub fn generate<R: CryptoRngCore + ?Sized>(csprng: &mut R) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(csprng),
        }
    }

    /// Construct from a raw 32-byte seed.
    pub fn from_bytes(seed: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Sign canonicalized data.
    ///
    /// The input type enforces that only canonical bytes can be signed.
    pub fn sign(&self, data: &CanonicalBytes) -> Ed25519Signature {
        Ed25519Signature(self.inner.sign(data.as_bytes()))
    }

    /// Return the corresponding verifying (public) key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// An Ed25519 verifying (public) key.
///
/// Used to verify signatures on credentials, rotation payloads, and
/// registry authorization proofs. Serializes as 64 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

impl VerifyingKey {
    /// Construct from a raw 32-byte compressed point.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes are not a
    /// valid curve point.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(|inner| Self { inner })
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Parse from a hex string (64 hex chars).
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_to_bytes(hex)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_bytes(&arr)
    }

    /// Return the key as a 32-byte array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Return the key as 64 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.to_bytes())
    }

    /// Verify a signature over canonicalized data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::VerificationFailed`] when the signature does
    /// not match.
    pub fn verify(
        &self,
        data: &CanonicalBytes,
        signature: &Ed25519Signature,
    ) -> Result<(), CryptoError> {
        self.inner
            .verify(data.as_bytes(), &signature.0)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
    }
}

impl Serialize for VerifyingKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for VerifyingKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        VerifyingKey::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use serde_json::json;

    fn canonical(value: serde_json::Value) -> CanonicalBytes {
        CanonicalBytes::from_value(value).unwrap()
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        let data = canonical(json!({"action": "test"}));
        let sig = sk.sign(&data);
        assert!(vk.verify(&data, &sig).is_ok());
    }

    #[test]
    fn verify_fails_on_different_data() {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        let sig = sk.sign(&canonical(json!({"a": 1})));
        assert!(vk.verify(&canonical(json!({"a": 2})), &sig).is_err());
    }

    #[test]
    fn verify_fails_with_wrong_key() {
        let sk1 = SigningKey::generate(&mut OsRng);
        let sk2 = SigningKey::generate(&mut OsRng);
        let data = canonical(json!({"x": "y"}));
        let sig = sk1.sign(&data);
        assert!(sk2.verifying_key().verify(&data, &sig).is_err());
    }

    #[test]
    fn from_seed_is_deterministic() {
        let seed = [42u8; 32];
        let sk1 = SigningKey::from_bytes(&seed);
        let sk2 = SigningKey::from_bytes(&seed);
        assert_eq!(sk1.verifying_key(), sk2.verifying_key());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let sk = SigningKey::generate(&mut OsRng);
        let sig = sk.sign(&canonical(json!({})));
        let parsed = Ed25519Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(parsed, sig);
        assert_eq!(sig.to_hex().len(), 128);
    }

    #[test]
    fn signature_rejects_wrong_length() {
        assert!(matches!(
            Ed25519Signature::from_slice(&[0u8; 63]),
            Err(CryptoError::InvalidSignatureLength(63))
        ));
    }

    #[test]
    fn verifying_key_hex_roundtrip() {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        let parsed = VerifyingKey::from_hex(&vk.to_hex()).unwrap();
        assert_eq!(parsed, vk);
    }

    #[test]
    fn verifying_key_rejects_short_hex() {
        assert!(VerifyingKey::from_hex("deadbeef").is_err());
    }

    #[test]
    fn hex_to_bytes_rejects_odd_length() {
        assert!(hex_to_bytes("abc").is_err());
    }

    #[test]
    fn hex_to_bytes_rejects_non_hex() {
        assert!(hex_to_bytes("zz").is_err());
    }

    #[test]
    fn hex_to_bytes_accepts_0x_prefix() {
        assert_eq!(hex_to_bytes("0xff00").unwrap(), vec![0xff, 0x00]);
    }

    #[test]
    fn verifying_key_serde_as_hex_string() {
        let sk = SigningKey::generate(&mut OsRng);
        let vk = sk.verifying_key();
        let json_str = serde_json::to_string(&vk).unwrap();
        assert_eq!(json_str.len(), 66); // 64 hex chars plus quotes
        let back: VerifyingKey = serde_json::from_str(&json_str).unwrap();
        assert_eq!(back, vk);
    }

    #[test]
    fn signing_key_debug_redacts_material() {
        let sk = SigningKey::from_bytes(&[7u8; 32]);
        let debug = format!("{sk:?}");
        assert!(!debug.contains("07"));
    }
}
