//! # Signing Key Providers
//!
//! [`KeyProvider`] is the signing seam of the stack: credential and
//! presentation proofs, DID rotation/removal payloads, registry updates,
//! and blob authorship all accept `&dyn KeyProvider` instead of raw key
//! material, so where a key lives is invisible to the code that signs
//! with it.
//!
//! Two backends ship here:
//!
//! - [`SigningKey`] itself — the in-memory backend, for keys the caller
//!   generated or loaded.
//! - [`EnvKeyProvider`] — sources the 32-byte Ed25519 seed from an
//!   environment variable, for deployments that inject secrets through
//!   the environment.
//!
//! Remote backends (an HSM, a cloud KMS) slot in as further
//! implementations without touching any signing call site.

use vcl_core::CanonicalBytes;

use crate::ed25519::{hex_to_bytes, Ed25519Signature, SigningKey, VerifyingKey};
use crate::error::CryptoError;

/// Capability for producing Ed25519 signatures over canonical bytes.
///
/// Implementations must be `Send + Sync`; a provider may be shared
/// across async tasks. Signing input is `&CanonicalBytes` — a provider
/// cannot be handed non-canonical bytes.
pub trait KeyProvider: Send + Sync {
    /// Sign canonicalized data with the managed key.
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError>;

    /// Return the Ed25519 verifying (public) key.
    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError>;

    /// Where the key comes from, for diagnostics and logging.
    fn provider_name(&self) -> &str;
}

/// A bare [`SigningKey`] is the in-memory backend.
impl KeyProvider for SigningKey {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(SigningKey::sign(self, data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(SigningKey::verifying_key(self))
    }

    fn provider_name(&self) -> &str {
        "in-memory"
    }
}

/// Sources an Ed25519 signing key from an environment variable.
///
/// The variable must hold the 32-byte seed as 64 hex chars. The key is
/// read once at construction and held in memory (zeroized on drop by the
/// underlying key); the variable can be unset afterwards.
pub struct EnvKeyProvider {
    key: SigningKey,
    var_name: String,
}

impl EnvKeyProvider {
    /// Load the signing key from the named environment variable.
    ///
    /// # Errors
    ///
    /// [`CryptoError::MissingKeyMaterial`] when the variable is unset,
    /// [`CryptoError::HexDecode`] on malformed hex, and
    /// [`CryptoError::InvalidSigningKey`] when the decoded seed is not
    /// 32 bytes.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let hex = std::env::var(var_name).map_err(|_| {
            CryptoError::MissingKeyMaterial(format!("environment variable {var_name} not set"))
        })?;

        let seed: [u8; 32] = hex_to_bytes(hex.trim())?.try_into().map_err(|_| {
            CryptoError::InvalidSigningKey(format!(
                "{var_name} must hold a 32-byte seed as 64 hex chars"
            ))
        })?;

        Ok(Self {
            key: SigningKey::from_bytes(&seed),
            var_name: var_name.to_string(),
        })
    }
}

impl KeyProvider for EnvKeyProvider {
    fn sign(&self, data: &CanonicalBytes) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(data))
    }

    fn verifying_key(&self) -> Result<VerifyingKey, CryptoError> {
        Ok(self.key.verifying_key())
    }

    fn provider_name(&self) -> &str {
        &self.var_name
    }
}
