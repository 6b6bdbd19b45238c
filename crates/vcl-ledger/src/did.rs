//! # DID Key Registry
//!
//! Maps a [`Did`] to its currently-registered public key and controller.
//! Exactly one active registration exists per DID at any time: rotation
//! replaces, never appends. Removal leaves a tombstone — the identifier
//! becomes permanently unresolvable and cannot be re-registered.
//!
//! ## Replay Fence
//!
//! Rotation and removal payloads carry a `nonce`, which must equal the
//! block of the DID's last update. A signature produced for an earlier
//! state of the DID cannot be replayed after a rotation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcl_core::{CanonicalBytes, CanonicalizationError, Did};
use vcl_crypto::{CryptoError, Ed25519Signature, KeyProvider, VerifyingKey};

/// Errors from DID registry operations.
#[derive(Error, Debug)]
pub enum DidError {
    /// The DID already has a registration (or a tombstone from a removal).
    #[error("DID already exists: {0}")]
    AlreadyExists(Did),

    /// No active registration for the DID.
    #[error("no such DID: {0}")]
    NoSuchDid(Did),

    /// The payload signature does not verify against the currently
    /// registered key.
    #[error("bad signature for DID: {0}")]
    BadSignature(Did),

    /// The payload nonce does not match the DID's last update block.
    /// Expected under contention — re-read and retry.
    #[error("stale nonce for DID update: expected {expected}, observed {observed}")]
    StaleNonce {
        /// The DID's current last-update block.
        expected: u64,
        /// The nonce carried by the payload.
        observed: u64,
    },

    /// Canonicalization of a signing payload failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The signing backend failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),
}

/// The active key registration for a DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRegistration {
    /// The currently-registered Ed25519 public key.
    #[serde(rename = "publicKey")]
    pub public_key: VerifyingKey,
    /// The controller DID (defaults to the DID itself at registration).
    pub controller: Did,
    /// Block of the last update; doubles as the nonce for the next
    /// rotation or removal payload.
    #[serde(rename = "lastUpdatedBlock")]
    pub last_updated_block: u64,
}

/// The document returned by DID resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    /// The resolved DID.
    pub id: Did,
    /// The currently-registered Ed25519 public key.
    #[serde(rename = "publicKey")]
    pub public_key: VerifyingKey,
    /// The controller DID.
    pub controller: Did,
}

impl DidDocument {
    /// The verification method DID URL for the registered key.
    pub fn verification_method(&self) -> String {
        format!("{}#keys-1", self.id)
    }
}

/// A key rotation payload, signed by the DID's current key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRotation {
    /// The DID being rotated.
    pub did: Did,
    /// The replacement public key.
    #[serde(rename = "newPublicKey")]
    pub new_public_key: VerifyingKey,
    /// The replacement controller.
    #[serde(rename = "newController")]
    pub new_controller: Did,
    /// The DID's last-update block as observed by the caller.
    pub nonce: u64,
}

impl KeyRotation {
    /// Canonical signing input for this rotation.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Sign this rotation with the DID's current key.
    pub fn sign(&self, current_key: &dyn KeyProvider) -> Result<Ed25519Signature, DidError> {
        Ok(current_key.sign(&self.signing_input()?)?)
    }
}

/// A DID removal payload, signed by the DID's current key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DidRemoval {
    /// The DID being removed.
    pub did: Did,
    /// The DID's last-update block as observed by the caller.
    pub nonce: u64,
}

impl DidRemoval {
    /// Canonical signing input for this removal.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Sign this removal with the DID's current key.
    pub fn sign(&self, current_key: &dyn KeyProvider) -> Result<Ed25519Signature, DidError> {
        Ok(current_key.sign(&self.signing_input()?)?)
    }
}

/// One entry per DID ever registered. Removal tombstones the entry so the
/// identifier can never be reused.
#[derive(Debug, Clone)]
enum DidEntry {
    Active(KeyRegistration),
    Tombstone,
}

/// The DID registry state. Owned by the ledger state machine; all
/// mutation flows through signed transactions.
#[derive(Debug, Default)]
pub(crate) struct DidRegistry {
    entries: BTreeMap<Did, DidEntry>,
}

impl DidRegistry {
    /// Register a fresh DID. Bootstrap operation — requires no signature.
    pub(crate) fn register(
        &mut self,
        did: Did,
        public_key: VerifyingKey,
        controller: Did,
        block: u64,
    ) -> Result<(), DidError> {
        if self.entries.contains_key(&did) {
            return Err(DidError::AlreadyExists(did));
        }
        self.entries.insert(
            did,
            DidEntry::Active(KeyRegistration {
                public_key,
                controller,
                last_updated_block: block,
            }),
        );
        Ok(())
    }

    /// Rotate the DID's key, verifying the payload signature against the
    /// currently registered key. Replaces the registration atomically.
    pub(crate) fn rotate(
        &mut self,
        rotation: &KeyRotation,
        signature: &Ed25519Signature,
        block: u64,
    ) -> Result<(), DidError> {
        let current = self.active(&rotation.did)?;
        if rotation.nonce != current.last_updated_block {
            return Err(DidError::StaleNonce {
                expected: current.last_updated_block,
                observed: rotation.nonce,
            });
        }
        let input = rotation.signing_input()?;
        current
            .public_key
            .verify(&input, signature)
            .map_err(|_| DidError::BadSignature(rotation.did.clone()))?;

        self.entries.insert(
            rotation.did.clone(),
            DidEntry::Active(KeyRegistration {
                public_key: rotation.new_public_key.clone(),
                controller: rotation.new_controller.clone(),
                last_updated_block: block,
            }),
        );
        Ok(())
    }

    /// Remove the DID, verifying the payload signature against the
    /// currently registered key. The entry is tombstoned.
    pub(crate) fn remove(
        &mut self,
        removal: &DidRemoval,
        signature: &Ed25519Signature,
    ) -> Result<(), DidError> {
        let current = self.active(&removal.did)?;
        if removal.nonce != current.last_updated_block {
            return Err(DidError::StaleNonce {
                expected: current.last_updated_block,
                observed: removal.nonce,
            });
        }
        let input = removal.signing_input()?;
        current
            .public_key
            .verify(&input, signature)
            .map_err(|_| DidError::BadSignature(removal.did.clone()))?;

        self.entries.insert(removal.did.clone(), DidEntry::Tombstone);
        Ok(())
    }

    /// Resolve a DID to its document.
    pub(crate) fn resolve(&self, did: &Did) -> Result<DidDocument, DidError> {
        let registration = self.active(did)?;
        Ok(DidDocument {
            id: did.clone(),
            public_key: registration.public_key.clone(),
            controller: registration.controller.clone(),
        })
    }

    /// The DID's last-update block, used as the nonce for the next
    /// rotation or removal payload.
    pub(crate) fn nonce(&self, did: &Did) -> Result<u64, DidError> {
        Ok(self.active(did)?.last_updated_block)
    }

    fn active(&self, did: &Did) -> Result<&KeyRegistration, DidError> {
        match self.entries.get(did) {
            Some(DidEntry::Active(registration)) => Ok(registration),
            // Tombstones resolve like never-registered DIDs.
            Some(DidEntry::Tombstone) | None => Err(DidError::NoSuchDid(did.clone())),
        }
    }
}
