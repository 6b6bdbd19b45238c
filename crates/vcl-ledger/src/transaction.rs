//! # Ledger Transaction Contract
//!
//! Every mutation of ledger state is expressed as a [`Transaction`] and
//! submitted through [`Ledger::submit()`](crate::Ledger::submit). Each
//! successful submission is a discrete, atomic state transition that bumps
//! the ledger block height; failures leave state untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcl_core::{CanonicalizationError, Did, RegistryId};
use vcl_crypto::{Ed25519Signature, VerifyingKey};

use crate::blob::{Blob, BlobError};
use crate::did::{DidError, DidRemoval, KeyRotation};
use crate::revocation::{ControllerSignature, Policy, RegistryUpdate, RevocationError};

/// Errors from ledger transaction submission.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// DID registry failure.
    #[error("DID registry: {0}")]
    Did(#[from] DidError),

    /// Revocation registry failure.
    #[error("revocation registry: {0}")]
    Revocation(#[from] RevocationError),

    /// Blob store failure.
    #[error("blob store: {0}")]
    Blob(#[from] BlobError),

    /// The transaction is internally inconsistent (e.g. an update payload
    /// whose action does not match the transaction variant).
    #[error("malformed transaction: {0}")]
    Malformed(String),

    /// Canonicalization of a signing payload failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// A signed mutation request for the ledger state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Transaction {
    /// Register a fresh DID. Bootstrap — no prior signature required.
    DidRegister {
        /// The DID to register.
        did: Did,
        /// The initial public key.
        public_key: VerifyingKey,
        /// The controller (usually the DID itself).
        controller: Did,
    },

    /// Rotate a DID's key, signed by the current key.
    DidRotate {
        /// The rotation payload.
        rotation: KeyRotation,
        /// Signature by the currently-registered key.
        signature: Ed25519Signature,
    },

    /// Remove a DID, signed by the current key.
    DidRemove {
        /// The removal payload.
        removal: DidRemoval,
        /// Signature by the currently-registered key.
        signature: Ed25519Signature,
    },

    /// Create a revocation registry.
    RegistryCreate {
        /// The registry identifier.
        id: RegistryId,
        /// The authorization policy for all subsequent mutations.
        policy: Policy,
        /// Append-only mode: disables unrevoke and registry removal.
        add_only: bool,
    },

    /// Add identifiers to a registry's revoked set.
    Revoke {
        /// The fenced update payload (action must be `revoke`).
        update: RegistryUpdate,
        /// Policy-satisfying controller signatures.
        proof: Vec<ControllerSignature>,
    },

    /// Remove identifiers from a registry's revoked set.
    Unrevoke {
        /// The fenced update payload (action must be `unrevoke`).
        update: RegistryUpdate,
        /// Policy-satisfying controller signatures.
        proof: Vec<ControllerSignature>,
    },

    /// Delete a revocation registry.
    RegistryRemove {
        /// The fenced update payload (action must be `remove`).
        update: RegistryUpdate,
        /// Policy-satisfying controller signatures.
        proof: Vec<ControllerSignature>,
    },

    /// Store a write-once blob, signed by the author's current key.
    BlobStore {
        /// The blob to store.
        blob: Blob,
        /// Signature by the author's currently-registered key.
        signature: Ed25519Signature,
    },
}

impl Transaction {
    /// Short transaction kind label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::DidRegister { .. } => "did_register",
            Transaction::DidRotate { .. } => "did_rotate",
            Transaction::DidRemove { .. } => "did_remove",
            Transaction::RegistryCreate { .. } => "registry_create",
            Transaction::Revoke { .. } => "revoke",
            Transaction::Unrevoke { .. } => "unrevoke",
            Transaction::RegistryRemove { .. } => "registry_remove",
            Transaction::BlobStore { .. } => "blob_store",
        }
    }
}

/// Acknowledgement of an applied transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The block at which the transaction was applied.
    pub block: u64,
}
