//! # Revocation Registries
//!
//! A revocation registry is a named set of revoked identifiers gated by an
//! authorization [`Policy`]. Every mutation presents controller signatures
//! over a payload that includes the registry's current
//! `last_modified_block`; the block is bumped on success. A stale payload
//! (built against an earlier block) fails with [`RevocationError::StaleState`]
//! and the caller re-reads and retries — optimistic concurrency, not
//! locking.
//!
//! Registries created `add_only` are append-only: entries cannot be
//! unrevoked and the registry cannot be removed.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcl_core::{CanonicalBytes, CanonicalizationError, Did, RegistryId, RevokeId};
use vcl_crypto::{CryptoError, Ed25519Signature, KeyProvider};

use crate::did::DidRegistry;

/// Errors from revocation registry operations.
#[derive(Error, Debug)]
pub enum RevocationError {
    /// A registry with this identifier already exists.
    #[error("registry already exists: {0}")]
    AlreadyExists(RegistryId),

    /// No registry with this identifier.
    #[error("no such registry: {0}")]
    NoSuchRegistry(RegistryId),

    /// The presented signatures do not satisfy the registry policy.
    #[error("policy not satisfied: {0}")]
    PolicyNotSatisfied(String),

    /// The payload was built against an outdated `last_modified_block`.
    /// Expected under contention — re-read and retry.
    #[error("stale registry state: expected block {expected}, observed {observed}")]
    StaleState {
        /// The registry's current last-modified block.
        expected: u64,
        /// The block the caller observed.
        observed: u64,
    },

    /// The registry was created `add_only` and cannot be unrevoked from
    /// or removed.
    #[error("registry is add-only: {0}")]
    Immutable(RegistryId),

    /// Canonicalization of a signing payload failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// The signing backend failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),
}

/// Authorization rule determining which signers may mutate a registry.
///
/// `OneOf` is the only variant today; threshold (N-of-M) policies slot in
/// as further variants without changing the mutation contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// Satisfied by a valid signature from exactly one of the listed
    /// controller DIDs, checked against the controller's
    /// currently-registered key.
    OneOf(BTreeSet<Did>),
}

impl Policy {
    /// Build a `OneOf` policy from an iterator of controllers.
    pub fn one_of(controllers: impl IntoIterator<Item = Did>) -> Self {
        Policy::OneOf(controllers.into_iter().collect())
    }

    /// Check the presented signatures against this policy.
    ///
    /// Signatures are verified against each signer's currently-registered
    /// identity key — a controller whose DID was removed or rotated signs
    /// with the new key or not at all.
    pub(crate) fn check(
        &self,
        payload: &CanonicalBytes,
        proof: &[ControllerSignature],
        dids: &DidRegistry,
    ) -> Result<(), RevocationError> {
        match self {
            Policy::OneOf(controllers) => {
                if proof.len() != 1 {
                    return Err(RevocationError::PolicyNotSatisfied(format!(
                        "OneOf requires exactly one signature, got {}",
                        proof.len()
                    )));
                }
                let entry = &proof[0];
                if !controllers.contains(&entry.signer) {
                    return Err(RevocationError::PolicyNotSatisfied(format!(
                        "signer {} is not a registry controller",
                        entry.signer
                    )));
                }
                let doc = dids.resolve(&entry.signer).map_err(|e| {
                    RevocationError::PolicyNotSatisfied(format!(
                        "controller key resolution failed: {e}"
                    ))
                })?;
                doc.public_key
                    .verify(payload, &entry.signature)
                    .map_err(|_| {
                        RevocationError::PolicyNotSatisfied(format!(
                            "signature from {} does not verify",
                            entry.signer
                        ))
                    })
            }
        }
    }
}

/// A signature from a registry controller over a [`RegistryUpdate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSignature {
    /// The controller DID that produced the signature.
    pub signer: Did,
    /// Ed25519 signature over the update's canonical signing input.
    pub signature: Ed25519Signature,
}

/// The kind of registry mutation a payload authorizes.
///
/// Carried inside the signed payload so a signature for one action cannot
/// be replayed as another at the same block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryAction {
    /// Add identifiers to the revoked set.
    Revoke,
    /// Remove identifiers from the revoked set.
    Unrevoke,
    /// Delete the whole registry.
    Remove,
}

/// A fenced, signable registry mutation payload.
///
/// `last_modified_block` is the registry state the caller observed; the
/// ledger rejects the update with [`RevocationError::StaleState`] if the
/// registry has moved on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryUpdate {
    /// The target registry.
    #[serde(rename = "registryId")]
    pub registry_id: RegistryId,
    /// The mutation this payload authorizes.
    pub action: RegistryAction,
    /// The identifiers to revoke or unrevoke. Empty for removal.
    #[serde(rename = "revokeIds")]
    pub revoke_ids: BTreeSet<RevokeId>,
    /// The registry's last-modified block as observed by the caller.
    #[serde(rename = "lastModifiedBlock")]
    pub last_modified_block: u64,
}

impl RegistryUpdate {
    /// Build a revoke payload.
    pub fn revoke(
        registry_id: RegistryId,
        revoke_ids: impl IntoIterator<Item = RevokeId>,
        last_modified_block: u64,
    ) -> Self {
        Self {
            registry_id,
            action: RegistryAction::Revoke,
            revoke_ids: revoke_ids.into_iter().collect(),
            last_modified_block,
        }
    }

    /// Build an unrevoke payload.
    pub fn unrevoke(
        registry_id: RegistryId,
        revoke_ids: impl IntoIterator<Item = RevokeId>,
        last_modified_block: u64,
    ) -> Self {
        Self {
            registry_id,
            action: RegistryAction::Unrevoke,
            revoke_ids: revoke_ids.into_iter().collect(),
            last_modified_block,
        }
    }

    /// Build a registry removal payload.
    pub fn removal(registry_id: RegistryId, last_modified_block: u64) -> Self {
        Self {
            registry_id,
            action: RegistryAction::Remove,
            revoke_ids: BTreeSet::new(),
            last_modified_block,
        }
    }

    /// Canonical signing input for this update.
    pub fn signing_input(&self) -> Result<CanonicalBytes, CanonicalizationError> {
        CanonicalBytes::new(self)
    }

    /// Sign this update as the given controller.
    pub fn sign(
        &self,
        signer: Did,
        key: &dyn KeyProvider,
    ) -> Result<ControllerSignature, RevocationError> {
        let signature = key.sign(&self.signing_input()?)?;
        Ok(ControllerSignature { signer, signature })
    }
}

/// A single revocation registry: policy, revoked set, and fence block.
#[derive(Debug, Clone)]
pub struct RevocationRegistry {
    policy: Policy,
    add_only: bool,
    revoked: BTreeSet<RevokeId>,
    last_modified_block: u64,
}

impl RevocationRegistry {
    /// The registry's authorization policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Whether the registry is append-only.
    pub fn add_only(&self) -> bool {
        self.add_only
    }

    /// The block of the registry's last accepted mutation.
    pub fn last_modified_block(&self) -> u64 {
        self.last_modified_block
    }

    /// The number of revoked identifiers.
    pub fn revoked_len(&self) -> usize {
        self.revoked.len()
    }
}

/// All revocation registries. Owned by the ledger state machine.
#[derive(Debug, Default)]
pub(crate) struct RevocationRegistries {
    registries: BTreeMap<RegistryId, RevocationRegistry>,
}

impl RevocationRegistries {
    /// Create a registry. Requires no signature — the policy binds all
    /// subsequent mutations.
    pub(crate) fn create(
        &mut self,
        id: RegistryId,
        policy: Policy,
        add_only: bool,
        block: u64,
    ) -> Result<(), RevocationError> {
        if self.registries.contains_key(&id) {
            return Err(RevocationError::AlreadyExists(id));
        }
        self.registries.insert(
            id,
            RevocationRegistry {
                policy,
                add_only,
                revoked: BTreeSet::new(),
                last_modified_block: block,
            },
        );
        Ok(())
    }

    /// Union `revoke_ids` into the revoked set. Idempotent: revoking an
    /// already-revoked identifier is a no-op success, but every accepted
    /// mutation still bumps the fence block.
    pub(crate) fn revoke(
        &mut self,
        update: &RegistryUpdate,
        proof: &[ControllerSignature],
        dids: &DidRegistry,
        block: u64,
    ) -> Result<(), RevocationError> {
        let payload = update.signing_input()?;
        let registry = Self::fenced(&mut self.registries, update)?;
        registry.policy.check(&payload, proof, dids)?;

        registry.revoked.extend(update.revoke_ids.iter().copied());
        registry.last_modified_block = block;
        Ok(())
    }

    /// Subtract `revoke_ids` from the revoked set. Idempotent; rejected
    /// for add-only registries.
    pub(crate) fn unrevoke(
        &mut self,
        update: &RegistryUpdate,
        proof: &[ControllerSignature],
        dids: &DidRegistry,
        block: u64,
    ) -> Result<(), RevocationError> {
        let payload = update.signing_input()?;
        let registry = Self::fenced(&mut self.registries, update)?;
        if registry.add_only {
            return Err(RevocationError::Immutable(update.registry_id));
        }
        registry.policy.check(&payload, proof, dids)?;

        for id in &update.revoke_ids {
            registry.revoked.remove(id);
        }
        registry.last_modified_block = block;
        Ok(())
    }

    /// Delete the registry. Rejected for add-only registries; the caller
    /// must present the current fence block (optimistic concurrency).
    pub(crate) fn remove(
        &mut self,
        update: &RegistryUpdate,
        proof: &[ControllerSignature],
        dids: &DidRegistry,
    ) -> Result<(), RevocationError> {
        let payload = update.signing_input()?;
        let registry = Self::fenced(&mut self.registries, update)?;
        if registry.add_only {
            return Err(RevocationError::Immutable(update.registry_id));
        }
        registry.policy.check(&payload, proof, dids)?;

        self.registries.remove(&update.registry_id);
        Ok(())
    }

    /// Whether `revoke_id` is revoked in the registry. Unsigned read.
    pub(crate) fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revoke_id: &RevokeId,
    ) -> Result<bool, RevocationError> {
        let registry = self
            .registries
            .get(registry_id)
            .ok_or(RevocationError::NoSuchRegistry(*registry_id))?;
        Ok(registry.revoked.contains(revoke_id))
    }

    /// The registry's current fence block, for building update payloads.
    pub(crate) fn last_modified_block(
        &self,
        registry_id: &RegistryId,
    ) -> Result<u64, RevocationError> {
        Ok(self
            .registries
            .get(registry_id)
            .ok_or(RevocationError::NoSuchRegistry(*registry_id))?
            .last_modified_block)
    }

    /// Read-only view of a registry.
    pub(crate) fn get(&self, registry_id: &RegistryId) -> Option<&RevocationRegistry> {
        self.registries.get(registry_id)
    }

    /// Look up the registry and enforce the staleness fence.
    fn fenced<'a>(
        registries: &'a mut BTreeMap<RegistryId, RevocationRegistry>,
        update: &RegistryUpdate,
    ) -> Result<&'a mut RevocationRegistry, RevocationError> {
        let registry = registries
            .get_mut(&update.registry_id)
            .ok_or(RevocationError::NoSuchRegistry(update.registry_id))?;
        if update.last_modified_block != registry.last_modified_block {
            return Err(RevocationError::StaleState {
                expected: registry.last_modified_block,
                observed: update.last_modified_block,
            });
        }
        Ok(registry)
    }
}
