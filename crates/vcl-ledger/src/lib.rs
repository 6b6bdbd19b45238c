#![deny(missing_docs)]

//! # vcl-ledger — Ledger State Machine for the VCL Stack
//!
//! An in-process model of the distributed ledger client the rest of the
//! stack is written against. Three stores live behind one ledger:
//!
//! - **DID registry** — identifier → current key + controller, with
//!   signed rotation and removal.
//! - **Revocation registries** — policy-gated revoked-sets with
//!   last-modified-block fencing.
//! - **Blob store** — write-once content keyed by random identifiers.
//!
//! ## Concurrency Model
//!
//! All mutations flow through [`Ledger::submit()`] as discrete signed
//! [`Transaction`]s, applied under a single write lock in total order —
//! each transaction is atomic from the caller's perspective, and failures
//! are side-effect-free. Reads take the shared lock and may be issued with
//! unbounded concurrency. Callers treat `StaleState`/`StaleNonce` failures
//! as expected under contention and retry with freshly-read state.

pub mod blob;
pub mod did;
pub mod revocation;
pub mod transaction;

pub use blob::{Blob, BlobError, StoredBlob, MAX_BLOB_BYTES};
pub use did::{DidDocument, DidError, DidRemoval, KeyRegistration, KeyRotation};
pub use revocation::{
    ControllerSignature, Policy, RegistryAction, RegistryUpdate, RevocationError,
};
pub use transaction::{LedgerError, Receipt, Transaction};

use parking_lot::RwLock;

use vcl_core::{BlobId, Did, RegistryId, RevokeId};

use blob::BlobStore;
use did::DidRegistry;
use revocation::{RevocationRegistries, RevocationRegistry};

/// The complete ledger state, guarded by a single writer lock.
#[derive(Default)]
struct LedgerState {
    block_height: u64,
    dids: DidRegistry,
    registries: RevocationRegistries,
    blobs: BlobStore,
}

/// The ledger: a single globally-serialized writer over DID, revocation,
/// and blob state.
#[derive(Default)]
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Create an empty ledger at block height zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a signed transaction.
    ///
    /// Applied atomically in total submission order. On success the block
    /// height is bumped and returned in the [`Receipt`]; on failure the
    /// ledger state is untouched.
    pub fn submit(&self, tx: Transaction) -> Result<Receipt, LedgerError> {
        let mut state = self.state.write();
        let block = state.block_height + 1;

        match &tx {
            Transaction::DidRegister {
                did,
                public_key,
                controller,
            } => {
                state
                    .dids
                    .register(did.clone(), public_key.clone(), controller.clone(), block)?;
            }
            Transaction::DidRotate {
                rotation,
                signature,
            } => {
                state.dids.rotate(rotation, signature, block)?;
            }
            Transaction::DidRemove { removal, signature } => {
                state.dids.remove(removal, signature)?;
            }
            Transaction::RegistryCreate {
                id,
                policy,
                add_only,
            } => {
                state
                    .registries
                    .create(*id, policy.clone(), *add_only, block)?;
            }
            Transaction::Revoke { update, proof } => {
                require_action(update, RegistryAction::Revoke)?;
                let LedgerState {
                    registries, dids, ..
                } = &mut *state;
                registries.revoke(update, proof, dids, block)?;
            }
            Transaction::Unrevoke { update, proof } => {
                require_action(update, RegistryAction::Unrevoke)?;
                let LedgerState {
                    registries, dids, ..
                } = &mut *state;
                registries.unrevoke(update, proof, dids, block)?;
            }
            Transaction::RegistryRemove { update, proof } => {
                require_action(update, RegistryAction::Remove)?;
                let LedgerState {
                    registries, dids, ..
                } = &mut *state;
                registries.remove(update, proof, dids)?;
            }
            Transaction::BlobStore { blob, signature } => {
                let LedgerState { blobs, dids, .. } = &mut *state;
                let doc = dids.resolve(&blob.author)?;
                let input = blob.signing_input()?;
                doc.public_key
                    .verify(&input, signature)
                    .map_err(|_| DidError::BadSignature(blob.author.clone()))?;
                blobs.put(blob.clone())?;
            }
        }

        state.block_height = block;
        tracing::debug!(block, kind = tx.kind(), "ledger transaction applied");
        Ok(Receipt { block })
    }

    // -- Reads: non-blocking point-in-time queries --------------------------

    /// Resolve a DID to its document.
    pub fn resolve_did(&self, did: &Did) -> Result<DidDocument, DidError> {
        self.state.read().dids.resolve(did)
    }

    /// The DID's last-update block, used as the nonce for rotation and
    /// removal payloads.
    pub fn did_nonce(&self, did: &Did) -> Result<u64, DidError> {
        self.state.read().dids.nonce(did)
    }

    /// Whether `revoke_id` is revoked in the registry. Unsigned read.
    pub fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revoke_id: &RevokeId,
    ) -> Result<bool, RevocationError> {
        self.state.read().registries.get_is_revoked(registry_id, revoke_id)
    }

    /// The registry's last-modified block, for building fenced update
    /// payloads.
    pub fn registry_last_modified(&self, registry_id: &RegistryId) -> Result<u64, RevocationError> {
        self.state.read().registries.last_modified_block(registry_id)
    }

    /// A snapshot of a registry's public state, if it exists.
    pub fn get_registry(&self, registry_id: &RegistryId) -> Option<RevocationRegistry> {
        self.state.read().registries.get(registry_id).cloned()
    }

    /// Fetch a stored blob's payload and author.
    pub fn get_blob(&self, id: &BlobId) -> Result<StoredBlob, BlobError> {
        self.state.read().blobs.get(id).cloned()
    }

    /// The current block height (number of applied transactions).
    pub fn block_height(&self) -> u64 {
        self.state.read().block_height
    }
}

fn require_action(update: &RegistryUpdate, expected: RegistryAction) -> Result<(), LedgerError> {
    if update.action != expected {
        return Err(LedgerError::Malformed(format!(
            "registry update action {:?} does not match transaction kind {:?}",
            update.action, expected
        )));
    }
    Ok(())
}
