//! # Revocation Registry Properties
//!
//! Idempotence, round-trips, optimistic-concurrency fencing, and
//! append-only mode, all exercised through the ledger transaction
//! contract.

use rand_core::OsRng;

use vcl_core::{Did, RegistryId, RevokeId};
use vcl_crypto::SigningKey;
use vcl_ledger::{
    Ledger, LedgerError, Policy, RegistryUpdate, RevocationError, Transaction,
};

struct World {
    ledger: Ledger,
    controller: Did,
    key: SigningKey,
    registry_id: RegistryId,
}

fn world(add_only: bool) -> World {
    let ledger = Ledger::new();
    let controller = Did::random("vcl").unwrap();
    let key = SigningKey::generate(&mut OsRng);
    ledger
        .submit(Transaction::DidRegister {
            did: controller.clone(),
            public_key: key.verifying_key(),
            controller: controller.clone(),
        })
        .unwrap();

    let registry_id = RegistryId::random();
    ledger
        .submit(Transaction::RegistryCreate {
            id: registry_id,
            policy: Policy::one_of([controller.clone()]),
            add_only,
        })
        .unwrap();

    World {
        ledger,
        controller,
        key,
        registry_id,
    }
}

impl World {
    fn revoke(&self, ids: impl IntoIterator<Item = RevokeId>) -> Result<(), LedgerError> {
        let update = RegistryUpdate::revoke(
            self.registry_id,
            ids,
            self.ledger.registry_last_modified(&self.registry_id).unwrap(),
        );
        let proof = vec![update.sign(self.controller.clone(), &self.key).unwrap()];
        self.ledger
            .submit(Transaction::Revoke { update, proof })
            .map(|_| ())
    }

    fn unrevoke(&self, ids: impl IntoIterator<Item = RevokeId>) -> Result<(), LedgerError> {
        let update = RegistryUpdate::unrevoke(
            self.registry_id,
            ids,
            self.ledger.registry_last_modified(&self.registry_id).unwrap(),
        );
        let proof = vec![update.sign(self.controller.clone(), &self.key).unwrap()];
        self.ledger
            .submit(Transaction::Unrevoke { update, proof })
            .map(|_| ())
    }

    fn is_revoked(&self, id: &RevokeId) -> bool {
        self.ledger.get_is_revoked(&self.registry_id, id).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Idempotence and round-trips
// ---------------------------------------------------------------------------

#[test]
fn revoke_twice_equals_revoke_once() {
    let w = world(false);
    let id = RevokeId::random();

    w.revoke([id]).unwrap();
    let registry_after_first = w.ledger.get_registry(&w.registry_id).unwrap();

    w.revoke([id]).unwrap();
    let registry_after_second = w.ledger.get_registry(&w.registry_id).unwrap();

    assert!(w.is_revoked(&id));
    assert_eq!(
        registry_after_first.revoked_len(),
        registry_after_second.revoked_len()
    );
}

#[test]
fn unrevoke_on_never_revoked_id_is_noop_success() {
    let w = world(false);
    let id = RevokeId::random();
    w.unrevoke([id]).unwrap();
    assert!(!w.is_revoked(&id));
}

#[test]
fn unrevoke_undoes_revoke() {
    let w = world(false);
    let id = RevokeId::random();

    w.revoke([id]).unwrap();
    assert!(w.is_revoked(&id));

    w.unrevoke([id]).unwrap();
    assert!(!w.is_revoked(&id));
}

#[test]
fn get_is_revoked_requires_no_signature() {
    let w = world(false);
    let id = RevokeId::random();
    w.revoke([id]).unwrap();

    // A pure read against a fresh handle, no keys involved.
    assert!(w.ledger.get_is_revoked(&w.registry_id, &id).unwrap());
}

// ---------------------------------------------------------------------------
// Staleness fencing
// ---------------------------------------------------------------------------

#[test]
fn removal_against_outdated_block_fails_stale() {
    let w = world(false);
    let observed = w.ledger.registry_last_modified(&w.registry_id).unwrap();

    // Another controller's revoke lands before the removal does.
    w.revoke([RevokeId::random()]).unwrap();

    let update = RegistryUpdate::removal(w.registry_id, observed);
    let proof = vec![update.sign(w.controller.clone(), &w.key).unwrap()];
    let result = w.ledger.submit(Transaction::RegistryRemove { update, proof });
    assert!(matches!(
        result,
        Err(LedgerError::Revocation(RevocationError::StaleState { .. }))
    ));

    // The loser re-reads and retries successfully.
    let update = RegistryUpdate::removal(
        w.registry_id,
        w.ledger.registry_last_modified(&w.registry_id).unwrap(),
    );
    let proof = vec![update.sign(w.controller.clone(), &w.key).unwrap()];
    w.ledger
        .submit(Transaction::RegistryRemove { update, proof })
        .unwrap();
}

#[test]
fn only_first_of_two_racing_removals_succeeds() {
    let w = world(false);
    let observed = w.ledger.registry_last_modified(&w.registry_id).unwrap();

    // Two callers observe the same block and both build removal payloads.
    let first = RegistryUpdate::removal(w.registry_id, observed);
    let first_proof = vec![first.sign(w.controller.clone(), &w.key).unwrap()];
    let second = RegistryUpdate::removal(w.registry_id, observed);
    let second_proof = vec![second.sign(w.controller.clone(), &w.key).unwrap()];

    w.ledger
        .submit(Transaction::RegistryRemove {
            update: first,
            proof: first_proof,
        })
        .unwrap();

    // The registry is gone by the time the second submission is applied.
    let result = w.ledger.submit(Transaction::RegistryRemove {
        update: second,
        proof: second_proof,
    });
    assert!(result.is_err());
}

#[test]
fn stale_revoke_fails_and_retry_succeeds() {
    let w = world(false);
    let stale_block = w.ledger.registry_last_modified(&w.registry_id).unwrap();

    // Move the registry forward.
    w.revoke([RevokeId::random()]).unwrap();

    // A payload built against the old block loses.
    let id = RevokeId::random();
    let update = RegistryUpdate::revoke(w.registry_id, [id], stale_block);
    let proof = vec![update.sign(w.controller.clone(), &w.key).unwrap()];
    assert!(matches!(
        w.ledger.submit(Transaction::Revoke { update, proof }),
        Err(LedgerError::Revocation(RevocationError::StaleState { .. }))
    ));

    // Retrying with freshly-read state succeeds.
    w.revoke([id]).unwrap();
    assert!(w.is_revoked(&id));
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

#[test]
fn outsider_cannot_revoke() {
    let w = world(false);
    let outsider = Did::random("vcl").unwrap();
    let outsider_key = SigningKey::generate(&mut OsRng);
    w.ledger
        .submit(Transaction::DidRegister {
            did: outsider.clone(),
            public_key: outsider_key.verifying_key(),
            controller: outsider.clone(),
        })
        .unwrap();

    let update = RegistryUpdate::revoke(
        w.registry_id,
        [RevokeId::random()],
        w.ledger.registry_last_modified(&w.registry_id).unwrap(),
    );
    let proof = vec![update.sign(outsider, &outsider_key).unwrap()];
    assert!(matches!(
        w.ledger.submit(Transaction::Revoke { update, proof }),
        Err(LedgerError::Revocation(
            RevocationError::PolicyNotSatisfied(_)
        ))
    ));
}

#[test]
fn mutation_on_missing_registry_fails_no_such_registry() {
    let w = world(false);
    let ghost = RegistryId::random();

    let update = RegistryUpdate::revoke(ghost, [RevokeId::random()], 0);
    let proof = vec![update.sign(w.controller.clone(), &w.key).unwrap()];
    assert!(matches!(
        w.ledger.submit(Transaction::Revoke { update, proof }),
        Err(LedgerError::Revocation(RevocationError::NoSuchRegistry(_)))
    ));
}

// ---------------------------------------------------------------------------
// Append-only mode
// ---------------------------------------------------------------------------

#[test]
fn add_only_registry_cannot_be_removed() {
    let w = world(true);
    let update = RegistryUpdate::removal(
        w.registry_id,
        w.ledger.registry_last_modified(&w.registry_id).unwrap(),
    );
    let proof = vec![update.sign(w.controller.clone(), &w.key).unwrap()];
    assert!(matches!(
        w.ledger.submit(Transaction::RegistryRemove { update, proof }),
        Err(LedgerError::Revocation(RevocationError::Immutable(_)))
    ));
}

#[test]
fn add_only_registry_cannot_unrevoke() {
    let w = world(true);
    let id = RevokeId::random();
    w.revoke([id]).unwrap();

    assert!(matches!(
        w.unrevoke([id]),
        Err(LedgerError::Revocation(RevocationError::Immutable(_)))
    ));
    assert!(w.is_revoked(&id));
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

#[test]
fn multiple_ids_revoked_in_one_transaction() {
    let w = world(false);
    let ids = [RevokeId::random(), RevokeId::random(), RevokeId::random()];

    let height_before = w.ledger.block_height();
    w.revoke(ids).unwrap();
    assert_eq!(w.ledger.block_height(), height_before + 1);

    for id in &ids {
        assert!(w.is_revoked(id));
    }
}
