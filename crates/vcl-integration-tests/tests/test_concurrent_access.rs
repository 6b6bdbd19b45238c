//! # Concurrency Model
//!
//! The ledger serializes writers; readers run with unbounded concurrency;
//! contended mutations fail with staleness errors and succeed on retry
//! with freshly-read state.

use std::sync::Arc;
use std::thread;

use rand_core::OsRng;
use serde_json::json;

use vcl_core::{Did, RegistryId, RevokeId};
use vcl_crypto::SigningKey;
use vcl_ledger::{Ledger, LedgerError, Policy, RegistryUpdate, RevocationError, Transaction};
use vcl_resolver::LedgerResolver;
use vcl_vc::{VerifiableCredential, VerifyOptions};

fn controller(ledger: &Ledger) -> (Did, SigningKey) {
    let did = Did::random("vcl").unwrap();
    let key = SigningKey::generate(&mut OsRng);
    ledger
        .submit(Transaction::DidRegister {
            did: did.clone(),
            public_key: key.verifying_key(),
            controller: did.clone(),
        })
        .unwrap();
    (did, key)
}

#[test]
fn contended_revokes_converge_with_retry() {
    let ledger = Arc::new(Ledger::new());
    let (did, key) = controller(&ledger);
    let key = Arc::new(key);

    let registry_id = RegistryId::random();
    ledger
        .submit(Transaction::RegistryCreate {
            id: registry_id,
            policy: Policy::one_of([did.clone()]),
            add_only: false,
        })
        .unwrap();

    let ids: Vec<RevokeId> = (0..8).map(|_| RevokeId::random()).collect();
    let handles: Vec<_> = ids
        .iter()
        .map(|revoke_id| {
            let ledger = ledger.clone();
            let did = did.clone();
            let key = key.clone();
            let revoke_id = *revoke_id;
            thread::spawn(move || {
                // Optimistic concurrency: re-read and retry on staleness.
                loop {
                    let update = RegistryUpdate::revoke(
                        registry_id,
                        [revoke_id],
                        ledger.registry_last_modified(&registry_id).unwrap(),
                    );
                    let proof = vec![update.sign(did.clone(), key.as_ref()).unwrap()];
                    match ledger.submit(Transaction::Revoke { update, proof }) {
                        Ok(_) => break,
                        Err(LedgerError::Revocation(RevocationError::StaleState {
                            ..
                        })) => continue,
                        Err(e) => panic!("unexpected error under contention: {e}"),
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in &ids {
        assert!(ledger.get_is_revoked(&registry_id, id).unwrap());
    }
    assert_eq!(
        ledger.get_registry(&registry_id).unwrap().revoked_len(),
        ids.len()
    );
}

#[test]
fn reads_run_alongside_writes() {
    let ledger = Arc::new(Ledger::new());
    let (did, key) = controller(&ledger);

    let registry_id = RegistryId::random();
    ledger
        .submit(Transaction::RegistryCreate {
            id: registry_id,
            policy: Policy::one_of([did.clone()]),
            add_only: false,
        })
        .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            let did = did.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    // Point-in-time reads; never block on each other.
                    let _ = ledger.resolve_did(&did).unwrap();
                    let _ = ledger
                        .get_is_revoked(&registry_id, &RevokeId::random())
                        .unwrap();
                }
            })
        })
        .collect();

    // One writer advancing the registry underneath the readers.
    for _ in 0..20 {
        let update = RegistryUpdate::revoke(
            registry_id,
            [RevokeId::random()],
            ledger.registry_last_modified(&registry_id).unwrap(),
        );
        let proof = vec![update.sign(did.clone(), &key).unwrap()];
        ledger.submit(Transaction::Revoke { update, proof }).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}

#[tokio::test]
async fn independent_credentials_verify_in_parallel() {
    let ledger = Arc::new(Ledger::new());
    let (did, key) = controller(&ledger);
    let vm = ledger.resolve_did(&did).unwrap().verification_method();
    let resolver = Arc::new(LedgerResolver::new(ledger.clone(), "vcl"));

    let credentials: Vec<VerifiableCredential> = (0..8)
        .map(|i| {
            let mut vc = VerifiableCredential::new(format!("urn:vcl:vc:parallel:{i}"));
            vc.add_subject(json!({"id": format!("did:vcl:0xholder{i}")}))
                .unwrap();
            vc.sign(&key, vm.clone()).unwrap();
            vc
        })
        .collect();

    let tasks: Vec<_> = credentials
        .into_iter()
        .map(|vc| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let options = VerifyOptions::new(resolver.as_ref());
                vc.verify(&options).await.unwrap()
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap();
        assert!(result.verified, "errors: {:?}", result.errors);
    }
}
