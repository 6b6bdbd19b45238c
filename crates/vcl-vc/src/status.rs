//! # Credential Status and Revocation Lookup
//!
//! [`CredentialStatus`] points a credential at the revocation registry
//! that governs it. [`RevocationLookup`] is the capability the verifier
//! uses to ask whether a derived revocation id is revoked; the in-process
//! ledger implements it directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vcl_core::{RegistryId, RevokeId};
use vcl_ledger::{Ledger, RevocationError};

/// The `type` value carried by registry-backed credential statuses.
pub const REVOCATION_STATUS_KIND: &str = "VclRevocationRegistry";

/// Points a credential at the revocation registry governing it.
///
/// The verifier checks the registry whenever a status is present and a
/// [`RevocationLookup`] is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    /// The governing registry.
    pub id: RegistryId,
    /// The status mechanism kind.
    #[serde(rename = "type")]
    pub kind: String,
}

impl CredentialStatus {
    /// Build a registry-backed status for the given registry.
    pub fn revocation(registry_id: RegistryId) -> Self {
        Self {
            id: registry_id,
            kind: REVOCATION_STATUS_KIND.to_string(),
        }
    }
}

/// Errors from revocation status lookups.
#[derive(Error, Debug)]
pub enum StatusError {
    /// The status points at a registry that does not exist.
    #[error("no such registry: {0}")]
    NoSuchRegistry(RegistryId),

    /// The lookup backend was unreachable.
    #[error("status lookup unavailable: {0}")]
    Unavailable(String),

    /// The lookup timed out or was cancelled.
    #[error("status lookup timed out: {0}")]
    Timeout(String),
}

/// Capability for checking revocation state during verification.
#[async_trait]
pub trait RevocationLookup: Send + Sync {
    /// Whether `revoke_id` is revoked in the registry.
    async fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revoke_id: &RevokeId,
    ) -> Result<bool, StatusError>;
}

#[async_trait]
impl RevocationLookup for Ledger {
    async fn get_is_revoked(
        &self,
        registry_id: &RegistryId,
        revoke_id: &RevokeId,
    ) -> Result<bool, StatusError> {
        match Ledger::get_is_revoked(self, registry_id, revoke_id) {
            Ok(revoked) => Ok(revoked),
            Err(RevocationError::NoSuchRegistry(id)) => Err(StatusError::NoSuchRegistry(id)),
            Err(e) => Err(StatusError::Unavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_field_names() {
        let status = CredentialStatus::revocation(RegistryId::from_bytes([1u8; 32]));
        let val = serde_json::to_value(&status).unwrap();
        assert_eq!(val["type"], REVOCATION_STATUS_KIND);
        assert!(val["id"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn status_serde_roundtrip() {
        let status = CredentialStatus::revocation(RegistryId::random());
        let json = serde_json::to_string(&status).unwrap();
        let back: CredentialStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[tokio::test]
    async fn ledger_lookup_missing_registry() {
        let ledger = Ledger::new();
        let result = RevocationLookup::get_is_revoked(
            &ledger,
            &RegistryId::random(),
            &RevokeId::random(),
        )
        .await;
        assert!(matches!(result, Err(StatusError::NoSuchRegistry(_))));
    }
}
