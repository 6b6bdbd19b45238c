//! # Detached Proofs
//!
//! The cryptographic proof structure attached to credentials and
//! presentations. A proof binds the canonical serialization of every field
//! of its document except the proof itself.
//!
//! Presentation proofs additionally record the `challenge` and `domain`
//! they were signed against, so a verifier can reject a replayed or
//! re-targeted presentation before touching the signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vcl_core::Timestamp;

/// The type of cryptographic proof.
///
/// Ed25519 over canonical bytes is the only scheme in use; further schemes
/// slot in as additional variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// Ed25519 digital signature per the W3C VC Data Integrity spec.
    Ed25519Signature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::Ed25519Signature2020 => write!(f, "Ed25519Signature2020"),
        }
    }
}

/// The purpose of a cryptographic proof.
///
/// Follows the W3C VC Data Integrity proof purpose vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims are true.
    AssertionMethod,
    /// Authentication of the presentation holder.
    Authentication,
}

impl std::fmt::Display for ProofPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofPurpose::AssertionMethod => write!(f, "assertionMethod"),
            ProofPurpose::Authentication => write!(f, "authentication"),
        }
    }
}

/// A detached proof on a credential or presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// The proof type.
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// When the proof was created (UTC).
    pub created: DateTime<Utc>,

    /// The verification method — a DID URL identifying the signing key.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    /// The purpose of this proof.
    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    /// The proof value — hex-encoded Ed25519 signature (128 hex chars).
    #[serde(rename = "proofValue")]
    pub proof_value: String,

    /// The challenge the holder signed against (presentations only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// The intended audience domain (presentations only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Proof {
    /// Create an issuer assertion proof.
    pub fn assertion(
        verification_method: String,
        proof_value: String,
        created: Option<Timestamp>,
    ) -> Self {
        let ts = created.unwrap_or_else(Timestamp::now);
        Self {
            proof_type: ProofType::Ed25519Signature2020,
            created: *ts.as_datetime(),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value,
            challenge: None,
            domain: None,
        }
    }

    /// Create a holder authentication proof bound to a challenge and
    /// domain.
    pub fn authentication(
        verification_method: String,
        proof_value: String,
        challenge: String,
        domain: String,
        created: Option<Timestamp>,
    ) -> Self {
        let ts = created.unwrap_or_else(Timestamp::now);
        Self {
            proof_type: ProofType::Ed25519Signature2020,
            created: *ts.as_datetime(),
            verification_method,
            proof_purpose: ProofPurpose::Authentication,
            proof_value,
            challenge: Some(challenge),
            domain: Some(domain),
        }
    }
}
