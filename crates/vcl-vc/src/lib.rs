#![deny(missing_docs)]

//! # vcl-vc — Verifiable Credentials for the VCL Stack
//!
//! Credentials and presentations with detached Ed25519 proofs over
//! canonical bytes, plus the capabilities verification consumes:
//!
//! - [`VerifiableCredential`] — builder-style construction, signing, and
//!   the verification state machine (`Unsigned → Signed →
//!   VerifiedValid/VerifiedInvalid`).
//! - [`VerifiablePresentation`] — holder-signed credential bundles bound
//!   to a challenge and domain.
//! - [`CredentialStatus`] / [`RevocationLookup`] — revocation registry
//!   binding and the status-check capability.
//! - [`Schema`] / [`SchemaSource`] — blob-stored JSON Schemas and the
//!   fetch capability.
//!
//! Verification separates reported outcomes from hard errors: semantic
//! failures (bad signature, revoked, expired, schema violation)
//! accumulate in a [`VerificationResult`] with `verified: false`, while
//! hard `Err` is reserved for structurally malformed documents.

pub mod credential;
pub mod presentation;
pub mod proof;
pub mod schema;
pub mod status;

// Re-export primary types.
pub use credential::{
    CredentialSchema, SubjectValue, VcError, VerifiableCredential, VerificationResult,
    VerifyError, VerifyOptions, BASE_CREDENTIAL_TYPE, CONTEXT_V1, SCHEMA_KIND,
};
pub use presentation::{
    PresentationVerificationResult, VerifiablePresentation, BASE_PRESENTATION_TYPE,
};
pub use proof::{Proof, ProofPurpose, ProofType};
pub use schema::{validate_subject, Schema, SchemaError, SchemaSource};
pub use status::{CredentialStatus, RevocationLookup, StatusError, REVOCATION_STATUS_KIND};
