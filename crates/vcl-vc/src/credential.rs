//! # Verifiable Credentials
//!
//! The [`VerifiableCredential`] envelope, its builder-style construction,
//! Ed25519 signing, and the verification state machine.
//!
//! ## Lifecycle
//!
//! A credential is built unsigned, mutated fluently (`add_type`,
//! `add_subject`, `set_status`, ...), then signed. Signing canonicalizes
//! every field except `proof` and attaches a detached [`Proof`]; once a
//! proof is present, further mutation is rejected with
//! [`VcError::AlreadySigned`] — re-signing (which replaces the proof) is
//! the only permitted change. Verification recomputes the canonical bytes
//! and reports a structured [`VerificationResult`]; a failed check is a
//! reported outcome, not an error — hard errors are reserved for
//! structurally malformed credentials.
//!
//! ## Revocation Id Derivation
//!
//! [`derive_revocation_id()`](VerifiableCredential::derive_revocation_id)
//! hashes the canonical bytes of the stable fields (`id`, `issuer`,
//! `type`, `credentialSubject`) — dates, schema, status, and proof are
//! excluded. The same credential therefore always maps to the same
//! revocation id, so an issuer can revoke without having stored the id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use vcl_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, Did, RevokeId, Timestamp,
    ValidationError,
};
use vcl_crypto::{CryptoError, Ed25519Signature, KeyProvider};
use vcl_resolver::{DidResolver, ResolveError};

use crate::proof::Proof;
use crate::schema::{self, SchemaSource};
use crate::status::{CredentialStatus, RevocationLookup, StatusError};

/// The JSON-LD context every credential carries.
pub const CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

/// The base credential type every credential's `type` set must include.
pub const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// The schema mechanism kind for blob-backed JSON Schemas.
pub const SCHEMA_KIND: &str = "JsonSchemaValidator2018";

/// Hard errors from credential construction and signing.
///
/// These are structural faults — the semantic negative paths of
/// verification are reported through [`VerificationResult`] instead.
#[derive(Error, Debug)]
pub enum VcError {
    /// Mutation was attempted after a proof was attached.
    #[error("credential is signed; mutation is not permitted")]
    AlreadySigned,

    /// The credential has no subject records.
    #[error("credential has no subject records")]
    MissingSubject,

    /// The `type` set does not include the base credential type.
    #[error("credential type must include \"{BASE_CREDENTIAL_TYPE}\"")]
    MissingBaseType,

    /// An operation requiring an issuer was attempted without one.
    #[error("credential has no issuer")]
    MissingIssuer,

    /// An identifier failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The signing backend failed to produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// Canonicalization of the credential body failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Semantic verification failures, accumulated in a
/// [`VerificationResult`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The credential carries no proof.
    #[error("credential has no proof")]
    NoProof,

    /// The proof's verification method could not be resolved to a key.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Key resolution or a status lookup timed out / was cancelled.
    #[error("resolution timed out: {0}")]
    ResolutionTimeout(String),

    /// The proof signature does not match the canonical credential bytes.
    #[error("invalid signature")]
    InvalidSignature,

    /// The credential expired.
    #[error("credential expired at {0}")]
    Expired(String),

    /// A subject record violated the credential schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The credential's derived revocation id is revoked.
    #[error("credential is revoked")]
    Revoked,

    /// A revocation check was forced but no revocation lookup was
    /// supplied.
    #[error("revocation check required but no revocation lookup supplied")]
    RevocationCheckUnavailable,

    /// The status registry could not be consulted.
    #[error("revocation check failed: {0}")]
    RevocationCheckFailed(String),

    /// The supplied challenge does not match the signed challenge
    /// (presentations).
    #[error("challenge mismatch")]
    ChallengeMismatch,

    /// The supplied domain does not match the signed domain
    /// (presentations).
    #[error("domain mismatch")]
    DomainMismatch,

    /// An embedded credential failed verification (presentations).
    #[error("embedded credential {0} failed verification")]
    CredentialInvalid(usize),
}

/// The reported outcome of verification.
///
/// `verified` is true only when every check passed; otherwise `errors`
/// lists the accumulated failures in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Whether every check passed.
    pub verified: bool,
    /// The accumulated failures, empty when verified.
    pub errors: Vec<VerifyError>,
}

impl VerificationResult {
    pub(crate) fn from_errors(errors: Vec<VerifyError>) -> Self {
        Self {
            verified: errors.is_empty(),
            errors,
        }
    }
}

/// Caller-supplied capabilities and switches for verification.
pub struct VerifyOptions<'a> {
    /// Resolves proof verification methods to current keys.
    pub resolver: &'a dyn DidResolver,
    /// Consulted when the credential carries a status. Without it, status
    /// checks are skipped unless `force_revocation_check` is set.
    pub revocation: Option<&'a dyn RevocationLookup>,
    /// Consulted when the credential carries a schema reference. Without
    /// it, schema checks are skipped.
    pub schemas: Option<&'a dyn SchemaSource>,
    /// Turn a missing revocation lookup into a verification failure for
    /// status-bearing credentials.
    pub force_revocation_check: bool,
}

impl<'a> VerifyOptions<'a> {
    /// Options with only a resolver; status and schema checks are skipped.
    pub fn new(resolver: &'a dyn DidResolver) -> Self {
        Self {
            resolver,
            revocation: None,
            schemas: None,
            force_revocation_check: false,
        }
    }

    /// Supply a revocation lookup.
    pub fn with_revocation(mut self, lookup: &'a dyn RevocationLookup) -> Self {
        self.revocation = Some(lookup);
        self
    }

    /// Supply a schema source.
    pub fn with_schemas(mut self, schemas: &'a dyn SchemaSource) -> Self {
        self.schemas = Some(schemas);
        self
    }

    /// Fail status-bearing credentials when no revocation lookup is
    /// supplied.
    pub fn force_revocation_check(mut self) -> Self {
        self.force_revocation_check = true;
        self
    }
}

/// Credential subject value — a single record or an array of records.
///
/// The `Array` variant is declared first: untagged deserialization tries
/// variants in order, and `Single(Value)` would otherwise swallow JSON
/// arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectValue {
    /// Multiple subject records.
    Array(Vec<Value>),
    /// A single subject record (serialized as a bare object, the common
    /// W3C shape).
    Single(Value),
}

impl Default for SubjectValue {
    fn default() -> Self {
        Self::Array(Vec::new())
    }
}

impl SubjectValue {
    /// Returns `true` if there are no subject records.
    pub fn is_empty(&self) -> bool {
        match self {
            SubjectValue::Single(_) => false,
            SubjectValue::Array(arr) => arr.is_empty(),
        }
    }

    /// Normalize to a list of subject record references.
    pub fn as_list(&self) -> Vec<&Value> {
        match self {
            SubjectValue::Single(v) => vec![v],
            SubjectValue::Array(arr) => arr.iter().collect(),
        }
    }

    /// Add a subject record. The first record is held as `Single`; a
    /// second converts to `Array`.
    pub fn push(&mut self, subject: Value) {
        match self {
            SubjectValue::Single(existing) => {
                let prev = existing.clone();
                *self = SubjectValue::Array(vec![prev, subject]);
            }
            SubjectValue::Array(arr) if arr.is_empty() => {
                *self = SubjectValue::Single(subject);
            }
            SubjectValue::Array(arr) => arr.push(subject),
        }
    }
}

/// Reference from a credential to its blob-stored JSON Schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSchema {
    /// The blob identifier the schema is stored under.
    pub id: vcl_core::BlobId,
    /// The schema mechanism kind.
    #[serde(rename = "type")]
    pub kind: String,
}

impl CredentialSchema {
    /// Reference a blob-stored JSON Schema.
    pub fn json_schema(id: vcl_core::BlobId) -> Self {
        Self {
            id,
            kind: SCHEMA_KIND.to_string(),
        }
    }
}

/// A W3C Verifiable Credential.
///
/// Fields are private: the fluent mutators enforce the
/// no-mutation-after-signing state check, and signing is the only way a
/// proof gets attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    context: Vec<String>,

    /// Credential identifier (URI).
    id: String,

    /// Credential type(s). Must include [`BASE_CREDENTIAL_TYPE`].
    #[serde(rename = "type")]
    types: Vec<String>,

    /// DID of the credential issuer. Set explicitly or at signing time
    /// from the verification method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer: Option<Did>,

    /// When the credential was issued (UTC).
    #[serde(rename = "issuanceDate")]
    issuance_date: Timestamp,

    /// Optional expiration date (UTC).
    #[serde(
        rename = "expirationDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    expiration_date: Option<Timestamp>,

    /// The credential subject records — extensible per the W3C spec.
    #[serde(rename = "credentialSubject")]
    subject: SubjectValue,

    /// Optional reference to a blob-stored JSON Schema.
    #[serde(
        rename = "credentialSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    schema: Option<CredentialSchema>,

    /// Optional revocation registry binding.
    #[serde(
        rename = "credentialStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    status: Option<CredentialStatus>,

    /// Detached proof. At most one; re-signing replaces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof: Option<Proof>,
}

impl VerifiableCredential {
    /// Start an unsigned credential with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![CONTEXT_V1.to_string()],
            id: id.into(),
            types: vec![BASE_CREDENTIAL_TYPE.to_string()],
            issuer: None,
            issuance_date: Timestamp::now(),
            expiration_date: None,
            subject: SubjectValue::default(),
            schema: None,
            status: None,
            proof: None,
        }
    }

    /// Parse a credential from its JSON document form.
    pub fn from_json(value: Value) -> Result<Self, VcError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The credential's JSON document form.
    pub fn to_json(&self) -> Result<Value, VcError> {
        Ok(serde_json::to_value(self)?)
    }

    // -- Accessors ----------------------------------------------------------

    /// The credential identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The credential type set.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// The issuer DID, if set.
    pub fn issuer(&self) -> Option<&Did> {
        self.issuer.as_ref()
    }

    /// The subject records.
    pub fn subject(&self) -> &SubjectValue {
        &self.subject
    }

    /// The issuance date.
    pub fn issuance_date(&self) -> &Timestamp {
        &self.issuance_date
    }

    /// The expiration date, if set.
    pub fn expiration_date(&self) -> Option<&Timestamp> {
        self.expiration_date.as_ref()
    }

    /// The revocation registry binding, if set.
    pub fn status(&self) -> Option<&CredentialStatus> {
        self.status.as_ref()
    }

    /// The schema reference, if set.
    pub fn schema(&self) -> Option<&CredentialSchema> {
        self.schema.as_ref()
    }

    /// The attached proof, if signed.
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    // -- Fluent mutation (unsigned only) ------------------------------------

    fn ensure_unsigned(&self) -> Result<(), VcError> {
        if self.proof.is_some() {
            return Err(VcError::AlreadySigned);
        }
        Ok(())
    }

    /// Add a credential type.
    pub fn add_type(&mut self, credential_type: impl Into<String>) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        let t = credential_type.into();
        if !self.types.contains(&t) {
            self.types.push(t);
        }
        Ok(self)
    }

    /// Add a subject record.
    pub fn add_subject(&mut self, subject: Value) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.subject.push(subject);
        Ok(self)
    }

    /// Set the issuer DID explicitly.
    pub fn set_issuer(&mut self, issuer: Did) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.issuer = Some(issuer);
        Ok(self)
    }

    /// Set the issuance date.
    pub fn set_issuance_date(&mut self, date: Timestamp) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.issuance_date = date;
        Ok(self)
    }

    /// Set the expiration date.
    pub fn set_expiration_date(&mut self, date: Timestamp) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.expiration_date = Some(date);
        Ok(self)
    }

    /// Bind the credential to a revocation registry.
    pub fn set_status(&mut self, status: CredentialStatus) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.status = Some(status);
        Ok(self)
    }

    /// Reference a blob-stored JSON Schema.
    pub fn set_schema(&mut self, schema: CredentialSchema) -> Result<&mut Self, VcError> {
        self.ensure_unsigned()?;
        self.schema = Some(schema);
        Ok(self)
    }

    // -- Signing and verification -------------------------------------------

    /// Structural validation: type set and subject records.
    fn validate(&self) -> Result<(), VcError> {
        if !self.types.iter().any(|t| t == BASE_CREDENTIAL_TYPE) {
            return Err(VcError::MissingBaseType);
        }
        if self.subject.is_empty() {
            return Err(VcError::MissingSubject);
        }
        Ok(())
    }

    /// Compute the canonical signing input: the credential document with
    /// the `proof` field removed.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(obj) = val.as_object_mut() {
            obj.remove("proof");
        }
        Ok(CanonicalBytes::from_value(val)?)
    }

    /// Sign the credential, attaching a detached proof.
    ///
    /// `key` is the issuer's signing backend — an in-memory
    /// [`vcl_crypto::SigningKey`] or any other [`KeyProvider`]. The
    /// verification method is the DID URL of the signing key; the issuer
    /// is set from it when not already set. Re-signing replaces the
    /// previous proof.
    pub fn sign(
        &mut self,
        key: &dyn KeyProvider,
        verification_method: impl Into<String>,
    ) -> Result<&mut Self, VcError> {
        let vm = verification_method.into();
        let signer = Did::from_url(&vm)?;
        if self.issuer.is_none() {
            self.issuer = Some(signer);
        }
        self.validate()?;

        // The previous proof (if any) is excluded from the signing input
        // regardless, so replacement is safe.
        let input = self.signing_input()?;
        let signature = key.sign(&input)?;
        self.proof = Some(Proof::assertion(vm, signature.to_hex(), None));
        Ok(self)
    }

    /// Derive the credential's deterministic revocation id.
    ///
    /// Hashes the canonical bytes of the stable fields only: `id`,
    /// `issuer`, `type`, and `credentialSubject`. Proof, dates, schema,
    /// and status are excluded, so signing or expiry changes never move
    /// the id.
    pub fn derive_revocation_id(&self) -> Result<RevokeId, VcError> {
        let issuer = self.issuer.as_ref().ok_or(VcError::MissingIssuer)?;
        let stable = serde_json::json!({
            "id": self.id,
            "issuer": issuer,
            "type": self.types,
            "credentialSubject": self.subject,
        });
        let canonical = CanonicalBytes::from_value(stable)?;
        Ok(RevokeId::from_digest(&sha256_digest(&canonical)))
    }

    /// Verify the credential.
    ///
    /// Returns a reported [`VerificationResult`] — the negative path is a
    /// result, not an error. Hard `Err` is reserved for structurally
    /// malformed credentials.
    pub async fn verify(
        &self,
        options: &VerifyOptions<'_>,
    ) -> Result<VerificationResult, VcError> {
        self.validate()?;

        // 1. No proof: fail fast, nothing else is checkable.
        let proof = match &self.proof {
            Some(p) => p,
            None => return Ok(VerificationResult::from_errors(vec![VerifyError::NoProof])),
        };

        let mut errors = Vec::new();

        // 2. Expiration.
        if let Some(expiration) = &self.expiration_date {
            if *expiration.as_datetime() < chrono::Utc::now() {
                errors.push(VerifyError::Expired(expiration.to_canonical_string()));
            }
        }

        // 3. Resolve the signing key and check the signature.
        match resolve_verification_key(options.resolver, &proof.verification_method).await {
            Ok(key) => {
                let input = self.signing_input()?;
                match Ed25519Signature::from_hex(&proof.proof_value) {
                    Ok(signature) if key.verify(&input, &signature).is_ok() => {}
                    _ => errors.push(VerifyError::InvalidSignature),
                }
            }
            Err(e) => errors.push(e),
        }

        // 4. Schema validation, when referenced and a source is supplied.
        if let (Some(schema_ref), Some(source)) = (&self.schema, options.schemas) {
            match source.fetch_schema(&schema_ref.id).await {
                Ok(schema_doc) => {
                    for subject in self.subject.as_list() {
                        if let Err(e) = schema::validate_subject(&schema_doc, subject) {
                            errors.push(VerifyError::SchemaViolation(e.to_string()));
                        }
                    }
                }
                Err(e) => errors.push(VerifyError::SchemaViolation(e.to_string())),
            }
        }

        // 5. Revocation, whenever a status is present and a lookup is
        //    supplied; forcing turns a missing lookup into a failure.
        if let Some(status) = &self.status {
            match options.revocation {
                Some(lookup) => {
                    let revoke_id = self.derive_revocation_id()?;
                    match lookup.get_is_revoked(&status.id, &revoke_id).await {
                        Ok(true) => errors.push(VerifyError::Revoked),
                        Ok(false) => {}
                        Err(StatusError::Timeout(m)) => {
                            errors.push(VerifyError::ResolutionTimeout(m))
                        }
                        Err(e) => errors.push(VerifyError::RevocationCheckFailed(e.to_string())),
                    }
                }
                None if options.force_revocation_check => {
                    errors.push(VerifyError::RevocationCheckUnavailable)
                }
                None => {}
            }
        }

        tracing::debug!(
            credential = %self.id,
            verified = errors.is_empty(),
            "credential verification complete"
        );
        Ok(VerificationResult::from_errors(errors))
    }
}

/// Resolve a proof's verification method to the owner's current key.
pub(crate) async fn resolve_verification_key(
    resolver: &dyn DidResolver,
    verification_method: &str,
) -> Result<vcl_crypto::VerifyingKey, VerifyError> {
    let did = Did::from_url(verification_method)
        .map_err(|e| VerifyError::KeyNotFound(e.to_string()))?;
    match resolver.resolve(&did).await {
        Ok(doc) => Ok(doc.public_key),
        Err(ResolveError::Timeout(m)) => Err(VerifyError::ResolutionTimeout(m)),
        Err(e) => Err(VerifyError::KeyNotFound(e.to_string())),
    }
}
