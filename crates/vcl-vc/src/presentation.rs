//! # Verifiable Presentations
//!
//! A presentation bundles one or more credentials under a holder
//! signature bound to a `challenge` (freshness) and `domain` (intended
//! audience).
//!
//! ## Signing Scheme
//!
//! The holder signs the canonical bytes of
//! `{ "challenge": ..., "domain": ..., "presentation": <document sans
//! proof> }`. The proof records the challenge and domain it was produced
//! for; verification first checks the verifier-supplied values against
//! the recorded ones and only then recomputes the signing input with the
//! supplied values and checks the signature. A replayed presentation
//! (wrong challenge) or a re-targeted one (wrong domain) therefore fails
//! before any cryptography runs.
//!
//! The holder signature authenticates the credential *bundle*; each
//! embedded credential's own proof is verified independently and the
//! results are aggregated.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use vcl_core::{CanonicalBytes, Did};
use vcl_crypto::{Ed25519Signature, KeyProvider};

use crate::credential::{
    resolve_verification_key, VcError, VerifiableCredential, VerificationResult, VerifyError,
    VerifyOptions, CONTEXT_V1,
};
use crate::proof::Proof;

/// The base presentation type.
pub const BASE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// The reported outcome of presentation verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationVerificationResult {
    /// True only when the holder proof and every embedded credential
    /// verified.
    pub verified: bool,
    /// Presentation-level failures (challenge, domain, holder signature).
    pub errors: Vec<VerifyError>,
    /// Per-credential verification results, in bundle order.
    pub credential_results: Vec<VerificationResult>,
}

/// A W3C Verifiable Presentation.
///
/// Fields are private for the same reason as the credential's: the
/// no-mutation-after-signing state check is enforced by the mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiablePresentation {
    /// JSON-LD context URIs.
    #[serde(rename = "@context")]
    context: Vec<String>,

    /// Presentation identifier (URI).
    id: String,

    /// Presentation type(s).
    #[serde(rename = "type")]
    types: Vec<String>,

    /// The bundled credentials, in order.
    #[serde(rename = "verifiableCredential")]
    credentials: Vec<VerifiableCredential>,

    /// Holder proof over (canonical presentation bytes, challenge,
    /// domain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof: Option<Proof>,
}

impl VerifiablePresentation {
    /// Start an unsigned presentation with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            context: vec![CONTEXT_V1.to_string()],
            id: id.into(),
            types: vec![BASE_PRESENTATION_TYPE.to_string()],
            credentials: Vec::new(),
            proof: None,
        }
    }

    /// Parse a presentation from its JSON document form.
    pub fn from_json(value: Value) -> Result<Self, VcError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The presentation's JSON document form.
    pub fn to_json(&self) -> Result<Value, VcError> {
        Ok(serde_json::to_value(self)?)
    }

    /// The presentation identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The bundled credentials.
    pub fn credentials(&self) -> &[VerifiableCredential] {
        &self.credentials
    }

    /// The holder proof, if signed.
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Add a credential to the bundle.
    pub fn add_credential(
        &mut self,
        credential: VerifiableCredential,
    ) -> Result<&mut Self, VcError> {
        if self.proof.is_some() {
            return Err(VcError::AlreadySigned);
        }
        self.credentials.push(credential);
        Ok(self)
    }

    /// Compute the canonical signing input for the given challenge and
    /// domain: the presentation document (sans proof) wrapped together
    /// with both binding values.
    pub fn signing_input(
        &self,
        challenge: &str,
        domain: &str,
    ) -> Result<CanonicalBytes, VcError> {
        let mut body = serde_json::to_value(self)?;
        if let Some(obj) = body.as_object_mut() {
            obj.remove("proof");
        }
        let wrapped = serde_json::json!({
            "challenge": challenge,
            "domain": domain,
            "presentation": body,
        });
        Ok(CanonicalBytes::from_value(wrapped)?)
    }

    /// Sign the presentation as the holder, binding it to a challenge and
    /// domain. `holder_key` is any [`KeyProvider`] backend. Re-signing
    /// replaces the previous proof.
    pub fn sign(
        &mut self,
        holder_key: &dyn KeyProvider,
        verification_method: impl Into<String>,
        challenge: impl Into<String>,
        domain: impl Into<String>,
    ) -> Result<&mut Self, VcError> {
        let vm = verification_method.into();
        // Validate the verification method is a DID URL.
        Did::from_url(&vm)?;
        let challenge = challenge.into();
        let domain = domain.into();

        let input = self.signing_input(&challenge, &domain)?;
        let signature = holder_key.sign(&input)?;
        self.proof = Some(Proof::authentication(
            vm,
            signature.to_hex(),
            challenge,
            domain,
            None,
        ));
        Ok(self)
    }

    /// Verify the presentation against the supplied challenge and domain.
    ///
    /// Challenge/domain binding is checked before the holder signature;
    /// embedded credentials are verified independently with the same
    /// options and aggregated into the result.
    pub async fn verify(
        &self,
        options: &VerifyOptions<'_>,
        challenge: &str,
        domain: &str,
    ) -> Result<PresentationVerificationResult, VcError> {
        let mut errors = Vec::new();

        match &self.proof {
            None => errors.push(VerifyError::NoProof),
            Some(proof) => {
                // Replay/audience binding first, before any cryptography.
                if proof.challenge.as_deref() != Some(challenge) {
                    errors.push(VerifyError::ChallengeMismatch);
                }
                if proof.domain.as_deref() != Some(domain) {
                    errors.push(VerifyError::DomainMismatch);
                }

                if errors.is_empty() {
                    match resolve_verification_key(options.resolver, &proof.verification_method)
                        .await
                    {
                        Ok(key) => {
                            let input = self.signing_input(challenge, domain)?;
                            match Ed25519Signature::from_hex(&proof.proof_value) {
                                Ok(signature) if key.verify(&input, &signature).is_ok() => {}
                                _ => errors.push(VerifyError::InvalidSignature),
                            }
                        }
                        Err(e) => errors.push(e),
                    }
                }
            }
        }

        // Embedded credentials are checked independently of the holder
        // proof.
        let mut credential_results = Vec::with_capacity(self.credentials.len());
        for (index, credential) in self.credentials.iter().enumerate() {
            let result = credential.verify(options).await?;
            if !result.verified {
                errors.push(VerifyError::CredentialInvalid(index));
            }
            credential_results.push(result);
        }

        let verified = errors.is_empty();
        tracing::debug!(
            presentation = %self.id,
            verified,
            credentials = credential_results.len(),
            "presentation verification complete"
        );
        Ok(PresentationVerificationResult {
            verified,
            errors,
            credential_results,
        })
    }
}
