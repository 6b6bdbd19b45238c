#![deny(missing_docs)]

//! # vcl-crypto — Cryptographic Primitives for the VCL Stack
//!
//! This crate provides the cryptographic building blocks used throughout
//! the workspace:
//!
//! - **Ed25519** signing and verification for Verifiable Credentials, DID
//!   key rotation, and revocation-registry authorization.
//! - **[`KeyProvider`]**, the signing seam every proof-producing surface
//!   in the stack accepts — a bare [`SigningKey`] is the in-memory
//!   backend, [`EnvKeyProvider`] sources the seed from the environment.
//!
//! ## Security Invariant
//!
//! Signing operations take [`CanonicalBytes`](vcl_core::CanonicalBytes) —
//! never raw byte slices. This guarantees the signed payload was properly
//! canonicalized, so signer and verifier cannot disagree on byte form.

pub mod ed25519;
pub mod error;
pub mod key_provider;

// Re-export primary types.
pub use ed25519::{bytes_to_hex, hex_to_bytes, Ed25519Signature, SigningKey, VerifyingKey};
pub use error::CryptoError;
pub use key_provider::{EnvKeyProvider, KeyProvider};
