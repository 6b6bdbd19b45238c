#![deny(missing_docs)]

//! # vcl-core — Foundational Types for the VCL Stack
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies — only `serde`, `serde_json`,
//! `thiserror`, `chrono`, `sha2`, and `rand_core` from the external
//! ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`BlobId`] where a [`RegistryId`] is
//!    expected, and a [`Did`] is validated at construction.
//!
//! 2. **[`CanonicalBytes`] is the sole path to signing and digest
//!    computation.** Every signature and every content digest in the stack
//!    flows through `CanonicalBytes::new()`, which applies sorted-key JSON
//!    canonicalization with float rejection and datetime normalization.
//!
//! 3. **[`VclError`] hierarchy.** Structured errors with `thiserror` — no
//!    `Box<dyn Error>`, no `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_raw, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ValidationError, VclError};
pub use identity::{BlobId, Did, RegistryId, RevokeId};
pub use temporal::Timestamp;
