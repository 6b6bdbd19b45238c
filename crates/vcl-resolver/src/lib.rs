#![deny(missing_docs)]

//! # vcl-resolver — Polymorphic DID Resolution
//!
//! The [`DidResolver`] capability abstracts over where DID documents come
//! from. Three implementations cover the stack's needs:
//!
//! - [`LedgerResolver`] — delegates to the in-process ledger's DID
//!   registry for one method prefix.
//! - [`RemoteResolver`] — queries an external universal-resolution HTTP
//!   endpoint, with a client-level timeout.
//! - [`CompositeResolver`] — routes by method prefix to registered
//!   resolvers, with an optional fallback for unmatched prefixes.
//!
//! Resolution is asynchronous and cancellable; a timeout surfaces as
//! [`ResolveError::Timeout`] and never leaves partial state, since
//! resolution performs no mutation.

pub mod composite;
pub mod ledger;
pub mod remote;

pub use composite::CompositeResolver;
pub use ledger::LedgerResolver;
pub use remote::RemoteResolver;

use async_trait::async_trait;
use thiserror::Error;

use vcl_core::Did;
use vcl_ledger::DidDocument;

/// Errors from DID resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The DID is not registered (or has been removed).
    #[error("no such DID: {0}")]
    NoDid(Did),

    /// No resolver is registered for the DID's method prefix.
    #[error("unsupported DID method: {0}")]
    UnsupportedMethod(String),

    /// The remote resolution endpoint was unreachable or returned an
    /// unexpected status.
    #[error("resolution network error: {0}")]
    Network(String),

    /// The resolution call timed out or was cancelled.
    #[error("resolution timed out: {0}")]
    Timeout(String),

    /// The resolved document could not be parsed.
    #[error("malformed DID document: {0}")]
    Malformed(String),
}

/// Capability for resolving a [`Did`] to its [`DidDocument`].
///
/// Implementations must be `Send + Sync`; resolution may be called with
/// unbounded concurrency.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve the DID to its current document.
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError>;
}
