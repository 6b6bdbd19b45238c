//! # Ledger-Backed Resolver
//!
//! Resolves DIDs of one method prefix against the in-process ledger's DID
//! registry.

use std::sync::Arc;

use async_trait::async_trait;

use vcl_core::Did;
use vcl_ledger::{DidDocument, DidError, Ledger};

use crate::{DidResolver, ResolveError};

/// Resolves DIDs against the ledger's DID registry.
///
/// Only answers for its configured method prefix; other methods fail with
/// [`ResolveError::UnsupportedMethod`] so that a [`CompositeResolver`]
/// (or caller) can route elsewhere.
///
/// [`CompositeResolver`]: crate::CompositeResolver
#[derive(Clone)]
pub struct LedgerResolver {
    ledger: Arc<Ledger>,
    method: String,
}

impl LedgerResolver {
    /// Create a resolver for the given ledger and method prefix.
    pub fn new(ledger: Arc<Ledger>, method: impl Into<String>) -> Self {
        Self {
            ledger,
            method: method.into(),
        }
    }

    /// The method prefix this resolver answers for.
    pub fn method(&self) -> &str {
        &self.method
    }
}

#[async_trait]
impl DidResolver for LedgerResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError> {
        if did.method() != self.method {
            return Err(ResolveError::UnsupportedMethod(did.method().to_string()));
        }
        match self.ledger.resolve_did(did) {
            Ok(doc) => Ok(doc),
            Err(DidError::NoSuchDid(d)) => Err(ResolveError::NoDid(d)),
            Err(e) => Err(ResolveError::Malformed(e.to_string())),
        }
    }
}
