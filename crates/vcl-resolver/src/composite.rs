//! # Method-Prefix Composite Resolver
//!
//! Routes resolution by the DID's method segment: exact-match routing to a
//! registered resolver, falling back to a default resolver when the prefix
//! is unmatched, and failing with [`ResolveError::UnsupportedMethod`] when
//! there is no fallback either.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use vcl_core::Did;
use vcl_ledger::DidDocument;

use crate::{DidResolver, ResolveError};

/// Routes DIDs to resolvers by method prefix.
///
/// ```text
/// vcl  -> LedgerResolver
/// web  -> RemoteResolver
/// *    -> fallback (optional)
/// ```
#[derive(Clone, Default)]
pub struct CompositeResolver {
    routes: HashMap<String, Arc<dyn DidResolver>>,
    fallback: Option<Arc<dyn DidResolver>>,
}

impl CompositeResolver {
    /// Create an empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a method prefix to a resolver. Replaces any existing route
    /// for the same prefix.
    pub fn with_route(
        mut self,
        method: impl Into<String>,
        resolver: Arc<dyn DidResolver>,
    ) -> Self {
        self.routes.insert(method.into(), resolver);
        self
    }

    /// Set the fallback resolver for unmatched method prefixes.
    pub fn with_fallback(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.fallback = Some(resolver);
        self
    }

    /// The registered method prefixes.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

#[async_trait]
impl DidResolver for CompositeResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError> {
        let method = did.method();
        if let Some(resolver) = self.routes.get(method) {
            return resolver.resolve(did).await;
        }
        match &self.fallback {
            Some(resolver) => resolver.resolve(did).await,
            None => Err(ResolveError::UnsupportedMethod(method.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;
    use vcl_crypto::SigningKey;
    use vcl_ledger::{Ledger, Transaction};

    use crate::LedgerResolver;

    /// Stub resolver that answers every DID with a fixed document.
    struct FixedResolver(DidDocument);

    #[async_trait]
    impl DidResolver for FixedResolver {
        async fn resolve(&self, _did: &Did) -> Result<DidDocument, ResolveError> {
            Ok(self.0.clone())
        }
    }

    fn ledger_with_did(method: &str) -> (Arc<Ledger>, Did, DidDocument) {
        let ledger = Arc::new(Ledger::new());
        let did = Did::random(method).unwrap();
        let key = SigningKey::generate(&mut OsRng);
        ledger
            .submit(Transaction::DidRegister {
                did: did.clone(),
                public_key: key.verifying_key(),
                controller: did.clone(),
            })
            .unwrap();
        let doc = ledger.resolve_did(&did).unwrap();
        (ledger, did, doc)
    }

    #[tokio::test]
    async fn routes_by_method_prefix() {
        let (ledger, did, doc) = ledger_with_did("vcl");
        let composite = CompositeResolver::new()
            .with_route("vcl", Arc::new(LedgerResolver::new(ledger, "vcl")));

        let resolved = composite.resolve(&did).await.unwrap();
        assert_eq!(resolved, doc);
    }

    #[tokio::test]
    async fn unmatched_prefix_goes_to_fallback() {
        let (ledger, _did, doc) = ledger_with_did("vcl");
        let composite = CompositeResolver::new()
            .with_route("vcl", Arc::new(LedgerResolver::new(ledger, "vcl")))
            .with_fallback(Arc::new(FixedResolver(doc.clone())));

        let foreign = Did::new("did:ethr:0xdeadbeef").unwrap();
        let resolved = composite.resolve(&foreign).await.unwrap();
        assert_eq!(resolved, doc);
    }

    #[tokio::test]
    async fn unmatched_prefix_without_fallback_fails() {
        let (ledger, _did, _doc) = ledger_with_did("vcl");
        let composite = CompositeResolver::new()
            .with_route("vcl", Arc::new(LedgerResolver::new(ledger, "vcl")));

        let foreign = Did::new("did:ethr:0xdeadbeef").unwrap();
        assert!(matches!(
            composite.resolve(&foreign).await,
            Err(ResolveError::UnsupportedMethod(m)) if m == "ethr"
        ));
    }

    #[tokio::test]
    async fn route_replaces_existing_entry() {
        let (ledger_a, did_a, _doc_a) = ledger_with_did("vcl");
        let (_ledger_b, _did_b, doc_b) = ledger_with_did("vcl");

        let composite = CompositeResolver::new()
            .with_route("vcl", Arc::new(LedgerResolver::new(ledger_a, "vcl")))
            .with_route("vcl", Arc::new(FixedResolver(doc_b.clone())));

        // The second registration wins.
        let resolved = composite.resolve(&did_a).await.unwrap();
        assert_eq!(resolved, doc_b);
    }

    #[tokio::test]
    async fn methods_lists_registered_prefixes() {
        let (ledger, _did, _doc) = ledger_with_did("vcl");
        let composite = CompositeResolver::new()
            .with_route("vcl", Arc::new(LedgerResolver::new(ledger, "vcl")));
        let methods: Vec<&str> = composite.methods().collect();
        assert_eq!(methods, vec!["vcl"]);
    }
}
