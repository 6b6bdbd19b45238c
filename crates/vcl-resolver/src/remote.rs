//! # Remote Universal-Resolver Client
//!
//! Resolves DIDs through an external universal-resolution HTTP endpoint.
//! The endpoint follows the universal-resolver path convention:
//! `GET {base_url}/1.0/identifiers/{did}`, answering either a bare DID
//! document or an envelope with a `didDocument` field.
//!
//! Network failures and timeouts are surfaced as structured
//! [`ResolveError`] variants; the caller decides whether to retry — this
//! client never retries internally.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use vcl_core::Did;
use vcl_ledger::DidDocument;

use crate::{DidResolver, ResolveError};

/// Default request timeout for remote resolution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves DIDs via an external universal-resolution endpoint.
#[derive(Debug, Clone)]
pub struct RemoteResolver {
    http: reqwest::Client,
    base_url: Url,
}

impl RemoteResolver {
    /// Create a resolver for the given endpoint with the default timeout.
    pub fn new(base_url: Url) -> Result<Self, ResolveError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a resolver with an explicit request timeout.
    ///
    /// The timeout is enforced at the HTTP client level; an elapsed
    /// timeout surfaces as [`ResolveError::Timeout`].
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolveError::Network(format!("client init failed: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// The resolution endpoint base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, did: &Did) -> Result<Url, ResolveError> {
        self.base_url
            .join(&format!("1.0/identifiers/{did}"))
            .map_err(|e| ResolveError::Malformed(format!("bad resolution URL: {e}")))
    }
}

#[async_trait]
impl DidResolver for RemoteResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, ResolveError> {
        let url = self.endpoint(did)?;
        tracing::debug!(%did, %url, "remote DID resolution");

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::Timeout(format!("resolving {did}"))
            } else {
                ResolveError::Network(e.to_string())
            }
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ResolveError::NoDid(did.clone()));
        }
        if !response.status().is_success() {
            return Err(ResolveError::Network(format!(
                "resolution endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ResolveError::Malformed(e.to_string()))?;

        // Universal-resolver responses wrap the document; bare documents
        // are accepted as well.
        let document = body.get("didDocument").unwrap_or(&body);
        serde_json::from_value(document.clone())
            .map_err(|e| ResolveError::Malformed(format!("undecodable DID document: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_identifier_path() {
        let resolver = RemoteResolver::new(Url::parse("https://resolver.example/").unwrap()).unwrap();
        let did = Did::new("did:web:example.com").unwrap();
        let url = resolver.endpoint(&did).unwrap();
        assert_eq!(
            url.as_str(),
            "https://resolver.example/1.0/identifiers/did:web:example.com"
        );
    }

    #[test]
    fn base_url_accessor() {
        let base = Url::parse("https://resolver.example/").unwrap();
        let resolver = RemoteResolver::new(base.clone()).unwrap();
        assert_eq!(resolver.base_url(), &base);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Reserved TEST-NET-1 address; nothing listens there.
        let resolver = RemoteResolver::with_timeout(
            Url::parse("http://192.0.2.1/").unwrap(),
            Duration::from_millis(200),
        )
        .unwrap();
        let did = Did::new("did:web:example.com").unwrap();
        let err = resolver.resolve(&did).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Network(_) | ResolveError::Timeout(_)
        ));
    }
}
