//! Network seam for the failover fetcher.
//!
//! [`Transport`] sends one fully prepared request and returns the raw
//! status and body. [`HyperTransport`] is the production implementation:
//! a connection-pooled hyper client over rustls with webpki roots.
//! Per-attempt timeouts are enforced by the fetcher, not here.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use super::{FetchError, Method};

/// A request bound to one concrete endpoint URL.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

// async_trait keeps Transport object-safe for Arc<dyn Transport>.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, FetchError>;
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Full<Bytes>>;

#[derive(Clone)]
pub struct HyperTransport {
    client: HttpClient,
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HyperTransport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: build_http_client(),
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Several rustls crypto providers may be compiled in; pin `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, FetchError> {
        let method = match request.method {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
        };

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(request.url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        let body = request
            .body
            .as_ref()
            .map_or_else(Bytes::new, |b| Bytes::from(b.clone()));
        let req = builder
            .body(Full::new(body))
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .request(req)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| FetchError::Transport(format!("body read error: {e}")))?
            .to_bytes();

        Ok(RawResponse { status, body })
    }
}
