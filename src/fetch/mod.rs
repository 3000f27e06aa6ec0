//! Failover fetcher: ordered endpoints, bounded retries, backoff.
//!
//! [`Fetcher::fetch`] walks the endpoint list in the order given and,
//! for each endpoint, makes up to [`RetryPolicy::max_retries`] attempts.
//! Between attempts on the same endpoint it sleeps for
//! [`RetryPolicy::delay`]. The first attempt whose payload passes
//! [`accept`] ends the walk. Every attempt is sequential; endpoints are
//! never probed in parallel for the same logical request.
//!
//! Failures of any kind (transport, status, malformed JSON, empty
//! result, timeout) are folded into a [`FetchOutcome::Failure`]; the
//! fetcher never returns an error or panics on upstream behaviour.

pub mod backoff;
pub mod headers;
pub mod transport;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::HeaderMap;
use serde_json::Value;
use url::Url;

pub use backoff::RetryPolicy;
pub use transport::{HyperTransport, PreparedRequest, RawResponse, Transport};

use crate::error::HarvestError;

/// One candidate base URL. Position in the list is its only identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, HarvestError> {
        let url = Url::parse(raw).map_err(|source| HarvestError::UrlParse {
            url: raw.to_string(),
            source,
        })?;
        Ok(Self { url })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Parse a list of raw URLs, preserving order.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>, HarvestError> {
        raw.iter().map(|r| Self::parse(r.as_ref())).collect()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters are appended to the URL query string.
    Get,
    /// Parameters are sent as a form-encoded body.
    Post,
}

/// What a 2xx JSON body must look like to count as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Any JSON document is accepted, including `{}`.
    AnyJson,
    /// The top-level array at `key` must exist and be non-empty.
    NonEmpty { key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("attempt timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed JSON: {0}")]
    Malformed(String),

    #[error("empty result: '{key}' missing or empty")]
    EmptyResult { key: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Immutable description of one logical request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    resource: String,
    path: String,
    params: Vec<(String, String)>,
    method: Method,
    headers: HeaderMap,
    timeout: Duration,
    expectation: Expectation,
}

impl FetchRequest {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn get(resource: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(resource, path, Method::Get)
    }

    #[must_use]
    pub fn post(resource: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(resource, path, Method::Post)
    }

    #[must_use]
    pub fn new(resource: impl Into<String>, path: impl Into<String>, method: Method) -> Self {
        Self {
            resource: resource.into(),
            path: path.into(),
            params: Vec::new(),
            method,
            headers: HeaderMap::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            expectation: Expectation::AnyJson,
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HarvestError> {
        let (key, val) = headers::parse_header(name, value)?;
        self.headers.insert(key, val);
        Ok(self)
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn expect_non_empty(mut self, key: impl Into<String>) -> Self {
        self.expectation = Expectation::NonEmpty { key: key.into() };
        self
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Bind this request to a concrete endpoint.
    pub fn prepare(&self, endpoint: &Endpoint) -> Result<PreparedRequest, FetchError> {
        let mut url = join_path(endpoint.url(), &self.path)?;

        let body = match self.method {
            Method::Get => {
                if !self.params.is_empty() {
                    url.query_pairs_mut().extend_pairs(&self.params);
                }
                None
            }
            Method::Post => Some(
                url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&self.params)
                    .finish(),
            ),
        };

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers: headers::build_request_headers(self.method, &self.headers),
            body,
        })
    }
}

fn join_path(base: &Url, path: &str) -> Result<Url, FetchError> {
    if path.is_empty() {
        return Ok(base.clone());
    }
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| FetchError::InvalidRequest(format!("{joined}: {e}")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub reason: String,
    pub attempts: u32,
    pub last_error: Option<FetchError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        payload: Value,
        attempts: u32,
        endpoint: Endpoint,
    },
    Failure(FetchFailure),
}

impl FetchOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } => *attempts,
            Self::Failure(failure) => failure.attempts,
        }
    }

    #[must_use]
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure(_) => None,
        }
    }
}

/// Decide whether a raw response counts as a success.
pub fn accept(response: &RawResponse, expectation: &Expectation) -> Result<Value, FetchError> {
    if !(200..300).contains(&response.status) {
        return Err(FetchError::Status(response.status));
    }

    let payload: Value =
        serde_json::from_slice(&response.body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Expectation::NonEmpty { key } = expectation {
        let populated = payload
            .get(key)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty());
        if !populated {
            return Err(FetchError::EmptyResult { key: key.clone() });
        }
    }

    Ok(payload)
}

pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Same transport, different retry ceiling.
    #[must_use]
    pub fn with_max_retries(&self, max_retries: u32) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: RetryPolicy {
                max_retries,
                ..self.policy.clone()
            },
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub async fn fetch(&self, request: &FetchRequest, endpoints: &[Endpoint]) -> FetchOutcome {
        let mut attempts: u32 = 0;
        let mut last_error: Option<FetchError> = None;
        let max_retries = self.policy.max_retries;

        for endpoint in endpoints {
            let prepared = match request.prepare(endpoint) {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(
                        resource = %request.resource(),
                        endpoint = %endpoint,
                        error = %e,
                        "cannot build request for endpoint, skipping"
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            for attempt in 1..=max_retries {
                attempts += 1;
                tracing::debug!(
                    resource = %request.resource(),
                    endpoint = %endpoint,
                    attempt,
                    "attempting fetch"
                );

                let start = Instant::now();
                let result =
                    match tokio::time::timeout(request.timeout(), self.transport.send(&prepared))
                        .await
                    {
                        Ok(Ok(raw)) => accept(&raw, request.expectation()).map(|p| (p, raw.body.len())),
                        Ok(Err(e)) => Err(e),
                        Err(_) => Err(FetchError::Timeout(request.timeout())),
                    };
                let latency_ms = start.elapsed().as_millis() as u64;

                match result {
                    Ok((payload, bytes)) => {
                        tracing::info!(
                            resource = %request.resource(),
                            endpoint = %endpoint,
                            attempt,
                            bytes,
                            latency_ms,
                            "fetch succeeded"
                        );
                        return FetchOutcome::Success {
                            payload,
                            attempts,
                            endpoint: endpoint.clone(),
                        };
                    }
                    Err(e) => {
                        if attempt < max_retries {
                            let delay = self.policy.delay(attempt);
                            tracing::warn!(
                                resource = %request.resource(),
                                endpoint = %endpoint,
                                attempt,
                                error = %e,
                                latency_ms,
                                retry_in_ms = delay.as_millis() as u64,
                                "attempt failed, retrying"
                            );
                            last_error = Some(e);
                            tokio::time::sleep(delay).await;
                        } else {
                            tracing::warn!(
                                resource = %request.resource(),
                                endpoint = %endpoint,
                                attempt,
                                error = %e,
                                latency_ms,
                                "attempt failed, endpoint exhausted"
                            );
                            last_error = Some(e);
                        }
                    }
                }
            }
        }

        let reason = last_error.as_ref().map_or_else(
            || "no endpoints attempted".to_string(),
            ToString::to_string,
        );
        tracing::error!(
            resource = %request.resource(),
            endpoints = endpoints.len(),
            attempts,
            reason = %reason,
            "all endpoints failed"
        );
        FetchOutcome::Failure(FetchFailure {
            reason,
            attempts,
            last_error,
        })
    }
}
