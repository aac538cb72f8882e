// src/fetch.rs
//! Page-fetch collaborator. The engine consumes a `FetchOutcome` (status +
//! body, or a typed failure) and never performs network I/O itself, so tests
//! can drive the whole pipeline through a stub fetcher.

use async_trait::async_trait;
use metrics::{counter, histogram};
use std::time::{Duration, Instant};
use url::Url;

use crate::input::RequestError;

/// Single bounded attempt: no retries, no backoff.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(7);
const USER_AGENT: &str = "GhostJobChecker/1.0";

/// Classified failure when no response was obtained. Exactly one of a
/// successful body or a non-`None` kind is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    None,
    Timeout,
    Blocked,
    Other,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub status: Option<u16>,
    pub body: String,
    pub failure: FailureKind,
}

impl FetchOutcome {
    pub fn failed(kind: FailureKind) -> Self {
        Self {
            status: None,
            body: String::new(),
            failure: kind,
        }
    }

    pub fn ok(status: u16, body: String) -> Self {
        Self {
            status: Some(status),
            body,
            failure: FailureKind::None,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Pre-flight host check; the default production impl does a DNS lookup.
    async fn resolve(&self, url: &Url) -> Result<(), RequestError>;

    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// Production fetcher: redirect-following reqwest client with a hard timeout
/// and a stable user agent. An HTTP error status (403, 404, ...) is a real
/// outcome, not a failure; only transport-level errors classify as failures.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn resolve(&self, url: &Url) -> Result<(), RequestError> {
        ensure_host_resolves(url).await
    }

    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let t0 = Instant::now();
        let outcome = match self.client.get(url.as_str()).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.text().await {
                    Ok(body) => FetchOutcome::ok(status, body),
                    Err(e) => {
                        tracing::warn!(error = ?e, "failed reading fetched body");
                        FetchOutcome {
                            status: Some(status),
                            body: String::new(),
                            failure: FailureKind::None,
                        }
                    }
                }
            }
            Err(e) => {
                let kind = classify_error(&e);
                tracing::warn!(error = ?e, kind = ?kind, "page fetch failed");
                counter!("fetch_failures_total").increment(1);
                FetchOutcome::failed(kind)
            }
        };
        histogram!("fetch_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        outcome
    }
}

fn classify_error(e: &reqwest::Error) -> FailureKind {
    if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        // Host resolved (we pre-checked DNS) but refused or reset the
        // connection; typical of anti-bot infrastructure.
        FailureKind::Blocked
    } else {
        FailureKind::Other
    }
}

/// DNS pre-resolution: a host that cannot resolve is a user input problem
/// (typo, offline domain) and is surfaced as a validation-class error naming
/// the hostname, before any fetch is attempted.
pub async fn ensure_host_resolves(url: &Url) -> Result<(), RequestError> {
    let host = match url.host_str() {
        Some(h) => h.to_string(),
        None => {
            return Err(RequestError::Validation(
                "That doesn't look like a valid link.".to_string(),
            ))
        }
    };
    let port = url.port_or_known_default().unwrap_or(443);

    let resolved = match tokio::net::lookup_host((host.as_str(), port)).await {
        Ok(mut addrs) => addrs.next().is_some(),
        Err(_) => false,
    };
    if resolved {
        Ok(())
    } else {
        Err(RequestError::Dns(host))
    }
}
