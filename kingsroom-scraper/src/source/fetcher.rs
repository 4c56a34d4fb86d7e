//! HTTP page fetcher
//!
//! Conditional GETs against the source site with a politeness delay between
//! requests.

use async_trait::async_trait;
use kingsroom_common::config::FetchConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Validators from a previous capture, sent as conditional request headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl ConditionalHeaders {
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }
}

/// Successful fetch outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    Fetched {
        body: Vec<u8>,
        status: u16,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// 304: the origin confirmed the stored capture is current
    NotModified,
}

/// Fetch failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// 404/410
    #[error("Page not found (HTTP {0})")]
    NotFound(u16),

    #[error("HTTP error {0}: {1}")]
    Http(u16, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,
}

/// Source of page content
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
    ) -> Result<FetchResponse, FetchError>;
}

/// Per-host request pacing. Each site gets its own schedule, so entities on
/// different hosts do not slow each other down.
struct RateLimiter {
    next_slot: Mutex<HashMap<String, Instant>>,
    min_interval: Duration,
}

/// Pacing key for a URL; unparseable URLs share one bucket
fn host_key(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            next_slot: Mutex::new(HashMap::new()),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Reserve the host's next slot, then sleep until it without holding the
    /// lock
    async fn wait(&self, url: &str) {
        let host = host_key(url);
        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(&host).copied().filter(|s| *s > now).unwrap_or(now);
            slots.insert(host.clone(), slot + self.min_interval);
            slot
        };

        let now = Instant::now();
        if slot > now {
            tracing::debug!(host = %host, "Politeness delay: waiting {:?}", slot - now);
            tokio::time::sleep_until(slot.into()).await;
        }
    }
}

/// reqwest-backed fetcher
pub struct HttpPageFetcher {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(config.min_request_interval_ms)),
        })
    }
}

fn header_string(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn classify_transport(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
    ) -> Result<FetchResponse, FetchError> {
        self.rate_limiter.wait(url).await;

        let mut request = self.http_client.get(url);
        if let Some(conditional) = conditional {
            if let Some(etag) = &conditional.etag {
                request = request.header(reqwest::header::IF_NONE_MATCH, etag.as_str());
            }
            if let Some(last_modified) = &conditional.last_modified {
                request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified.as_str());
            }
        }

        tracing::debug!(url = %url, conditional = conditional.is_some(), "Fetching page");

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotModified);
        }

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchError::NotFound(status.as_u16()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Http(status.as_u16(), error_text));
        }

        let etag = header_string(&response, reqwest::header::ETAG);
        let last_modified = header_string(&response, reqwest::header::LAST_MODIFIED);
        let body = response.bytes().await.map_err(classify_transport)?.to_vec();

        tracing::debug!(url = %url, bytes = body.len(), "Fetched page");

        Ok(FetchResponse::Fetched {
            body,
            status: status.as_u16(),
            etag,
            last_modified,
        })
    }
}
