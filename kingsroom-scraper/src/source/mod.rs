//! Source resolver
//!
//! For each candidate, decides between cached and live content and persists
//! newly fetched captures. Exactly one of: serve cache, fetch live, or fail
//! with a classified error.

pub mod cache;
pub mod fetcher;
pub mod store;

pub use cache::{content_hash, CacheEntry, CachedCapture, CaptureOrigin, ContentCache};
pub use fetcher::{ConditionalHeaders, FetchError, FetchResponse, HttpPageFetcher, PageFetcher};
pub use store::{FsObjectStore, MemoryObjectStore, ObjectMetadata, ObjectStore, StoreError};

use crate::models::{CandidateOutcome, Provenance, SourceRef};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Content ready for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub identifier: u64,
    pub bytes: Vec<u8>,
    pub provenance: Provenance,
    pub source: SourceRef,
    pub content_hash: String,
    /// Key of the capture the bytes came from or were written to; `None` when
    /// a live capture could not be persisted
    pub storage_key: Option<String>,
    /// Degradations that did not stop the content (failed cache write)
    pub warnings: Vec<String>,
}

/// Why no content could be resolved
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Blank page: {0}")]
    Blank(String),

    /// Retryable in a future run
    #[error("Transient failure: {0}")]
    Transient(String),
}

impl ResolveError {
    pub fn classify(&self) -> CandidateOutcome {
        match self {
            ResolveError::NotFound(_) => CandidateOutcome::NotFound,
            ResolveError::Blank(_) => CandidateOutcome::Blank,
            ResolveError::Transient(_) => CandidateOutcome::Error,
        }
    }
}

impl From<FetchError> for ResolveError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NotFound(_) => ResolveError::NotFound(e.to_string()),
            FetchError::Http(..) | FetchError::Network(_) | FetchError::Timeout => {
                ResolveError::Transient(e.to_string())
            }
        }
    }
}

/// Cache/live choice for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub use_cache: bool,
    pub force_refresh: bool,
}

/// Chooses between cached and live content
#[derive(Clone)]
pub struct SourceResolver {
    cache: ContentCache,
    fetcher: Arc<dyn PageFetcher>,
    min_content_bytes: usize,
}

impl SourceResolver {
    pub fn new(cache: ContentCache, fetcher: Arc<dyn PageFetcher>, min_content_bytes: usize) -> Self {
        Self {
            cache,
            fetcher,
            min_content_bytes,
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Resolve content for one candidate
    pub async fn resolve(
        &self,
        tenant: &str,
        identifier: u64,
        url: &str,
        policy: ResolvePolicy,
    ) -> Result<ResolvedContent, ResolveError> {
        let mut cached = match self.cache.latest(tenant, identifier).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(identifier, error = %e, "Cache lookup failed, fetching live");
                None
            }
        };

        if policy.use_cache && !policy.force_refresh {
            if let Some(capture) = cached.take() {
                debug!(identifier, key = %capture.entry.key, "Serving from cache");
                return Ok(Self::from_capture(identifier, capture, Provenance::Cache));
            }
        }

        let conditional = if policy.force_refresh {
            None
        } else {
            cached.as_ref().and_then(|c| c.entry.conditional_headers())
        };

        match self.fetcher.fetch(url, conditional.as_ref()).await? {
            FetchResponse::NotModified => match cached {
                Some(capture) => {
                    debug!(identifier, key = %capture.entry.key, "Origin unchanged");
                    Ok(Self::from_capture(identifier, capture, Provenance::CacheValidated))
                }
                // 304 without something to validate against
                None => Err(ResolveError::Transient(format!(
                    "origin answered not-modified for uncached identifier {}",
                    identifier
                ))),
            },
            FetchResponse::Fetched {
                body,
                etag,
                last_modified,
                ..
            } => {
                if body.len() < self.min_content_bytes {
                    return Err(ResolveError::Blank(format!(
                        "{} bytes is below the {} byte minimum",
                        body.len(),
                        self.min_content_bytes
                    )));
                }
                let origin = CaptureOrigin {
                    url: url.to_string(),
                    fetched_at: Utc::now(),
                    etag,
                    last_modified,
                };
                let entry = self.cache.describe(tenant, identifier, &body, origin);

                let mut warnings = Vec::new();
                let storage_key = match self.cache.write(&entry, &body).await {
                    Ok(()) => Some(entry.key.clone()),
                    Err(e) => {
                        warn!(identifier, key = %entry.key, error = %e, "Cache write failed");
                        warnings.push(format!("cache write failed: {}", e));
                        None
                    }
                };

                Ok(ResolvedContent {
                    identifier,
                    bytes: body,
                    provenance: Provenance::Live,
                    source: SourceRef::Url(url.to_string()),
                    content_hash: entry.hash,
                    storage_key,
                    warnings,
                })
            }
        }
    }

    /// Newest stored capture, without any network access
    pub async fn load_latest(&self, tenant: &str, identifier: u64) -> Result<ResolvedContent, ResolveError> {
        match self.cache.latest(tenant, identifier).await {
            Ok(Some(capture)) => Ok(Self::from_capture(identifier, capture, Provenance::Cache)),
            Ok(None) => Err(ResolveError::NotFound(format!(
                "no stored capture for identifier {}",
                identifier
            ))),
            Err(e) => Err(ResolveError::Transient(e.to_string())),
        }
    }

    /// Stored capture by exact key; `identifier` is the one the key encodes
    pub async fn load_stored(&self, identifier: u64, key: &str) -> Result<ResolvedContent, ResolveError> {
        match self.cache.load(key).await {
            Ok(capture) => Ok(Self::from_capture(identifier, capture, Provenance::Cache)),
            Err(StoreError::NotFound(_)) => Err(ResolveError::NotFound(format!("no stored capture {}", key))),
            Err(e) => Err(ResolveError::Transient(e.to_string())),
        }
    }

    fn from_capture(identifier: u64, capture: CachedCapture, provenance: Provenance) -> ResolvedContent {
        ResolvedContent {
            identifier,
            content_hash: capture.entry.hash.clone(),
            source: SourceRef::CacheKey(capture.entry.key.clone()),
            storage_key: Some(capture.entry.key),
            bytes: capture.bytes,
            provenance,
            warnings: Vec::new(),
        }
    }
}
