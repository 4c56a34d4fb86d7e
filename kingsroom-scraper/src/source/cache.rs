//! Content-addressed capture cache
//!
//! Captures live under `{tenant}/{category}/{identifier}/{timestamp}-{hash}.html`.
//! Timestamps are fixed-width UTC, so the last listed key for an identifier is
//! its latest capture. Entries are append-only.

use super::fetcher::ConditionalHeaders;
use super::store::{ObjectMetadata, ObjectStore, StoreError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Category segment for tournament pages
pub const TOURNAMENT_CATEGORY: &str = "tournament";

const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

const META_HASH: &str = "content-hash";
const META_SIZE: &str = "content-length";
const META_URL: &str = "source-url";
const META_FETCHED_AT: &str = "fetched-at";
const META_ETAG: &str = "etag";
const META_LAST_MODIFIED: &str = "last-modified";

/// SHA-256 over the exact bytes, lowercase hex
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Prefix holding every capture of one identifier
pub fn identifier_prefix(tenant: &str, category: &str, identifier: u64) -> String {
    format!("{}/{}/{}/", tenant, category, identifier)
}

/// Deterministic storage key for a capture
pub fn storage_key(
    tenant: &str,
    category: &str,
    identifier: u64,
    fetched_at: DateTime<Utc>,
    hash: &str,
) -> String {
    format!(
        "{}{}-{}.html",
        identifier_prefix(tenant, category, identifier),
        fetched_at.format(KEY_TIMESTAMP_FORMAT),
        hash
    )
}

/// Parse `(identifier, timestamp, hash)` back out of a storage key
pub fn parse_storage_key(key: &str) -> Option<(u64, DateTime<Utc>, String)> {
    let mut parts = key.rsplitn(2, '/');
    let file = parts.next()?;
    let identifier = parts.next()?.rsplit('/').next()?.parse().ok()?;
    let stem = file.strip_suffix(".html")?;
    let (timestamp, hash) = stem.split_once('-')?;
    let naive = NaiveDateTime::parse_from_str(timestamp, KEY_TIMESTAMP_FORMAT).ok()?;
    Some((identifier, naive.and_utc(), hash.to_string()))
}

/// Where a capture came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureOrigin {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// A stored capture's descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: String,
    pub hash: String,
    pub size: usize,
    pub origin: CaptureOrigin,
}

impl CacheEntry {
    fn to_metadata(&self) -> ObjectMetadata {
        let mut meta = ObjectMetadata::new();
        meta.insert(META_HASH.into(), self.hash.clone());
        meta.insert(META_SIZE.into(), self.size.to_string());
        meta.insert(META_URL.into(), self.origin.url.clone());
        meta.insert(META_FETCHED_AT.into(), self.origin.fetched_at.to_rfc3339());
        if let Some(etag) = &self.origin.etag {
            meta.insert(META_ETAG.into(), etag.clone());
        }
        if let Some(last_modified) = &self.origin.last_modified {
            meta.insert(META_LAST_MODIFIED.into(), last_modified.clone());
        }
        meta
    }

    /// Rebuild from stored metadata, falling back to what the key encodes
    fn from_metadata(key: &str, size: usize, meta: &ObjectMetadata) -> Self {
        let parsed = parse_storage_key(key);
        let fetched_at = meta
            .get(META_FETCHED_AT)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| parsed.as_ref().map(|(_, ts, _)| *ts))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let hash = meta
            .get(META_HASH)
            .cloned()
            .or_else(|| parsed.map(|(_, _, hash)| hash))
            .unwrap_or_default();

        Self {
            key: key.to_string(),
            hash,
            size,
            origin: CaptureOrigin {
                url: meta.get(META_URL).cloned().unwrap_or_default(),
                fetched_at,
                etag: meta.get(META_ETAG).cloned(),
                last_modified: meta.get(META_LAST_MODIFIED).cloned(),
            },
        }
    }

    /// Conditional request headers for revalidating this capture
    pub fn conditional_headers(&self) -> Option<ConditionalHeaders> {
        let headers = ConditionalHeaders {
            etag: self.origin.etag.clone(),
            last_modified: self.origin.last_modified.clone(),
        };
        (!headers.is_empty()).then_some(headers)
    }
}

/// A capture loaded from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCapture {
    pub entry: CacheEntry,
    pub bytes: Vec<u8>,
}

/// Capture cache over an object store
#[derive(Clone)]
pub struct ContentCache {
    store: Arc<dyn ObjectStore>,
    category: String,
}

impl ContentCache {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            category: TOURNAMENT_CATEGORY.to_string(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Key of the newest capture for an identifier, if any
    pub async fn latest_key(&self, tenant: &str, identifier: u64) -> Result<Option<String>, StoreError> {
        let prefix = identifier_prefix(tenant, &self.category, identifier);
        let keys = self.store.list(&prefix).await?;
        Ok(keys.into_iter().max())
    }

    /// Newest capture for an identifier, if any
    pub async fn latest(&self, tenant: &str, identifier: u64) -> Result<Option<CachedCapture>, StoreError> {
        match self.latest_key(tenant, identifier).await? {
            Some(key) => self.load(&key).await.map(Some),
            None => Ok(None),
        }
    }

    /// Load a capture by its exact key
    pub async fn load(&self, key: &str) -> Result<CachedCapture, StoreError> {
        let object = self.store.get(key).await?;
        let entry = CacheEntry::from_metadata(key, object.bytes.len(), &object.metadata);
        Ok(CachedCapture {
            entry,
            bytes: object.bytes,
        })
    }

    /// Describe a capture without writing it
    pub fn describe(&self, tenant: &str, identifier: u64, bytes: &[u8], origin: CaptureOrigin) -> CacheEntry {
        let hash = content_hash(bytes);
        CacheEntry {
            key: storage_key(tenant, &self.category, identifier, origin.fetched_at, &hash),
            hash,
            size: bytes.len(),
            origin,
        }
    }

    /// Persist a described capture
    pub async fn write(&self, entry: &CacheEntry, bytes: &[u8]) -> Result<(), StoreError> {
        self.store.put(&entry.key, bytes, &entry.to_metadata()).await
    }

    /// Highest identifier with at least one capture for the tenant
    pub async fn highest_identifier(&self, tenant: &str) -> Result<Option<u64>, StoreError> {
        let prefix = format!("{}/{}/", tenant, self.category);
        let keys = self.store.list(&prefix).await?;
        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter_map(|id| id.parse::<u64>().ok())
            .max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::store::MemoryObjectStore;
    use chrono::TimeZone;

    fn origin(secs: i64) -> CaptureOrigin {
        CaptureOrigin {
            url: "https://example.test/t?id=7".to_string(),
            fetched_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            etag: Some("\"v1\"".to_string()),
            last_modified: None,
        }
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        let hash = content_hash(b"hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"hello "));
    }

    #[test]
    fn test_storage_key_round_trip() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        let key = storage_key("kings", "tournament", 1234, at, "abcd");
        assert_eq!(key, "kings/tournament/1234/20240304T050607000Z-abcd.html");

        let (id, ts, hash) = parse_storage_key(&key).unwrap();
        assert_eq!((id, ts, hash.as_str()), (1234, at, "abcd"));
        assert!(parse_storage_key("garbage").is_none());
    }

    #[tokio::test]
    async fn test_write_then_latest() {
        let cache = ContentCache::new(Arc::new(MemoryObjectStore::new()));
        assert!(cache.latest("kings", 7).await.unwrap().is_none());

        let older = cache.describe("kings", 7, b"first", origin(0));
        cache.write(&older, b"first").await.unwrap();
        let newer = cache.describe("kings", 7, b"second", origin(60));
        cache.write(&newer, b"second").await.unwrap();
        let other = cache.describe("kings", 70, b"other", origin(120));
        cache.write(&other, b"other").await.unwrap();

        let latest = cache.latest("kings", 7).await.unwrap().unwrap();
        assert_eq!(latest.bytes, b"second");
        assert_eq!(latest.entry, newer);
        assert_eq!(latest.entry.hash, content_hash(b"second"));
        assert!(latest.entry.conditional_headers().is_some());
    }

    #[tokio::test]
    async fn test_highest_identifier() {
        let cache = ContentCache::new(Arc::new(MemoryObjectStore::new()));
        assert_eq!(cache.highest_identifier("kings").await.unwrap(), None);
        for id in [9, 100, 42] {
            let entry = cache.describe("kings", id, b"x", origin(0));
            cache.write(&entry, b"x").await.unwrap();
        }
        let elsewhere = cache.describe("queens", 5000, b"x", origin(0));
        cache.write(&elsewhere, b"x").await.unwrap();

        assert_eq!(cache.highest_identifier("kings").await.unwrap(), Some(100));
    }
}
