//! Object store for raw captures
//!
//! Keys are `/`-separated relative paths. Objects are written once and never
//! rewritten; each object carries a small string metadata map.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;

/// Metadata stored alongside an object
pub type ObjectMetadata = BTreeMap<String, String>;

const META_SUFFIX: &str = ".meta.json";

/// An object and its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub metadata: ObjectMetadata,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt object metadata for {0}: {1}")]
    Metadata(String, String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable keyed blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StoreError>;

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys starting with `prefix`, sorted ascending
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.ends_with(META_SUFFIX)
        || Path::new(key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
    if invalid {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Store rooted at a local directory; metadata lives in a JSON sidecar
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(META_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let meta_json = serde_json::to_vec_pretty(metadata)
            .map_err(|e| StoreError::Metadata(key.to_string(), e.to_string()))?;
        tokio::fs::write(Self::meta_path(&path), meta_json).await?;

        // Object last, so a listed key always has its metadata
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(key = %key, bytes = bytes.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let path = self.object_path(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let metadata = match tokio::fs::read(Self::meta_path(&path)).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| StoreError::Metadata(key.to_string(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ObjectMetadata::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(StoredObject { bytes, metadata })
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let root = self.root.clone();
        let prefix = prefix.to_string();

        let keys = tokio::task::spawn_blocking(move || {
            let mut keys = Vec::new();
            if !root.exists() {
                return keys;
            }
            for entry in walkdir::WalkDir::new(&root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.ends_with(META_SUFFIX) || key.ends_with(".tmp") {
                    continue;
                }
                if key.starts_with(&prefix) {
                    keys.push(key);
                }
            }
            keys.sort();
            keys
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("listing task failed: {}", e)))?;

        Ok(keys)
    }
}

/// In-memory store for tests and dry runs
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    read_only: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], metadata: &ObjectMetadata) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is read-only".to_string()));
        }
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(pairs: &[(&str, &str)]) -> ObjectMetadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_fs_put_get_list() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        store
            .put("t1/tournament/5/a.html", b"<html>5</html>", &meta(&[("hash", "abc")]))
            .await
            .unwrap();
        store
            .put("t1/tournament/12/b.html", b"<html>12</html>", &ObjectMetadata::new())
            .await
            .unwrap();

        let object = store.get("t1/tournament/5/a.html").await.unwrap();
        assert_eq!(object.bytes, b"<html>5</html>");
        assert_eq!(object.metadata.get("hash").map(String::as_str), Some("abc"));

        let keys = store.list("t1/tournament/").await.unwrap();
        assert_eq!(keys, vec!["t1/tournament/12/b.html", "t1/tournament/5/a.html"]);
        assert!(store.exists("t1/tournament/5/a.html").await.unwrap());
        assert!(!store.exists("t1/tournament/6/a.html").await.unwrap());
    }

    #[tokio::test]
    async fn test_fs_missing_object() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path().join("not-created"));
        assert!(matches!(store.get("x/y.html").await, Err(StoreError::NotFound(_))));
        assert!(store.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        for key in ["../outside.html", "/abs.html", "", "a/../b", "a.html.meta.json"] {
            assert!(
                matches!(
                    store.put(key, b"x", &ObjectMetadata::new()).await,
                    Err(StoreError::InvalidKey(_))
                ),
                "{key}"
            );
        }
    }

    #[tokio::test]
    async fn test_memory_store_read_only() {
        let store = MemoryObjectStore::new();
        store.put("a/b", b"1", &ObjectMetadata::new()).await.unwrap();
        store.set_read_only(true);
        assert!(store.put("a/c", b"2", &ObjectMetadata::new()).await.is_err());
        assert_eq!(store.list("a/").await.unwrap(), vec!["a/b"]);
        assert_eq!(store.len().await, 1);
    }
}
