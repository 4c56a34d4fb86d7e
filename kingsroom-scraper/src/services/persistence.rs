//! Persistence router seam
//!
//! Decides create/update/no-change for a valid enriched record. Ships with a
//! JSON-lines router that appends each bundle to a local file.

use super::identity::EntityContext;
use crate::models::{EnrichedRecord, PersistenceAction, PersistenceResult};
use crate::source::content_hash;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    /// The record itself was refused; the candidate fails, the run goes on
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// Downstream storage is gone; the run cannot continue
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PersistenceRouter: Send + Sync {
    async fn route(
        &self,
        record: &EnrichedRecord,
        entity: &EntityContext,
    ) -> Result<PersistenceResult, RouterError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Line<'a> {
    entity_id: &'a str,
    tenant: &'a str,
    action: PersistenceAction,
    record: &'a EnrichedRecord,
}

/// Identifiers whose last written content the router remembers
pub const DEFAULT_SEEN_CAPACITY: usize = 10_000;

type SeenKey = (String, u64);

/// Content hash of the last line written per identifier, oldest evicted first
#[derive(Default)]
struct SeenRecords {
    hashes: HashMap<SeenKey, String>,
    order: VecDeque<SeenKey>,
}

impl SeenRecords {
    fn get(&self, key: &SeenKey) -> Option<&String> {
        self.hashes.get(key)
    }

    fn insert(&mut self, key: SeenKey, hash: String, capacity: usize) {
        if self.hashes.insert(key.clone(), hash).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.hashes.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.hashes.len()
    }
}

/// Appends every routed record as one JSON line.
///
/// Remembers a content hash for the most recent identifiers so a repeated
/// identical record reports `NO_CHANGES` and is not appended again. An
/// identifier that has been evicted is treated as new.
pub struct JsonLinesRouter {
    path: PathBuf,
    capacity: usize,
    seen: Mutex<SeenRecords>,
}

impl JsonLinesRouter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_SEEN_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity: capacity.max(1),
            seen: Mutex::new(SeenRecords::default()),
        }
    }

    /// Number of identifiers currently remembered
    pub async fn remembered(&self) -> usize {
        self.seen.lock().await.len()
    }
}

#[async_trait]
impl PersistenceRouter for JsonLinesRouter {
    async fn route(
        &self,
        record: &EnrichedRecord,
        entity: &EntityContext,
    ) -> Result<PersistenceResult, RouterError> {
        let fields = serde_json::to_vec(&record.fields)
            .map_err(|e| RouterError::Rejected(e.to_string()))?;
        let fingerprint = content_hash(&fields);
        let key = (entity.entity_id.clone(), record.identifier);

        let mut seen = self.seen.lock().await;
        let action = match seen.get(&key) {
            Some(previous) if *previous == fingerprint => {
                return Ok(PersistenceResult {
                    action: PersistenceAction::NoChanges,
                    game_id: Some(game_id(entity, record)),
                    assignments: Vec::new(),
                })
            }
            Some(_) => PersistenceAction::Updated,
            None => PersistenceAction::Created,
        };

        let line = Line {
            entity_id: &entity.entity_id,
            tenant: &entity.tenant,
            action,
            record,
        };
        let mut json =
            serde_json::to_vec(&line).map_err(|e| RouterError::Rejected(e.to_string()))?;
        json.push(b'\n');

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RouterError::Unavailable(e.to_string()))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RouterError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(&json)
            .await
            .map_err(|e| RouterError::Unavailable(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| RouterError::Unavailable(e.to_string()))?;

        seen.insert(key, fingerprint, self.capacity);
        tracing::debug!(identifier = record.identifier, ?action, "Appended enriched record");

        Ok(PersistenceResult {
            action,
            game_id: Some(game_id(entity, record)),
            assignments: Vec::new(),
        })
    }
}

fn game_id(entity: &EntityContext, record: &EnrichedRecord) -> String {
    format!("{}#{}", entity.entity_id, record.identifier)
}
