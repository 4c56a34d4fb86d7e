//! Scrape service: wiring plus the batch and interactive entry points

use crate::controller::BatchRunController;
use crate::enrich::Enricher;
use crate::error::{ScrapeError, ScrapeResult};
use crate::events::RunEvent;
use crate::models::{CandidateOutcome, CandidateReport, EntityTarget, RunOptions, RunRequest, RunSummary};
use crate::pipeline::CandidatePipeline;
use crate::services::{
    ExtractionAdapter, IdentityResolver, JsonExtractionAdapter, JsonLinesRouter, KnownGameIndex,
    NoKnownGames, PersistenceRouter, ProgressLedger, StaticIdentityResolver, StoreProgressLedger,
};
use crate::source::cache::parse_storage_key;
use crate::source::{ContentCache, FsObjectStore, HttpPageFetcher, ObjectStore, PageFetcher, SourceResolver};
use crate::validation::ValidationEngine;
use kingsroom_common::config::{RootFolderInitializer, TomlConfig};
use kingsroom_common::Error;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Everything a service needs, each behind its trait
pub struct ServiceParts {
    pub identity: Arc<dyn IdentityResolver>,
    pub store: Arc<dyn ObjectStore>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<dyn ExtractionAdapter>,
    pub router: Arc<dyn PersistenceRouter>,
    pub known_games: Arc<dyn KnownGameIndex>,
    /// Defaults to a ledger over the content cache
    pub ledger: Option<Arc<dyn ProgressLedger>>,
    pub min_content_bytes: usize,
}

pub struct ScrapeService {
    identity: Arc<dyn IdentityResolver>,
    ledger: Arc<dyn ProgressLedger>,
    pipeline: Arc<CandidatePipeline>,
}

impl ScrapeService {
    pub fn new(parts: ServiceParts) -> Self {
        let cache = ContentCache::new(parts.store);
        let ledger = parts
            .ledger
            .unwrap_or_else(|| Arc::new(StoreProgressLedger::new(cache.clone())));
        let resolver = SourceResolver::new(cache, parts.fetcher, parts.min_content_bytes);
        let pipeline = CandidatePipeline::new(
            resolver,
            parts.extractor,
            Enricher::new(ValidationEngine::new()),
            parts.router,
            parts.known_games,
        );
        Self {
            identity: parts.identity,
            ledger,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Production wiring: filesystem cache, HTTP fetcher, JSON extraction and
    /// a JSON-lines router under the root folder
    pub fn from_config(config: &TomlConfig, root: &RootFolderInitializer) -> kingsroom_common::Result<Self> {
        root.ensure_directory_exists()?;
        let fetcher = HttpPageFetcher::new(&config.fetch).map_err(|e| Error::Config(e.to_string()))?;
        info!(
            root = %root.root().display(),
            entities = config.entities.len(),
            "Scrape service configured"
        );

        Ok(Self::new(ServiceParts {
            identity: Arc::new(StaticIdentityResolver::new(config.entities.clone())),
            store: Arc::new(FsObjectStore::new(root.cache_path())),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(JsonExtractionAdapter),
            router: Arc::new(JsonLinesRouter::new(root.enriched_output_path())),
            known_games: Arc::new(NoKnownGames),
            ledger: None,
            min_content_bytes: config.fetch.min_content_bytes,
        }))
    }

    pub fn controller(&self) -> BatchRunController {
        BatchRunController::new(self.identity.clone(), self.ledger.clone(), self.pipeline.clone())
    }

    /// Run a batch to completion
    pub async fn run(&self, request: &RunRequest) -> ScrapeResult<RunSummary> {
        self.controller().run(request).await
    }

    /// Run a batch, reporting progress on `event_tx`
    pub async fn run_with_events(
        &self,
        request: &RunRequest,
        event_tx: mpsc::Sender<RunEvent>,
    ) -> ScrapeResult<RunSummary> {
        self.controller().with_events(event_tx).run(request).await
    }

    /// Process one identifier outside any run; no counters are involved
    pub async fn process_single(
        &self,
        target: &EntityTarget,
        identifier: u64,
        options: &RunOptions,
    ) -> CandidateReport {
        let entity = match self.identity.resolve(target).await {
            Ok(entity) => entity,
            Err(e) => return CandidateReport::failed(identifier, CandidateOutcome::Error, e.to_string()),
        };
        self.pipeline
            .process(&entity, identifier, options, false)
            .await
            .unwrap_or_else(|fatal| {
                warn!(identifier, error = %fatal, "Persistence unavailable");
                fatal.into_report()
            })
    }

    /// Re-run extraction and enrichment over an explicitly stored capture.
    ///
    /// A key that does not follow the storage key layout names no identifier
    /// and is refused as a malformed request.
    pub async fn reprocess_key(&self, target: &EntityTarget, key: &str) -> ScrapeResult<CandidateReport> {
        let (identifier, _, _) = parse_storage_key(key)
            .ok_or_else(|| ScrapeError::Configuration(format!("malformed storage key '{}'", key)))?;
        let entity = match self.identity.resolve(target).await {
            Ok(entity) => entity,
            Err(e) => return Ok(CandidateReport::failed(identifier, CandidateOutcome::Error, e.to_string())),
        };
        Ok(self
            .pipeline
            .process_stored(&entity, identifier, key)
            .await
            .unwrap_or_else(|fatal| {
                warn!(identifier, error = %fatal, "Persistence unavailable");
                fatal.into_report()
            }))
    }
}
