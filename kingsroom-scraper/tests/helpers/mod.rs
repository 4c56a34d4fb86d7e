//! Shared test doubles for scraper integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use kingsroom_common::config::EntityConfig;
use kingsroom_scraper::models::{EnrichedRecord, PersistenceAction, PersistenceResult};
use kingsroom_scraper::services::{
    EntityContext, JsonExtractionAdapter, KnownGameIndex, NoKnownGames, PersistenceRouter,
    RouterError, StaticIdentityResolver,
};
use kingsroom_scraper::source::{
    ConditionalHeaders, FetchError, FetchResponse, MemoryObjectStore, PageFetcher,
};
use kingsroom_scraper::{ScrapeService, ServiceParts};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const ENTITY: &str = "kings-sydney";
pub const TENANT: &str = "kings";
pub const BASE_URL: &str = "https://kingsroom.example";

pub fn page_url(identifier: u64) -> String {
    format!("{}/tournament/{}", BASE_URL, identifier)
}

pub fn entity_config() -> EntityConfig {
    EntityConfig {
        id: ENTITY.to_string(),
        tenant: TENANT.to_string(),
        base_url: BASE_URL.to_string(),
        page_url_template: format!("{}/tournament/{{id}}", BASE_URL),
    }
}

/// A complete, valid tournament page
pub fn tournament_page(identifier: u64) -> Vec<u8> {
    serde_json::json!({
        "name": format!("Monday Deepstack #{}", identifier),
        "gameStartDateTime": "2024-03-04T19:00:00",
        "buyIn": "100",
        "rake": "10",
        "gameVariant": "NLHE",
        "guaranteeAmount": "5,000",
    })
    .to_string()
    .into_bytes()
}

pub fn fetched(body: Vec<u8>, etag: Option<&str>) -> Result<FetchResponse, FetchError> {
    Ok(FetchResponse::Fetched {
        body,
        status: 200,
        etag: etag.map(str::to_string),
        last_modified: None,
    })
}

/// Recorded fetch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub url: String,
    pub conditional: Option<ConditionalHeaders>,
}

/// Fetcher answering from per-URL scripts; unscripted URLs are 404
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Result<FetchResponse, FetchError>>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, identifier: u64, response: Result<FetchResponse, FetchError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(page_url(identifier))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
    ) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(FetchCall {
            url: url.to_string(),
            conditional: conditional.cloned(),
        });
        self.scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Err(FetchError::NotFound(404)))
    }
}

/// How the recording router answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterMode {
    Accept,
    Reject,
    Unavailable,
}

pub struct RecordingRouter {
    mode: RouterMode,
    routed: Mutex<Vec<EnrichedRecord>>,
}

impl RecordingRouter {
    pub fn new(mode: RouterMode) -> Self {
        Self {
            mode,
            routed: Mutex::new(Vec::new()),
        }
    }

    pub fn routed_ids(&self) -> Vec<u64> {
        self.routed.lock().unwrap().iter().map(|r| r.identifier).collect()
    }

    pub fn routed(&self) -> Vec<EnrichedRecord> {
        self.routed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceRouter for RecordingRouter {
    async fn route(
        &self,
        record: &EnrichedRecord,
        _entity: &EntityContext,
    ) -> Result<PersistenceResult, RouterError> {
        match self.mode {
            RouterMode::Accept => {
                self.routed.lock().unwrap().push(record.clone());
                Ok(PersistenceResult::new(PersistenceAction::Created))
            }
            RouterMode::Reject => Err(RouterError::Rejected("duplicate venue".to_string())),
            RouterMode::Unavailable => Err(RouterError::Unavailable("connection refused".to_string())),
        }
    }
}

pub struct Harness {
    pub service: ScrapeService,
    pub fetcher: Arc<ScriptedFetcher>,
    pub store: Arc<MemoryObjectStore>,
    pub router: Arc<RecordingRouter>,
}

pub fn harness() -> Harness {
    build(RouterMode::Accept, Arc::new(NoKnownGames))
}

pub fn harness_with(mode: RouterMode, known_games: Arc<dyn KnownGameIndex>) -> Harness {
    build(mode, known_games)
}

fn build(mode: RouterMode, known_games: Arc<dyn KnownGameIndex>) -> Harness {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = Arc::new(MemoryObjectStore::new());
    let router = Arc::new(RecordingRouter::new(mode));

    let service = ScrapeService::new(ServiceParts {
        identity: Arc::new(StaticIdentityResolver::new(vec![entity_config()])),
        store: store.clone(),
        fetcher: fetcher.clone(),
        extractor: Arc::new(JsonExtractionAdapter),
        router: router.clone(),
        known_games,
        ledger: None,
        min_content_bytes: 16,
    });

    Harness {
        service,
        fetcher,
        store,
        router,
    }
}
