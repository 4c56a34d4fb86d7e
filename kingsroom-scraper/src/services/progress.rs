//! Run context lookups: last processed identifier and known games

use crate::source::{ContentCache, StoreError};
use async_trait::async_trait;
use kingsroom_common::GameStatus;
use std::collections::HashMap;

/// Last processed identifier for an entity
#[async_trait]
pub trait ProgressLedger: Send + Sync {
    async fn last_processed(&self, tenant: &str) -> Result<Option<u64>, StoreError>;
}

/// Ledger derived from the captures already in the content cache
pub struct StoreProgressLedger {
    cache: ContentCache,
}

impl StoreProgressLedger {
    pub fn new(cache: ContentCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ProgressLedger for StoreProgressLedger {
    async fn last_processed(&self, tenant: &str) -> Result<Option<u64>, StoreError> {
        self.cache.highest_identifier(tenant).await
    }
}

/// What downstream storage already knows about an identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownGame {
    pub status: Option<GameStatus>,
    pub do_not_scrape: bool,
    /// A previous run classified the identifier NOT_FOUND
    pub previously_not_found: bool,
}

#[async_trait]
pub trait KnownGameIndex: Send + Sync {
    async fn lookup(&self, entity_id: &str, identifier: u64) -> Option<KnownGame>;
}

/// Index that knows nothing; no skip rule ever applies
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKnownGames;

#[async_trait]
impl KnownGameIndex for NoKnownGames {
    async fn lookup(&self, _entity_id: &str, _identifier: u64) -> Option<KnownGame> {
        None
    }
}

/// Fixed in-memory index
#[derive(Debug, Default, Clone)]
pub struct StaticKnownGames {
    games: HashMap<(String, u64), KnownGame>,
}

impl StaticKnownGames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_game(mut self, entity_id: &str, identifier: u64, game: KnownGame) -> Self {
        self.games.insert((entity_id.to_string(), identifier), game);
        self
    }
}

#[async_trait]
impl KnownGameIndex for StaticKnownGames {
    async fn lookup(&self, entity_id: &str, identifier: u64) -> Option<KnownGame> {
        self.games.get(&(entity_id.to_string(), identifier)).cloned()
    }
}
