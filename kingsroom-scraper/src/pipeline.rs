//! Per-candidate pipeline
//!
//! skip check → resolve content → extract → correct/validate/enrich → route.
//! Every path ends in a [`CandidateReport`]; an unavailable persistence layer
//! wraps its report in a [`FatalError`].

use crate::enrich::Enricher;
use crate::error::FatalError;
use crate::models::{
    CandidateOutcome, CandidateReport, CaptureContext, RunOptions,
};
use crate::services::{
    EntityContext, ExtractionAdapter, KnownGame, KnownGameIndex, PersistenceRouter, RouterError,
};
use crate::source::{ResolvePolicy, ResolvedContent, SourceResolver};
use kingsroom_common::GameStatus;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a known game should not be processed again, if it should not
pub fn skip_reason(known: &KnownGame, options: &RunOptions, refresh: bool) -> Option<String> {
    if known.do_not_scrape && !options.ignore_do_not_scrape_flag {
        return Some("flagged do-not-scrape".to_string());
    }
    if options.skip_in_progress && known.status.is_some_and(|s| s.is_in_progress()) {
        return Some("game in progress".to_string());
    }
    if options.skip_not_published && known.status == Some(GameStatus::NotPublished) {
        return Some("game not published".to_string());
    }
    if options.skip_not_found_gaps && known.previously_not_found {
        return Some("previously not found".to_string());
    }
    // Refresh exists to reprocess stored games
    if !refresh && !options.override_existing && known.status == Some(GameStatus::Finished) {
        return Some("finished game already stored".to_string());
    }
    None
}

/// Processes one candidate at a time
pub struct CandidatePipeline {
    resolver: SourceResolver,
    extractor: Arc<dyn ExtractionAdapter>,
    enricher: Enricher,
    router: Arc<dyn PersistenceRouter>,
    known_games: Arc<dyn KnownGameIndex>,
}

impl CandidatePipeline {
    pub fn new(
        resolver: SourceResolver,
        extractor: Arc<dyn ExtractionAdapter>,
        enricher: Enricher,
        router: Arc<dyn PersistenceRouter>,
        known_games: Arc<dyn KnownGameIndex>,
    ) -> Self {
        Self {
            resolver,
            extractor,
            enricher,
            router,
            known_games,
        }
    }

    pub fn resolver(&self) -> &SourceResolver {
        &self.resolver
    }

    /// Process one identifier. In refresh mode content comes from the newest
    /// stored capture and the network is never touched.
    pub async fn process(
        &self,
        entity: &EntityContext,
        identifier: u64,
        options: &RunOptions,
        refresh: bool,
    ) -> Result<CandidateReport, FatalError> {
        if let Some(known) = self.known_games.lookup(&entity.entity_id, identifier).await {
            if let Some(reason) = skip_reason(&known, options, refresh) {
                debug!(identifier, reason = %reason, "Skipping candidate");
                return Ok(CandidateReport::skipped(identifier, reason));
            }
        }

        let resolved = if refresh {
            self.resolver.load_latest(&entity.tenant, identifier).await
        } else {
            let policy = ResolvePolicy {
                use_cache: options.use_cache,
                force_refresh: options.force_refresh,
            };
            self.resolver
                .resolve(&entity.tenant, identifier, &entity.page_url(identifier), policy)
                .await
        };

        match resolved {
            Ok(content) => self.process_content(entity, content).await,
            Err(e) => {
                debug!(identifier, error = %e, "No content");
                Ok(CandidateReport::failed(identifier, e.classify(), e.to_string()))
            }
        }
    }

    /// Re-run extraction and enrichment over one stored capture of `identifier`
    pub async fn process_stored(
        &self,
        entity: &EntityContext,
        identifier: u64,
        key: &str,
    ) -> Result<CandidateReport, FatalError> {
        match self.resolver.load_stored(identifier, key).await {
            Ok(content) => self.process_content(entity, content).await,
            Err(e) => Ok(CandidateReport::failed(identifier, e.classify(), e.to_string())),
        }
    }

    async fn process_content(
        &self,
        entity: &EntityContext,
        content: ResolvedContent,
    ) -> Result<CandidateReport, FatalError> {
        let identifier = content.identifier;
        let capture = CaptureContext {
            identifier,
            source: content.source.clone(),
            provenance: content.provenance,
        };

        let raw = match self.extractor.extract(&content.bytes, &capture) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(identifier, adapter = self.extractor.name(), error = %e, "Extraction failed");
                let mut report = CandidateReport::failed(identifier, e.classify(), e.to_string());
                report.provenance = Some(content.provenance);
                report.content_hash = Some(content.content_hash);
                report.storage_key = content.storage_key;
                report.warnings = content.warnings;
                return Ok(report);
            }
        };

        let record = self.enricher.enrich(raw, entity);
        let valid = record.is_valid();

        let mut report = CandidateReport::success(identifier, record);
        report.content_hash = Some(content.content_hash);
        report.storage_key = content.storage_key;
        report.warnings = content.warnings;

        let routed = match &report.record {
            Some(record) if valid => Some(self.router.route(record, entity).await),
            _ => None,
        };

        match routed {
            Some(Ok(result)) => report.persistence = Some(result),
            Some(Err(RouterError::Unavailable(msg))) => {
                return Err(FatalError::new(format!("persistence unavailable: {}", msg), report));
            }
            Some(Err(e)) => {
                warn!(identifier, error = %e, "Persistence rejected record");
                report.outcome = CandidateOutcome::Error;
                report.message = Some(e.to_string());
            }
            None => report
                .warnings
                .push("record has validation errors; not routed to persistence".to_string()),
        }

        debug!(
            identifier,
            outcome = ?report.outcome,
            provenance = ?report.provenance,
            "Candidate processed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known(status: Option<GameStatus>) -> KnownGame {
        KnownGame {
            status,
            do_not_scrape: false,
            previously_not_found: false,
        }
    }

    #[test]
    fn test_no_rule_applies_by_default() {
        let options = RunOptions::default();
        assert_eq!(skip_reason(&known(Some(GameStatus::Running)), &options, false), None);
        assert_eq!(skip_reason(&known(None), &options, false), None);
    }

    #[test]
    fn test_do_not_scrape_flag() {
        let mut game = known(None);
        game.do_not_scrape = true;
        let mut options = RunOptions::default();
        assert!(skip_reason(&game, &options, false).is_some());
        options.ignore_do_not_scrape_flag = true;
        assert!(skip_reason(&game, &options, false).is_none());
    }

    #[test]
    fn test_status_rules() {
        let options = RunOptions {
            skip_in_progress: true,
            skip_not_published: true,
            ..RunOptions::default()
        };
        assert!(skip_reason(&known(Some(GameStatus::ClockStopped)), &options, false).is_some());
        assert!(skip_reason(&known(Some(GameStatus::NotPublished)), &options, false).is_some());
        assert!(skip_reason(&known(Some(GameStatus::Scheduled)), &options, false).is_none());
    }

    #[test]
    fn test_existing_finished_game_without_override() {
        let options = RunOptions {
            override_existing: false,
            ..RunOptions::default()
        };
        let finished = known(Some(GameStatus::Finished));
        assert!(skip_reason(&finished, &options, false).is_some());
        assert!(skip_reason(&finished, &options, true).is_none());
    }

    #[test]
    fn test_not_found_gaps() {
        let mut game = known(None);
        game.previously_not_found = true;
        let options = RunOptions {
            skip_not_found_gaps: true,
            ..RunOptions::default()
        };
        assert!(skip_reason(&game, &options, false).is_some());
    }
}
