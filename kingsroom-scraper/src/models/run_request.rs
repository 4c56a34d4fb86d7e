//! Run request: what to process and when to give up
//!
//! A request is built by the caller, validated once before any candidate runs,
//! and never mutated afterwards.

use crate::error::{ScrapeError, ScrapeResult};
use kingsroom_common::config::ThresholdConfig;
use serde::{Deserialize, Serialize};

/// Which site a request targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum EntityTarget {
    /// Explicit entity id
    EntityId(String),
    /// Any URL on the entity's site
    Url(String),
}

impl std::fmt::Display for EntityTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityTarget::EntityId(id) => write!(f, "entity {}", id),
            EntityTarget::Url(url) => write!(f, "url {}", url),
        }
    }
}

/// Candidate selection mode with its scope parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum RunMode {
    /// One explicit identifier
    Single { id: u64 },
    /// The next `count` identifiers after the last known processed one
    #[serde(rename_all = "camelCase")]
    Bulk { count: u64 },
    /// `[start_id, end_id]` inclusive, ascending
    #[serde(rename_all = "camelCase")]
    Range { start_id: u64, end_id: u64 },
    /// Caller-supplied missing identifiers, used verbatim
    Gaps { ids: Vec<u64> },
    /// Open-ended from the last known processed identifier
    #[serde(rename_all = "camelCase")]
    Auto { max_id: Option<u64> },
    /// Stored identifiers to re-extract from cached content
    Refresh { ids: Vec<u64> },
}

impl RunMode {
    pub fn name(&self) -> &'static str {
        match self {
            RunMode::Single { .. } => "single",
            RunMode::Bulk { .. } => "bulk",
            RunMode::Range { .. } => "range",
            RunMode::Gaps { .. } => "gaps",
            RunMode::Auto { .. } => "auto",
            RunMode::Refresh { .. } => "refresh",
        }
    }

    /// Modes that continue from the last known processed identifier
    pub fn needs_last_known(&self) -> bool {
        matches!(self, RunMode::Bulk { .. } | RunMode::Auto { .. })
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, RunMode::Refresh { .. })
    }
}

/// Failure counter ceilings; reaching any of them stops the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunThresholds {
    pub max_consecutive_not_found: u32,
    pub max_consecutive_errors: u32,
    pub max_consecutive_blanks: u32,
    pub max_total_errors: u32,
}

impl Default for RunThresholds {
    fn default() -> Self {
        ThresholdConfig::default().into()
    }
}

impl From<ThresholdConfig> for RunThresholds {
    fn from(config: ThresholdConfig) -> Self {
        Self {
            max_consecutive_not_found: config.max_consecutive_not_found,
            max_consecutive_errors: config.max_consecutive_errors,
            max_consecutive_blanks: config.max_consecutive_blanks,
            max_total_errors: config.max_total_errors,
        }
    }
}

/// Behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Serve existing captures instead of fetching
    pub use_cache: bool,
    /// Always fetch live, unconditionally
    pub force_refresh: bool,
    /// Process identifiers flagged do-not-scrape
    pub ignore_do_not_scrape_flag: bool,
    /// Skip games that are currently running
    pub skip_in_progress: bool,
    /// Re-process games already stored as finished
    pub override_existing: bool,
    /// Skip games stored as not published
    pub skip_not_published: bool,
    /// Skip identifiers previously found missing
    pub skip_not_found_gaps: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            force_refresh: false,
            ignore_do_not_scrape_flag: false,
            skip_in_progress: false,
            override_existing: true,
            skip_not_published: false,
            skip_not_found_gaps: false,
        }
    }
}

/// A complete run request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub target: EntityTarget,
    pub mode: RunMode,
    #[serde(default)]
    pub thresholds: RunThresholds,
    #[serde(default)]
    pub options: RunOptions,
    /// Explicit last processed identifier for bulk/auto; when absent the
    /// progress ledger is consulted
    #[serde(default)]
    pub resume_after: Option<u64>,
}

impl RunRequest {
    pub fn new(target: EntityTarget, mode: RunMode) -> Self {
        Self {
            target,
            mode,
            thresholds: RunThresholds::default(),
            options: RunOptions::default(),
            resume_after: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: RunThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn resuming_after(mut self, id: u64) -> Self {
        self.resume_after = Some(id);
        self
    }

    /// Reject malformed requests before any candidate runs
    pub fn validate(&self) -> ScrapeResult<()> {
        let t = &self.thresholds;
        let ceilings = [
            ("maxConsecutiveNotFound", t.max_consecutive_not_found),
            ("maxConsecutiveErrors", t.max_consecutive_errors),
            ("maxConsecutiveBlanks", t.max_consecutive_blanks),
            ("maxTotalErrors", t.max_total_errors),
        ];
        for (name, value) in ceilings {
            if value == 0 {
                return Err(ScrapeError::Configuration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        match &self.mode {
            RunMode::Gaps { ids } if ids.is_empty() => Err(ScrapeError::Configuration(
                "gaps mode requires at least one identifier".to_string(),
            )),
            RunMode::Refresh { ids } if ids.is_empty() => Err(ScrapeError::Configuration(
                "refresh mode requires at least one identifier".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threshold_is_rejected() {
        let request = RunRequest::new(
            EntityTarget::EntityId("e".into()),
            RunMode::Single { id: 1 },
        )
        .with_thresholds(RunThresholds {
            max_consecutive_errors: 0,
            ..RunThresholds::default()
        });

        assert!(matches!(request.validate(), Err(ScrapeError::Configuration(_))));
    }

    #[test]
    fn test_empty_gap_list_is_rejected() {
        let request = RunRequest::new(
            EntityTarget::EntityId("e".into()),
            RunMode::Gaps { ids: vec![] },
        );
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_inverted_range_is_valid_request() {
        let request = RunRequest::new(
            EntityTarget::EntityId("e".into()),
            RunMode::Range { start_id: 10, end_id: 5 },
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "target": {"kind": "entityId", "value": "ent-1"},
            "mode": {"mode": "range", "startId": 1000, "endId": 1002}
        }"#;
        let request: RunRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, RunMode::Range { start_id: 1000, end_id: 1002 });
        assert_eq!(request.thresholds, RunThresholds::default());
        assert!(request.options.use_cache);
    }

    #[test]
    fn test_mode_helpers() {
        assert!(RunMode::Bulk { count: 5 }.needs_last_known());
        assert!(RunMode::Auto { max_id: None }.needs_last_known());
        assert!(!RunMode::Range { start_id: 1, end_id: 2 }.needs_last_known());
        assert!(RunMode::Refresh { ids: vec![1] }.is_refresh());
        assert_eq!(RunMode::Gaps { ids: vec![1] }.name(), "gaps");
    }
}
