//! Per-candidate outcomes and reports

use super::record::{EnrichedRecord, Provenance};
use serde::{Deserialize, Serialize};

/// Classification of one processed candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateOutcome {
    Success,
    Skipped,
    NotFound,
    Blank,
    Error,
}

/// Decision taken by the persistence router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistenceAction {
    Created,
    Updated,
    NoChanges,
}

/// Persistence router answer, including assignment side-results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceResult {
    pub action: PersistenceAction,
    /// Id of the stored game, when the router reports one
    pub game_id: Option<String>,
    /// Venue/series/recurring-game assignments made while saving
    #[serde(default)]
    pub assignments: Vec<String>,
}

impl PersistenceResult {
    pub fn new(action: PersistenceAction) -> Self {
        Self {
            action,
            game_id: None,
            assignments: Vec::new(),
        }
    }
}

/// Structured result for one candidate; produced for every outcome so callers
/// always receive the same shape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    pub identifier: u64,
    pub outcome: CandidateOutcome,
    /// Reason for a non-success outcome
    pub message: Option<String>,
    pub provenance: Option<Provenance>,
    pub content_hash: Option<String>,
    pub storage_key: Option<String>,
    pub record: Option<EnrichedRecord>,
    pub persistence: Option<PersistenceResult>,
    /// Degradations that did not change the outcome (e.g. cache write failures)
    pub warnings: Vec<String>,
}

impl CandidateReport {
    fn bare(identifier: u64, outcome: CandidateOutcome, message: Option<String>) -> Self {
        Self {
            identifier,
            outcome,
            message,
            provenance: None,
            content_hash: None,
            storage_key: None,
            record: None,
            persistence: None,
            warnings: Vec::new(),
        }
    }

    pub fn skipped(identifier: u64, reason: impl Into<String>) -> Self {
        Self::bare(identifier, CandidateOutcome::Skipped, Some(reason.into()))
    }

    pub fn failed(identifier: u64, outcome: CandidateOutcome, message: impl Into<String>) -> Self {
        Self::bare(identifier, outcome, Some(message.into()))
    }

    pub fn success(identifier: u64, record: EnrichedRecord) -> Self {
        let mut report = Self::bare(identifier, CandidateOutcome::Success, None);
        report.provenance = Some(record.provenance);
        report.record = Some(record);
        report
    }

    pub fn is_success(&self) -> bool {
        self.outcome == CandidateOutcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_report_has_structured_shape() {
        let report = CandidateReport::failed(42, CandidateOutcome::Error, "timeout");
        assert_eq!(report.identifier, 42);
        assert_eq!(report.message.as_deref(), Some("timeout"));
        assert!(report.record.is_none());
        assert!(!report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "ERROR");
        assert!(json["record"].is_null());
    }

    #[test]
    fn test_persistence_result_serde() {
        let result = PersistenceResult::new(PersistenceAction::NoChanges);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("NO_CHANGES"));
        let back: PersistenceResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
