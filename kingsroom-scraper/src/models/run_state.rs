//! Run state machine and failure counters
//!
//! A run starts `RUNNING` and ends in exactly one terminal status:
//! `COMPLETED`, `STOPPED_THRESHOLD` or `FATAL_ERROR`.
//!
//! Counter rules per candidate outcome:
//! - SUCCESS resets the three consecutive counters
//! - NOT_FOUND increments `consecutive_not_found` only
//! - BLANK increments `consecutive_blanks` only
//! - ERROR increments `consecutive_errors` and `total_errors`
//! - SKIPPED leaves every counter alone
//!
//! `total_errors` never resets within a run.

use super::outcome::CandidateOutcome;
use super::outcome::CandidateReport;
use super::run_request::RunThresholds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    StoppedThreshold,
    Completed,
    FatalError,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Failure counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub consecutive_errors: u32,
    pub total_errors: u32,
    pub consecutive_blanks: u32,
    pub consecutive_not_found: u32,
}

/// Which ceiling stopped the run, with the counter value at the moment of stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "counter", rename_all = "camelCase")]
pub enum StopReason {
    TotalErrors { observed: u32, threshold: u32 },
    ConsecutiveErrors { observed: u32, threshold: u32 },
    ConsecutiveNotFound { observed: u32, threshold: u32 },
    ConsecutiveBlanks { observed: u32, threshold: u32 },
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (name, observed, threshold) = match self {
            StopReason::TotalErrors { observed, threshold } => ("total errors", observed, threshold),
            StopReason::ConsecutiveErrors { observed, threshold } => {
                ("consecutive errors", observed, threshold)
            }
            StopReason::ConsecutiveNotFound { observed, threshold } => {
                ("consecutive not found", observed, threshold)
            }
            StopReason::ConsecutiveBlanks { observed, threshold } => {
                ("consecutive blanks", observed, threshold)
            }
        };
        write!(f, "{} reached {} (threshold {})", name, observed, threshold)
    }
}

impl RunState {
    /// Apply one candidate outcome
    pub fn record(&mut self, outcome: CandidateOutcome) {
        match outcome {
            CandidateOutcome::Success => {
                self.consecutive_errors = 0;
                self.consecutive_blanks = 0;
                self.consecutive_not_found = 0;
            }
            CandidateOutcome::NotFound => self.consecutive_not_found += 1,
            CandidateOutcome::Blank => self.consecutive_blanks += 1,
            CandidateOutcome::Error => {
                self.consecutive_errors += 1;
                self.total_errors += 1;
            }
            CandidateOutcome::Skipped => {}
        }
    }

    /// First breached ceiling, checked in a fixed order
    pub fn breached(&self, t: &RunThresholds) -> Option<StopReason> {
        if self.total_errors >= t.max_total_errors {
            return Some(StopReason::TotalErrors {
                observed: self.total_errors,
                threshold: t.max_total_errors,
            });
        }
        if self.consecutive_errors >= t.max_consecutive_errors {
            return Some(StopReason::ConsecutiveErrors {
                observed: self.consecutive_errors,
                threshold: t.max_consecutive_errors,
            });
        }
        if self.consecutive_not_found >= t.max_consecutive_not_found {
            return Some(StopReason::ConsecutiveNotFound {
                observed: self.consecutive_not_found,
                threshold: t.max_consecutive_not_found,
            });
        }
        if self.consecutive_blanks >= t.max_consecutive_blanks {
            return Some(StopReason::ConsecutiveBlanks {
                observed: self.consecutive_blanks,
                threshold: t.max_consecutive_blanks,
            });
        }
        None
    }
}

/// Everything a batch caller gets back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: Uuid,
    pub entity_id: String,
    pub mode: String,
    pub status: RunStatus,
    pub stop_reason: Option<StopReason>,
    /// Set when the run ended in `FATAL_ERROR`
    pub fatal_message: Option<String>,
    pub state: RunState,
    pub candidates: Vec<CandidateReport>,
    /// Highest identifier that ended in SUCCESS
    pub last_success_id: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(entity_id: String, mode: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            entity_id,
            mode: mode.to_string(),
            status: RunStatus::Running,
            stop_reason: None,
            fatal_message: None,
            state: RunState::default(),
            candidates: Vec::new(),
            last_success_id: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Record a finished candidate and update counters
    pub fn push(&mut self, report: CandidateReport) {
        self.state.record(report.outcome);
        if report.outcome == CandidateOutcome::Success {
            self.last_success_id = Some(
                self.last_success_id
                    .map_or(report.identifier, |prev| prev.max(report.identifier)),
            );
        }
        self.candidates.push(report);
    }

    /// Move to a terminal status
    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        if status.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub fn count(&self, outcome: CandidateOutcome) -> usize {
        self.candidates.iter().filter(|c| c.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(errors: u32) -> RunThresholds {
        RunThresholds {
            max_consecutive_not_found: 10,
            max_consecutive_errors: errors,
            max_consecutive_blanks: 10,
            max_total_errors: 10,
        }
    }

    #[test]
    fn test_success_resets_consecutive_but_not_total() {
        let mut state = RunState::default();
        state.record(CandidateOutcome::Error);
        state.record(CandidateOutcome::Blank);
        state.record(CandidateOutcome::NotFound);
        state.record(CandidateOutcome::Success);

        assert_eq!(state.consecutive_errors, 0);
        assert_eq!(state.consecutive_blanks, 0);
        assert_eq!(state.consecutive_not_found, 0);
        assert_eq!(state.total_errors, 1);
    }

    #[test]
    fn test_outcomes_touch_only_their_counter() {
        let mut state = RunState::default();
        state.record(CandidateOutcome::NotFound);
        state.record(CandidateOutcome::NotFound);
        state.record(CandidateOutcome::Blank);
        state.record(CandidateOutcome::Skipped);

        assert_eq!(state.consecutive_not_found, 2);
        assert_eq!(state.consecutive_blanks, 1);
        assert_eq!(state.consecutive_errors, 0);
        assert_eq!(state.total_errors, 0);
    }

    #[test]
    fn test_breach_at_exact_threshold() {
        let mut state = RunState::default();
        let t = thresholds(3);
        state.record(CandidateOutcome::Error);
        state.record(CandidateOutcome::Error);
        assert_eq!(state.breached(&t), None);
        state.record(CandidateOutcome::Error);
        assert_eq!(
            state.breached(&t),
            Some(StopReason::ConsecutiveErrors { observed: 3, threshold: 3 })
        );
    }

    #[test]
    fn test_total_errors_checked_first() {
        let state = RunState {
            consecutive_errors: 5,
            total_errors: 5,
            ..Default::default()
        };
        let t = RunThresholds {
            max_total_errors: 5,
            ..thresholds(5)
        };
        assert!(matches!(state.breached(&t), Some(StopReason::TotalErrors { .. })));
    }

    #[test]
    fn test_status_terminality() {
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::StoppedThreshold.is_terminal());
        assert!(RunStatus::FatalError.is_terminal());
    }

    #[test]
    fn test_stop_reason_display() {
        let reason = StopReason::ConsecutiveBlanks { observed: 4, threshold: 4 };
        assert_eq!(reason.to_string(), "consecutive blanks reached 4 (threshold 4)");
    }
}
