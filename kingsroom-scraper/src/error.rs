//! Error types for kingsroom-scraper
//!
//! Only request-level failures are errors. Everything that goes wrong with a
//! single candidate is reported as a `CandidateOutcome` instead.

use crate::models::{CandidateOutcome, CandidateReport};
use thiserror::Error;

/// Request-level error
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Malformed request or unresolvable precondition; raised before any
    /// candidate is processed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// kingsroom-common error
    #[error("Common error: {0}")]
    Common(#[from] kingsroom_common::Error),
}

/// Result type for request-level operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// A failure that invalidates the rest of the run (e.g. the persistence
/// layer is unreachable, so every further candidate would be lost).
///
/// Carries the ERROR report of the candidate that hit it, with whatever was
/// already obtained for it (capture, hash, enriched record).
#[derive(Debug, Clone, Error)]
#[error("Fatal run error: {message}")]
pub struct FatalError {
    pub message: String,
    pub report: Box<CandidateReport>,
}

impl FatalError {
    pub fn new(message: impl Into<String>, mut report: CandidateReport) -> Self {
        let message = message.into();
        report.outcome = CandidateOutcome::Error;
        report.message = Some(message.clone());
        report.persistence = None;
        Self {
            message,
            report: Box::new(report),
        }
    }

    /// The aborting candidate's report
    pub fn into_report(self) -> CandidateReport {
        *self.report
    }
}
