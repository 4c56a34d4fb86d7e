//! Batch run controller
//!
//! Drives one run: validates the request, resolves the entity, expands the
//! candidate sequence and processes candidates strictly one after another,
//! checking the stop conditions after every candidate.

use crate::error::{ScrapeError, ScrapeResult};
use crate::events::RunEvent;
use crate::models::{RunRequest, RunStatus, RunSummary};
use crate::pipeline::CandidatePipeline;
use crate::selector;
use crate::services::{IdentityResolver, ProgressLedger};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct BatchRunController {
    identity: Arc<dyn IdentityResolver>,
    ledger: Arc<dyn ProgressLedger>,
    pipeline: Arc<CandidatePipeline>,
    event_tx: Option<mpsc::Sender<RunEvent>>,
}

impl BatchRunController {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        ledger: Arc<dyn ProgressLedger>,
        pipeline: Arc<CandidatePipeline>,
    ) -> Self {
        Self {
            identity,
            ledger,
            pipeline,
            event_tx: None,
        }
    }

    /// Report progress on an event channel
    pub fn with_events(mut self, event_tx: mpsc::Sender<RunEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    async fn emit_event(&self, event: RunEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }

    /// Execute a run to a terminal status.
    ///
    /// `Err` is reserved for configuration problems detected before the first
    /// candidate; everything after that is reported in the summary.
    pub async fn run(&self, request: &RunRequest) -> ScrapeResult<RunSummary> {
        request.validate()?;

        let entity = self
            .identity
            .resolve(&request.target)
            .await
            .map_err(|e| ScrapeError::Configuration(format!("cannot resolve {}: {}", request.target, e)))?;

        let last_known = if request.mode.needs_last_known() {
            match request.resume_after {
                Some(id) => Some(id),
                None => self.ledger.last_processed(&entity.tenant).await.map_err(|e| {
                    ScrapeError::Configuration(format!(
                        "cannot determine last processed identifier for {}: {}",
                        entity.entity_id, e
                    ))
                })?,
            }
        } else {
            None
        };
        let candidates = selector::select(&request.mode, last_known)?;

        let mut summary = RunSummary::new(entity.entity_id.clone(), request.mode.name());
        let run_id = summary.run_id;
        info!(
            run_id = %run_id,
            entity = %entity.entity_id,
            mode = request.mode.name(),
            last_known = ?last_known,
            "Run started"
        );
        self.emit_event(RunEvent::RunStarted {
            run_id,
            entity_id: entity.entity_id.clone(),
            mode: request.mode.name().to_string(),
            timestamp: summary.started_at.timestamp(),
        })
        .await;

        let refresh = request.mode.is_refresh();
        let mut status = RunStatus::Completed;

        for identifier in candidates {
            self.emit_event(RunEvent::CandidateStarted { run_id, identifier }).await;

            let (report, fatal) = match self
                .pipeline
                .process(&entity, identifier, &request.options, refresh)
                .await
            {
                Ok(report) => (report, None),
                Err(fatal) => {
                    error!(run_id = %run_id, identifier, error = %fatal, "Run aborted");
                    let message = fatal.to_string();
                    (fatal.into_report(), Some(message))
                }
            };

            let outcome = report.outcome;
            summary.push(report);
            debug!(run_id = %run_id, identifier, ?outcome, state = ?summary.state, "Candidate finished");
            self.emit_event(RunEvent::CandidateFinished {
                run_id,
                identifier,
                outcome,
                state: summary.state,
            })
            .await;

            // Fatal wins over any threshold the aborting candidate also breached
            if let Some(message) = fatal {
                summary.fatal_message = Some(message);
                status = RunStatus::FatalError;
                break;
            }

            if let Some(reason) = summary.state.breached(&request.thresholds) {
                warn!(run_id = %run_id, identifier, reason = %reason, "Stop threshold reached");
                summary.stop_reason = Some(reason);
                status = RunStatus::StoppedThreshold;
                break;
            }
        }

        summary.finish(status);
        info!(
            run_id = %run_id,
            status = ?summary.status,
            processed = summary.candidates.len(),
            total_errors = summary.state.total_errors,
            last_success = ?summary.last_success_id,
            "Run finished"
        );
        self.emit_event(RunEvent::RunStopped {
            run_id,
            status: summary.status,
            stop_reason: summary.stop_reason,
            processed: summary.candidates.len(),
            timestamp: summary.ended_at.unwrap_or(summary.started_at).timestamp(),
        })
        .await;

        Ok(summary)
    }
}
