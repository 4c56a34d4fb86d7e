//! Run progress events

use crate::models::{CandidateOutcome, RunState, RunStatus, StopReason};
use serde::Serialize;
use uuid::Uuid;

/// Emitted on the controller's optional event channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted {
        run_id: Uuid,
        entity_id: String,
        mode: String,
        /// Unix timestamp (seconds since epoch)
        timestamp: i64,
    },

    #[serde(rename_all = "camelCase")]
    CandidateStarted { run_id: Uuid, identifier: u64 },

    #[serde(rename_all = "camelCase")]
    CandidateFinished {
        run_id: Uuid,
        identifier: u64,
        outcome: CandidateOutcome,
        state: RunState,
    },

    #[serde(rename_all = "camelCase")]
    RunStopped {
        run_id: Uuid,
        status: RunStatus,
        stop_reason: Option<StopReason>,
        processed: usize,
        timestamp: i64,
    },
}
