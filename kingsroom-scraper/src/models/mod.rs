//! Run, candidate and record models

pub mod outcome;
pub mod record;
pub mod run_request;
pub mod run_state;

pub use outcome::{CandidateOutcome, CandidateReport, PersistenceAction, PersistenceResult};
pub use record::{CaptureContext, EnrichedRecord, Provenance, RawRecord, SourceRef};
pub use run_request::{EntityTarget, RunMode, RunOptions, RunRequest, RunThresholds};
pub use run_state::{RunState, RunStatus, RunSummary, StopReason};
