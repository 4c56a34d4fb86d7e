//! Extraction adapter seam
//!
//! Site-specific parsers turn captured bytes into a raw field map. Besides
//! parse failures an adapter can recognize a "not found" or blank page that
//! the origin still answered with 200.

use crate::models::{CandidateOutcome, CaptureContext, RawRecord};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Page reports tournament not found: {0}")]
    NotFound(String),

    #[error("Page has no tournament content: {0}")]
    Blank(String),
}

impl ExtractionError {
    pub fn classify(&self) -> CandidateOutcome {
        match self {
            ExtractionError::Parse(_) => CandidateOutcome::Error,
            ExtractionError::NotFound(_) => CandidateOutcome::NotFound,
            ExtractionError::Blank(_) => CandidateOutcome::Blank,
        }
    }
}

/// Parses a capture into a raw record
pub trait ExtractionAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, bytes: &[u8], capture: &CaptureContext) -> Result<RawRecord, ExtractionError>;
}

/// Adapter for captures that are JSON documents with a top-level object.
///
/// An object with `"notFound": true` reports a missing tournament; an empty
/// object is blank.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExtractionAdapter;

const NOT_FOUND_MARKER: &str = "notFound";

impl ExtractionAdapter for JsonExtractionAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, bytes: &[u8], capture: &CaptureContext) -> Result<RawRecord, ExtractionError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ExtractionError::Parse(e.to_string()))?;

        let Value::Object(mut fields) = value else {
            return Err(ExtractionError::Parse(
                "expected a top-level JSON object".to_string(),
            ));
        };

        if fields.get(NOT_FOUND_MARKER) == Some(&Value::Bool(true)) {
            return Err(ExtractionError::NotFound(format!(
                "identifier {}",
                capture.identifier
            )));
        }
        fields.remove(NOT_FOUND_MARKER);

        if fields.is_empty() {
            return Err(ExtractionError::Blank(format!("identifier {}", capture.identifier)));
        }

        Ok(RawRecord::new(capture, fields))
    }
}
