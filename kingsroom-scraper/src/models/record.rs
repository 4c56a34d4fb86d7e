//! Raw and enriched game records

use crate::validation::{CorrectionNote, ValidationResult};
use kingsroom_common::{BuyInTier, ClassificationType, QueryKeySet, VariantClassification};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where the content came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum SourceRef {
    Url(String),
    CacheKey(String),
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRef::Url(url) => f.write_str(url),
            SourceRef::CacheKey(key) => write!(f, "cache:{}", key),
        }
    }
}

/// How the content was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    /// Fresh live fetch, newly cached
    Live,
    /// Served from cache without contacting the origin
    Cache,
    /// Origin reported no change against the stored capture
    CacheValidated,
    /// No content could be obtained
    Error,
}

/// What the extraction adapter knows about the capture it is parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureContext {
    pub identifier: u64,
    pub source: SourceRef,
    pub provenance: Provenance,
}

/// Extraction output before correction and enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    pub identifier: u64,
    pub source: SourceRef,
    pub provenance: Provenance,
    /// Extracted game fields keyed by wire name
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(capture: &CaptureContext, fields: Map<String, Value>) -> Self {
        Self {
            identifier: capture.identifier,
            source: capture.source.clone(),
            provenance: capture.provenance,
            fields,
        }
    }
}

/// Corrected, validated and classified record handed to persistence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub identifier: u64,
    pub entity_id: String,
    pub source: SourceRef,
    pub provenance: Provenance,
    /// Corrected fields, with the variant projections written back
    pub fields: Map<String, Value>,
    pub variant: VariantClassification,
    pub legacy_variant: String,
    pub classification_type: ClassificationType,
    pub buy_in_tier: Option<BuyInTier>,
    pub buy_in_bucket: Option<String>,
    pub day_of_week: Option<String>,
    pub query_keys: QueryKeySet,
    pub corrections: Vec<CorrectionNote>,
    pub validation: ValidationResult,
}

impl EnrichedRecord {
    pub fn is_valid(&self) -> bool {
        self.validation.is_valid
    }
}
