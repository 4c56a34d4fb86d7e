//! Validation and auto-correction engine
//!
//! Corrects a record's fields, then runs every validator over the corrected
//! fields and merges the results. Data-quality problems are always reported
//! as structured issues, never raised.

pub mod correction;
pub mod fields;
pub mod validators;

pub use correction::{auto_correct, CorrectionKind, CorrectionNote};
pub use fields::GameFields;
pub use validators::{standard_validators, RecordValidator};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Issue severity; any error makes the record invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
}

/// Stable issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingRequiredField,
    InvalidEnum,
    InvalidDate,
    InvalidNumber,
    NegativeBuyIn,
    NegativeRake,
    NegativeCount,
    NegativeGuarantee,
    NegativePrizepool,
    UniquePlayersExceedEntries,
    RakeExceedsBuyIn,
    HighRakePercentage,
    UnusuallyHighBuyIn,
    UnusuallyHighEntries,
    UnusuallyHighGuarantee,
    GuaranteeFlagWithoutAmount,
    GuaranteeAmountWithoutFlag,
    MissingSeriesName,
    SeriesNameWithoutFlag,
    EntryCountMismatch,
    PrizepoolDiscrepancy,
    EndBeforeStart,
    UnknownGameVariant,
}

/// One validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub field: Option<String>,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn new(
        code: IssueCode,
        field: Option<&str>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            code,
            field: field.map(str::to_string),
            message: message.into(),
            severity,
        }
    }
}

/// Merged output of all validators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Split issues by severity, in a deterministic order independent of
    /// which validator produced them
    pub fn from_issues(mut issues: Vec<ValidationIssue>) -> Self {
        issues.sort_by(|a, b| {
            (a.code, &a.field, &a.message).cmp(&(b.code, &b.field, &b.message))
        });
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.severity == Severity::Error);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

/// Fields after correction plus what happened to them
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedRecord {
    pub fields: Map<String, Value>,
    pub corrections: Vec<CorrectionNote>,
    pub validation: ValidationResult,
}

/// Auto-correction followed by composable validators
pub struct ValidationEngine {
    validators: Vec<Box<dyn RecordValidator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Engine with the standard validator set
    pub fn new() -> Self {
        Self::with_validators(standard_validators())
    }

    pub fn with_validators(validators: Vec<Box<dyn RecordValidator>>) -> Self {
        Self { validators }
    }

    /// Run every validator over already-corrected fields
    pub fn validate(&self, map: &Map<String, Value>) -> ValidationResult {
        let fields = GameFields::new(map);
        let issues = self
            .validators
            .iter()
            .flat_map(|validator| {
                let found = validator.validate(&fields);
                if !found.is_empty() {
                    trace!(validator = validator.name(), issues = found.len(), "Validator reported");
                }
                found
            })
            .collect();
        ValidationResult::from_issues(issues)
    }

    /// Correct then validate
    pub fn process(&self, mut map: Map<String, Value>) -> CorrectedRecord {
        let corrections = auto_correct(&mut map);
        let validation = self.validate(&map);
        debug!(
            corrections = corrections.len(),
            errors = validation.errors.len(),
            warnings = validation.warnings.len(),
            "Validated record"
        );
        CorrectedRecord {
            fields: map,
            corrections,
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn base() -> Map<String, Value> {
        record(json!({
            "name": "Sunday Main Event",
            "gameStartDateTime": "2024-03-03T18:00:00"
        }))
    }

    #[test]
    fn test_minimal_record_is_clean() {
        let result = ValidationEngine::new().process(base());
        assert!(result.validation.is_valid);
        assert!(result.validation.warnings.is_empty(), "{:?}", result.validation.warnings);
        assert!(!result.corrections.is_empty());
    }

    #[test]
    fn test_high_rake_is_single_warning() {
        let mut map = base();
        map.insert("buyIn".into(), json!(100));
        map.insert("rake".into(), json!(60));

        let result = ValidationEngine::new().process(map);
        assert!(result.validation.is_valid);
        assert_eq!(result.validation.warnings.len(), 1);
        assert_eq!(result.validation.warnings[0].code, IssueCode::HighRakePercentage);
    }

    #[test]
    fn test_series_without_name_single_warning() {
        let mut map = base();
        map.insert("isSeries".into(), json!(true));

        let result = ValidationEngine::new().process(map);
        assert!(result.validation.is_valid);
        let codes: Vec<_> = result.validation.warnings.iter().map(|w| w.code).collect();
        assert_eq!(codes, vec![IssueCode::MissingSeriesName]);
    }

    #[test]
    fn test_uncoercible_number_invalidates() {
        let mut map = base();
        map.insert("buyIn".into(), json!("free-ish"));

        let result = ValidationEngine::new().process(map);
        assert!(!result.validation.is_valid);
        assert!(result.validation.has_error(IssueCode::InvalidNumber));
    }

    #[test]
    fn test_engine_is_idempotent() {
        let mut map = base();
        map.insert("buyIn".into(), json!("$1,100"));
        map.insert("guaranteeAmount".into(), json!("20,000"));
        map.insert("totalEntries".into(), json!(""));

        let engine = ValidationEngine::new();
        let first = engine.process(map);
        let second = engine.process(first.fields.clone());

        assert_eq!(second.fields, first.fields);
        assert!(second.corrections.is_empty());
        assert_eq!(second.validation, first.validation);
    }

    #[test]
    fn test_validator_order_does_not_matter() {
        let mut map = base();
        map.insert("buyIn".into(), json!(-5));
        map.insert("isSeries".into(), json!(true));
        map.insert("hasGuarantee".into(), json!(true));
        let corrected = ValidationEngine::new().process(map).fields;

        let forward = ValidationEngine::new().validate(&corrected);
        let mut reversed = standard_validators();
        reversed.reverse();
        let backward = ValidationEngine::with_validators(reversed).validate(&corrected);
        assert_eq!(forward, backward);
        assert!(!forward.is_valid);
    }
}
