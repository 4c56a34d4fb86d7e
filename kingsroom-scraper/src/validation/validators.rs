//! Record validators
//!
//! Each validator looks at the corrected fields independently and reports
//! issues; none depends on another's output, so order does not matter.

use super::fields::{DateField, GameFields, NumberField};
use super::{IssueCode, Severity, ValidationIssue};
use kingsroom_common::game::{fields as f, GameStatus, GameType, TournamentType};
use kingsroom_common::taxonomy::{self, BettingStructure, GameVariant};
use std::str::FromStr;

pub const UNUSUALLY_HIGH_BUY_IN: f64 = 50_000.0;
pub const UNUSUALLY_HIGH_ENTRIES: f64 = 5_000.0;
pub const UNUSUALLY_HIGH_GUARANTEE: f64 = 1_000_000.0;
/// Relative paid-vs-calculated prizepool divergence that triggers a warning
pub const PRIZEPOOL_TOLERANCE: f64 = 0.10;

/// One composable validation rule set
pub trait RecordValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue>;
}

/// Validators applied by the default engine
pub fn standard_validators() -> Vec<Box<dyn RecordValidator>> {
    vec![
        Box::new(RequiredFieldsValidator),
        Box::new(EnumValidator),
        Box::new(DateValidator),
        Box::new(NumericTypeValidator),
        Box::new(FinancialValidator),
        Box::new(EntryCountValidator),
        Box::new(GuaranteeValidator),
        Box::new(SeriesValidator),
        Box::new(PrizepoolValidator),
    ]
}

fn error(code: IssueCode, field: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(code, Some(field), message, Severity::Error)
}

fn warning(code: IssueCode, field: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::new(code, Some(field), message, Severity::Warning)
}

pub struct RequiredFieldsValidator;

impl RecordValidator for RequiredFieldsValidator {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        [f::NAME, f::GAME_START]
            .into_iter()
            .filter(|field| match fields.raw(field) {
                None => true,
                Some(value) => value.as_str().is_some_and(|s| s.trim().is_empty()),
            })
            .map(|field| {
                error(
                    IssueCode::MissingRequiredField,
                    field,
                    format!("{} is required", field),
                )
            })
            .collect()
    }
}

pub struct EnumValidator;

impl EnumValidator {
    fn check<T: FromStr>(fields: &GameFields<'_>, field: &str, issues: &mut Vec<ValidationIssue>) {
        let Some(value) = fields.raw(field) else {
            return;
        };
        let valid = value.as_str().is_some_and(|s| T::from_str(s).is_ok());
        if !valid {
            issues.push(error(
                IssueCode::InvalidEnum,
                field,
                format!("{} has unsupported value {}", field, value),
            ));
        }
    }
}

impl RecordValidator for EnumValidator {
    fn name(&self) -> &'static str {
        "enum_membership"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        Self::check::<GameStatus>(fields, f::GAME_STATUS, &mut issues);
        Self::check::<GameType>(fields, f::GAME_TYPE, &mut issues);
        Self::check::<TournamentType>(fields, f::TOURNAMENT_TYPE, &mut issues);
        Self::check::<GameVariant>(fields, f::VARIANT_FAMILY, &mut issues);
        Self::check::<BettingStructure>(fields, f::BETTING_STRUCTURE, &mut issues);

        match fields.raw(f::GAME_VARIANT) {
            None => {}
            Some(value) => match value.as_str() {
                None => issues.push(error(
                    IssueCode::InvalidEnum,
                    f::GAME_VARIANT,
                    format!("{} must be a code, got {}", f::GAME_VARIANT, value),
                )),
                // Unmapped codes still classify, as OTHER
                Some(code) if !taxonomy::is_known_legacy(code) => issues.push(warning(
                    IssueCode::UnknownGameVariant,
                    f::GAME_VARIANT,
                    format!("unmapped variant code '{}'", code.trim()),
                )),
                Some(_) => {}
            },
        }
        issues
    }
}

pub struct DateValidator;

impl RecordValidator for DateValidator {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let start = fields.datetime(f::GAME_START);
        let end = fields.datetime(f::GAME_END);

        for (field, state) in [(f::GAME_START, start), (f::GAME_END, end)] {
            if state == DateField::Invalid {
                issues.push(error(
                    IssueCode::InvalidDate,
                    field,
                    format!("{} is not a parseable date/time", field),
                ));
            }
        }
        if let (DateField::Valid(start), DateField::Valid(end)) = (start, end) {
            if end < start {
                issues.push(warning(
                    IssueCode::EndBeforeStart,
                    f::GAME_END,
                    format!("game ends ({}) before it starts ({})", end, start),
                ));
            }
        }
        issues
    }
}

pub struct NumericTypeValidator;

impl RecordValidator for NumericTypeValidator {
    fn name(&self) -> &'static str {
        "numeric_types"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        f::NUMERIC
            .iter()
            .filter(|field| fields.number(field) == NumberField::Invalid)
            .map(|field| {
                let shown = fields.raw(field).map(|v| v.to_string()).unwrap_or_default();
                error(
                    IssueCode::InvalidNumber,
                    field,
                    format!("{} is not a number: {}", field, shown),
                )
            })
            .collect()
    }
}

pub struct FinancialValidator;

impl RecordValidator for FinancialValidator {
    fn name(&self) -> &'static str {
        "financial"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let buy_in = fields.number(f::BUY_IN).value();
        let rake = fields.number(f::RAKE).value();

        if let Some(buy_in) = buy_in {
            if buy_in < 0.0 {
                issues.push(error(
                    IssueCode::NegativeBuyIn,
                    f::BUY_IN,
                    format!("buy-in {} is negative", buy_in),
                ));
            } else if buy_in > UNUSUALLY_HIGH_BUY_IN {
                issues.push(warning(
                    IssueCode::UnusuallyHighBuyIn,
                    f::BUY_IN,
                    format!("buy-in {} exceeds {}", buy_in, UNUSUALLY_HIGH_BUY_IN),
                ));
            }
        }

        if let Some(rake) = rake {
            if rake < 0.0 {
                issues.push(error(
                    IssueCode::NegativeRake,
                    f::RAKE,
                    format!("rake {} is negative", rake),
                ));
            } else if let Some(buy_in) = buy_in.filter(|b| *b >= 0.0) {
                if rake > buy_in {
                    issues.push(warning(
                        IssueCode::RakeExceedsBuyIn,
                        f::RAKE,
                        format!("rake {} exceeds buy-in {}", rake, buy_in),
                    ));
                } else if rake > buy_in / 2.0 {
                    issues.push(warning(
                        IssueCode::HighRakePercentage,
                        f::RAKE,
                        format!("rake {} is more than half of buy-in {}", rake, buy_in),
                    ));
                }
            }
        }
        issues
    }
}

pub struct EntryCountValidator;

impl RecordValidator for EntryCountValidator {
    fn name(&self) -> &'static str {
        "entry_counts"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for field in f::COUNTABLE {
            if let Some(count) = fields.number(field).value().filter(|c| *c < 0.0) {
                issues.push(error(
                    IssueCode::NegativeCount,
                    field,
                    format!("{} is negative ({})", field, count),
                ));
            }
        }

        let total = fields.number_or_zero(f::TOTAL_ENTRIES);
        let initial = fields.number_or_zero(f::TOTAL_INITIAL_ENTRIES);
        let components =
            initial + fields.number_or_zero(f::TOTAL_REBUYS) + fields.number_or_zero(f::TOTAL_ADDONS);

        if total > UNUSUALLY_HIGH_ENTRIES {
            issues.push(warning(
                IssueCode::UnusuallyHighEntries,
                f::TOTAL_ENTRIES,
                format!("{} entries exceeds {}", total, UNUSUALLY_HIGH_ENTRIES),
            ));
        }

        // Sources often publish a total without its breakdown
        if total > 0.0 && components > 0.0 && total != components {
            issues.push(warning(
                IssueCode::EntryCountMismatch,
                f::TOTAL_ENTRIES,
                format!(
                    "total entries {} differs from initial + rebuys + addons = {}",
                    total, components
                ),
            ));
        }

        let unique = fields.number_or_zero(f::TOTAL_UNIQUE_PLAYERS);
        if initial > 0.0 && unique > initial {
            issues.push(error(
                IssueCode::UniquePlayersExceedEntries,
                f::TOTAL_UNIQUE_PLAYERS,
                format!("{} unique players but only {} initial entries", unique, initial),
            ));
        }
        issues
    }
}

pub struct GuaranteeValidator;

impl RecordValidator for GuaranteeValidator {
    fn name(&self) -> &'static str {
        "guarantee"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let amount = fields.number(f::GUARANTEE_AMOUNT).value();

        if let Some(amount) = amount {
            if amount < 0.0 {
                issues.push(error(
                    IssueCode::NegativeGuarantee,
                    f::GUARANTEE_AMOUNT,
                    format!("guarantee {} is negative", amount),
                ));
            } else if amount > UNUSUALLY_HIGH_GUARANTEE {
                issues.push(warning(
                    IssueCode::UnusuallyHighGuarantee,
                    f::GUARANTEE_AMOUNT,
                    format!("guarantee {} exceeds {}", amount, UNUSUALLY_HIGH_GUARANTEE),
                ));
            }
        }

        let positive = amount.is_some_and(|a| a > 0.0);
        if fields.has_flag(f::HAS_GUARANTEE) {
            let flagged = fields.flag(f::HAS_GUARANTEE);
            if flagged && !positive {
                issues.push(warning(
                    IssueCode::GuaranteeFlagWithoutAmount,
                    f::HAS_GUARANTEE,
                    "guarantee flagged but no positive amount",
                ));
            } else if !flagged && positive {
                issues.push(warning(
                    IssueCode::GuaranteeAmountWithoutFlag,
                    f::GUARANTEE_AMOUNT,
                    "guarantee amount present but flag is false",
                ));
            }
        }
        issues
    }
}

pub struct SeriesValidator;

impl RecordValidator for SeriesValidator {
    fn name(&self) -> &'static str {
        "series"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let is_series = fields.flag(f::IS_SERIES);
        let has_name = fields.has_text(f::SERIES_NAME);
        match (is_series, has_name) {
            (true, false) => vec![warning(
                IssueCode::MissingSeriesName,
                f::SERIES_NAME,
                "series game without a series name",
            )],
            (false, true) => vec![warning(
                IssueCode::SeriesNameWithoutFlag,
                f::IS_SERIES,
                "series name present but game is not flagged as series",
            )],
            _ => Vec::new(),
        }
    }
}

pub struct PrizepoolValidator;

impl RecordValidator for PrizepoolValidator {
    fn name(&self) -> &'static str {
        "prizepool"
    }

    fn validate(&self, fields: &GameFields<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let paid = fields.number(f::PRIZEPOOL_PAID).value();
        let calculated = fields.number(f::PRIZEPOOL_CALCULATED).value();

        for (field, value) in [(f::PRIZEPOOL_PAID, paid), (f::PRIZEPOOL_CALCULATED, calculated)] {
            if let Some(v) = value.filter(|v| *v < 0.0) {
                issues.push(error(
                    IssueCode::NegativePrizepool,
                    field,
                    format!("{} is negative ({})", field, v),
                ));
            }
        }

        let finished = fields
            .text(f::GAME_STATUS)
            .and_then(|s| s.parse::<GameStatus>().ok())
            == Some(GameStatus::Finished);
        if let (true, Some(paid), Some(calculated)) = (finished, paid, calculated) {
            if paid >= 0.0 && calculated > 0.0 {
                let divergence = (paid - calculated).abs() / calculated;
                if divergence > PRIZEPOOL_TOLERANCE {
                    issues.push(warning(
                        IssueCode::PrizepoolDiscrepancy,
                        f::PRIZEPOOL_PAID,
                        format!(
                            "paid {} differs from calculated {} by {:.1}%",
                            paid,
                            calculated,
                            divergence * 100.0
                        ),
                    ));
                }
            }
        }
        issues
    }
}
