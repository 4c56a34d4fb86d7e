//! Auto-correction pass
//!
//! Runs before validation and never fails. Every change is recorded as a
//! [`CorrectionNote`]; a second pass over corrected fields changes nothing.
//! Values that cannot be coerced are left in place for the validators to
//! report.

use kingsroom_common::game::{self, fields as f};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Largest integer an f64 represents exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// What kind of change a correction made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrectionKind {
    /// Numeric-looking string converted to a number
    Coerced,
    /// Blank or null numeric value removed
    BlankRemoved,
    /// Absent field filled with its default
    DefaultFilled,
    /// Value derived from another field
    Derived,
}

/// One recorded auto-correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionNote {
    pub field: String,
    pub kind: CorrectionKind,
    pub message: String,
}

impl CorrectionNote {
    fn new(field: &str, kind: CorrectionKind, message: String) -> Self {
        Self {
            field: field.to_string(),
            kind,
            message,
        }
    }
}

/// Convert a numeric-looking string. Accepts an optional leading `-`, a
/// leading `$`, thousands separators and one decimal point.
pub fn coerce_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    let digits: String = rest.chars().filter(|c| *c != ',').collect();

    if digits.is_empty()
        || digits.chars().filter(|c| *c == '.').count() > 1
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        || !digits.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    let mut value: f64 = digits.parse().ok()?;
    if negative {
        value = -value;
    }
    number_value(value)
}

/// Integral values become JSON integers, the rest JSON floats
fn number_value(value: f64) -> Option<Value> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        return Some(Value::from(value as i64));
    }
    Number::from_f64(value).map(Value::Number)
}

fn is_absent(map: &Map<String, Value>, field: &str) -> bool {
    match map.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Apply every correction in place and return the notes
pub fn auto_correct(map: &mut Map<String, Value>) -> Vec<CorrectionNote> {
    let mut notes = Vec::new();
    coerce_numeric_fields(map, &mut notes);
    fill_enum_defaults(map, &mut notes);
    derive_guarantee_flag(map, &mut notes);
    fill_countables(map, &mut notes);
    fill_classification_flags(map, &mut notes);
    notes
}

fn coerce_numeric_fields(map: &mut Map<String, Value>, notes: &mut Vec<CorrectionNote>) {
    for field in f::NUMERIC {
        let replacement = match map.get(*field) {
            Some(Value::Null) => Some(None),
            Some(Value::String(s)) if s.trim().is_empty() => Some(None),
            Some(Value::String(s)) => coerce_number(s).map(|v| Some((s.clone(), v))),
            _ => None,
        };
        match replacement {
            Some(None) => {
                map.remove(*field);
                notes.push(CorrectionNote::new(
                    field,
                    CorrectionKind::BlankRemoved,
                    "removed blank value".to_string(),
                ));
            }
            Some(Some((original, value))) => {
                let message = format!("coerced '{}' to {}", original, value);
                map.insert(field.to_string(), value);
                notes.push(CorrectionNote::new(field, CorrectionKind::Coerced, message));
            }
            None => {}
        }
    }
}

fn fill_default(
    map: &mut Map<String, Value>,
    notes: &mut Vec<CorrectionNote>,
    field: &str,
    value: &str,
) {
    if is_absent(map, field) {
        map.insert(field.to_string(), Value::from(value));
        notes.push(CorrectionNote::new(
            field,
            CorrectionKind::DefaultFilled,
            format!("defaulted to {}", value),
        ));
    }
}

fn fill_enum_defaults(map: &mut Map<String, Value>, notes: &mut Vec<CorrectionNote>) {
    fill_default(map, notes, f::GAME_STATUS, game::DEFAULT_GAME_STATUS.as_str());
    fill_default(map, notes, f::GAME_TYPE, game::DEFAULT_GAME_TYPE.as_str());

    // A rich classification supplies the legacy variant during enrichment
    if is_absent(map, f::VARIANT_FAMILY) {
        fill_default(map, notes, f::GAME_VARIANT, game::DEFAULT_GAME_VARIANT);
    }

    let is_tournament = map
        .get(f::GAME_TYPE)
        .and_then(Value::as_str)
        .map(str::trim)
        == Some(game::GameType::Tournament.as_str());
    if is_tournament {
        fill_default(
            map,
            notes,
            f::TOURNAMENT_TYPE,
            game::DEFAULT_TOURNAMENT_TYPE.as_str(),
        );
    }
}

fn derive_guarantee_flag(map: &mut Map<String, Value>, notes: &mut Vec<CorrectionNote>) {
    if !is_absent(map, f::HAS_GUARANTEE) {
        return;
    }
    let positive = map
        .get(f::GUARANTEE_AMOUNT)
        .and_then(Value::as_f64)
        .is_some_and(|amount| amount > 0.0);
    map.insert(f::HAS_GUARANTEE.to_string(), Value::Bool(positive));
    notes.push(CorrectionNote::new(
        f::HAS_GUARANTEE,
        CorrectionKind::Derived,
        format!("derived {} from {}", positive, f::GUARANTEE_AMOUNT),
    ));
}

fn fill_countables(map: &mut Map<String, Value>, notes: &mut Vec<CorrectionNote>) {
    for field in f::COUNTABLE {
        if is_absent(map, field) {
            map.insert(field.to_string(), Value::from(0));
            notes.push(CorrectionNote::new(
                field,
                CorrectionKind::DefaultFilled,
                "defaulted to 0".to_string(),
            ));
        }
    }
}

fn fill_classification_flags(map: &mut Map<String, Value>, notes: &mut Vec<CorrectionNote>) {
    for field in f::CLASSIFICATION_FLAGS {
        if is_absent(map, field) {
            map.insert(field.to_string(), Value::Bool(false));
            notes.push(CorrectionNote::new(
                field,
                CorrectionKind::DefaultFilled,
                "defaulted to false".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("100"), Some(json!(100)));
        assert_eq!(coerce_number(" $1,100 "), Some(json!(1100)));
        assert_eq!(coerce_number("27.50"), Some(json!(27.5)));
        assert_eq!(coerce_number("-5"), Some(json!(-5)));
        assert_eq!(coerce_number("10.0"), Some(json!(10)));
        assert_eq!(coerce_number("ten"), None);
        assert_eq!(coerce_number("1.2.3"), None);
        assert_eq!(coerce_number("$"), None);
        assert_eq!(coerce_number("1e5"), None);
    }

    #[test]
    fn test_coercions_are_noted() {
        let mut map = object(json!({"buyIn": "$100", "rake": "ten", "prizepoolPaid": ""}));
        let notes = auto_correct(&mut map);

        assert_eq!(map["buyIn"], json!(100));
        assert_eq!(map["rake"], json!("ten"));
        assert!(!map.contains_key("prizepoolPaid"));
        assert!(notes
            .iter()
            .any(|n| n.field == "buyIn" && n.kind == CorrectionKind::Coerced));
        assert!(notes
            .iter()
            .any(|n| n.field == "prizepoolPaid" && n.kind == CorrectionKind::BlankRemoved));
        assert!(!notes.iter().any(|n| n.field == "rake"));
    }

    #[test]
    fn test_defaults_filled() {
        let mut map = object(json!({"name": "Monday Madness"}));
        auto_correct(&mut map);

        assert_eq!(map["gameStatus"], json!("SCHEDULED"));
        assert_eq!(map["gameType"], json!("TOURNAMENT"));
        assert_eq!(map["gameVariant"], json!("NLHE"));
        assert_eq!(map["tournamentType"], json!("FREEZEOUT"));
        assert_eq!(map["hasGuarantee"], json!(false));
        assert_eq!(map["totalEntries"], json!(0));
        assert_eq!(map["isSeries"], json!(false));
    }

    #[test]
    fn test_cash_game_gets_no_tournament_type() {
        let mut map = object(json!({"gameType": "CASH_GAME"}));
        auto_correct(&mut map);
        assert!(!map.contains_key("tournamentType"));
    }

    #[test]
    fn test_rich_variant_suppresses_legacy_default() {
        let mut map = object(json!({"variantFamily": "OMAHA_HI", "bettingStructure": "POT_LIMIT"}));
        auto_correct(&mut map);
        assert!(!map.contains_key("gameVariant"));
    }

    #[test]
    fn test_guarantee_flag_derived_from_amount() {
        let mut map = object(json!({"guaranteeAmount": "5,000"}));
        auto_correct(&mut map);
        assert_eq!(map["hasGuarantee"], json!(true));

        let mut explicit = object(json!({"guaranteeAmount": 5000, "hasGuarantee": false}));
        auto_correct(&mut explicit);
        assert_eq!(explicit["hasGuarantee"], json!(false));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut map = object(json!({
            "name": "Thursday Turbo",
            "buyIn": " $55 ",
            "rake": "",
            "guaranteeAmount": "2,000.50",
            "gameStatus": "  "
        }));
        let first = auto_correct(&mut map);
        assert!(!first.is_empty());

        let snapshot = map.clone();
        let second = auto_correct(&mut map);
        assert!(second.is_empty());
        assert_eq!(map, snapshot);
    }
}
