//! Typed read access over a record's JSON fields

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// State of a numeric field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberField {
    Absent,
    Number(f64),
    /// Present but not a JSON number
    Invalid,
}

impl NumberField {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumberField::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// State of a date/time field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Absent,
    Valid(NaiveDateTime),
    Invalid,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date/time as the venue's wall-clock time.
///
/// RFC 3339 values keep their own offset's local time; naive values are taken
/// as-is. A bare date means midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Borrowed view of a record's fields
#[derive(Debug, Clone, Copy)]
pub struct GameFields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> GameFields<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn raw(&self, field: &str) -> Option<&'a Value> {
        match self.map.get(field) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v),
        }
    }

    /// Trimmed, non-empty string value
    pub fn text(&self, field: &str) -> Option<&'a str> {
        self.raw(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn has_text(&self, field: &str) -> bool {
        self.text(field).is_some()
    }

    pub fn number(&self, field: &str) -> NumberField {
        match self.raw(field) {
            None => NumberField::Absent,
            Some(Value::Number(n)) => n.as_f64().map_or(NumberField::Invalid, NumberField::Number),
            Some(_) => NumberField::Invalid,
        }
    }

    /// Numeric value, treating absent or invalid as zero
    pub fn number_or_zero(&self, field: &str) -> f64 {
        self.number(field).value().unwrap_or(0.0)
    }

    /// Boolean flag; anything but `true` reads as `false`
    pub fn flag(&self, field: &str) -> bool {
        matches!(self.raw(field), Some(Value::Bool(true)))
    }

    pub fn has_flag(&self, field: &str) -> bool {
        matches!(self.raw(field), Some(Value::Bool(_)))
    }

    pub fn datetime(&self, field: &str) -> DateField {
        match self.raw(field) {
            None => DateField::Absent,
            Some(Value::String(s)) if s.trim().is_empty() => DateField::Absent,
            Some(Value::String(s)) => parse_datetime(s).map_or(DateField::Invalid, DateField::Valid),
            Some(_) => DateField::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Weekday};
    use serde_json::json;

    #[test]
    fn test_parse_datetime_formats() {
        let rfc = parse_datetime("2024-03-04T19:30:00+11:00").unwrap();
        assert_eq!((rfc.hour(), rfc.minute()), (19, 30));
        assert_eq!(rfc.weekday(), Weekday::Mon);

        assert!(parse_datetime("2024-03-04T19:30:00").is_some());
        assert!(parse_datetime("2024-03-04 19:30").is_some());
        assert_eq!(parse_datetime("2024-03-04").unwrap().hour(), 0);
        assert!(parse_datetime("next tuesday").is_none());
        assert!(parse_datetime("  ").is_none());
    }

    #[test]
    fn test_field_states() {
        let map = json!({
            "buyIn": 100,
            "rake": "ten",
            "name": "  ",
            "isSeries": true,
            "gameEndDateTime": null,
            "gameStartDateTime": "garbage"
        });
        let map = map.as_object().unwrap();
        let fields = GameFields::new(map);

        assert_eq!(fields.number("buyIn"), NumberField::Number(100.0));
        assert_eq!(fields.number("rake"), NumberField::Invalid);
        assert_eq!(fields.number("prizepoolPaid"), NumberField::Absent);
        assert_eq!(fields.text("name"), None);
        assert!(fields.flag("isSeries"));
        assert!(!fields.flag("isSatellite"));
        assert_eq!(fields.datetime("gameEndDateTime"), DateField::Absent);
        assert_eq!(fields.datetime("gameStartDateTime"), DateField::Invalid);
    }
}
