//! Game classification type and composite query keys
//!
//! Keys are `#`-joined in a fixed field order. A missing or empty part yields
//! no key at all, never a partial one.

use crate::buyin;
use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Separator between key parts
pub const KEY_SEPARATOR: &str = "#";

/// Classification type with strict precedence series > satellite > regular > standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationType {
    Series,
    Satellite,
    Regular,
    Standard,
}

impl ClassificationType {
    pub fn from_flags(is_series: bool, is_satellite: bool, is_regular: bool) -> Self {
        if is_series {
            ClassificationType::Series
        } else if is_satellite {
            ClassificationType::Satellite
        } else if is_regular {
            ClassificationType::Regular
        } else {
            ClassificationType::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationType::Series => "SERIES",
            ClassificationType::Satellite => "SATELLITE",
            ClassificationType::Regular => "REGULAR",
            ClassificationType::Standard => "STANDARD",
        }
    }
}

/// Upper-case English day name used in keys
pub fn day_of_week_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// Already-enriched fields the keys are built from
#[derive(Debug, Clone, Default)]
pub struct QueryKeyInputs<'a> {
    pub venue_id: Option<&'a str>,
    pub entity_id: Option<&'a str>,
    /// Upper-case day name, e.g. `MONDAY`
    pub day_of_week: Option<&'a str>,
    /// Legacy variant code, e.g. `NLHE`
    pub variant: Option<&'a str>,
    pub buy_in: Option<f64>,
    pub classification: Option<ClassificationType>,
}

/// The four composite lookup keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryKeySet {
    /// venue # day # variant
    pub venue_schedule_key: Option<String>,
    /// entity # day # variant # bucket
    pub entity_schedule_key: Option<String>,
    /// venue # type # day # variant
    pub venue_type_key: Option<String>,
    /// entity # type # day # variant # bucket
    pub entity_type_key: Option<String>,
}

/// Join parts; `None` if any part is missing or blank
pub fn compose(parts: &[Option<&str>]) -> Option<String> {
    let mut joined = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Some(p) if !p.trim().is_empty() => joined.push(p.trim()),
            _ => return None,
        }
    }
    Some(joined.join(KEY_SEPARATOR))
}

pub fn venue_schedule_key(inputs: &QueryKeyInputs<'_>) -> Option<String> {
    compose(&[inputs.venue_id, inputs.day_of_week, inputs.variant])
}

pub fn entity_schedule_key(inputs: &QueryKeyInputs<'_>) -> Option<String> {
    let bucket = inputs.buy_in.and_then(buyin::bucket_for);
    compose(&[inputs.entity_id, inputs.day_of_week, inputs.variant, bucket])
}

pub fn venue_type_key(inputs: &QueryKeyInputs<'_>) -> Option<String> {
    let class = inputs.classification.map(|c| c.as_str());
    compose(&[inputs.venue_id, class, inputs.day_of_week, inputs.variant])
}

pub fn entity_type_key(inputs: &QueryKeyInputs<'_>) -> Option<String> {
    let class = inputs.classification.map(|c| c.as_str());
    let bucket = inputs.buy_in.and_then(buyin::bucket_for);
    compose(&[inputs.entity_id, class, inputs.day_of_week, inputs.variant, bucket])
}

impl QueryKeySet {
    pub fn derive(inputs: &QueryKeyInputs<'_>) -> Self {
        Self {
            venue_schedule_key: venue_schedule_key(inputs),
            entity_schedule_key: entity_schedule_key(inputs),
            venue_type_key: venue_type_key(inputs),
            entity_type_key: entity_type_key(inputs),
        }
    }
}
