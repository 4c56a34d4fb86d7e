//! Record enrichment
//!
//! Corrects and validates a raw record, decides its variant representation
//! once, then derives classification type, buy-in tier/bucket, day of week and
//! the composite query keys.

use crate::models::{EnrichedRecord, RawRecord};
use crate::services::EntityContext;
use crate::validation::fields::{parse_datetime, GameFields};
use crate::validation::ValidationEngine;
use chrono::Datelike;
use kingsroom_common::game::fields as f;
use kingsroom_common::query_keys::day_of_week_label;
use kingsroom_common::taxonomy::{BettingStructure, GameVariant, VariantClassification, VariantCode};
use kingsroom_common::{buyin, ClassificationType, QueryKeyInputs, QueryKeySet};
use serde_json::{Map, Value};

/// Decide the variant representation at the input boundary. A parseable rich
/// family wins; otherwise the legacy code is used.
pub fn variant_code(fields: &Map<String, Value>) -> VariantCode {
    let view = GameFields::new(fields);
    if let Some(family) = view
        .text(f::VARIANT_FAMILY)
        .and_then(|s| s.parse::<GameVariant>().ok())
    {
        let structure = view
            .text(f::BETTING_STRUCTURE)
            .and_then(|s| s.parse::<BettingStructure>().ok());
        return VariantCode::Classified(VariantClassification::new(family, structure));
    }
    VariantCode::legacy(
        view.text(f::GAME_VARIANT)
            .unwrap_or(kingsroom_common::game::DEFAULT_GAME_VARIANT),
    )
}

/// Stateless enrichment over a validation engine
pub struct Enricher {
    engine: ValidationEngine,
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new(ValidationEngine::new())
    }
}

impl Enricher {
    pub fn new(engine: ValidationEngine) -> Self {
        Self { engine }
    }

    pub fn enrich(&self, raw: RawRecord, entity: &EntityContext) -> EnrichedRecord {
        let mut fields = raw.fields;
        if !GameFields::new(&fields).has_text(f::ENTITY_ID) {
            fields.insert(f::ENTITY_ID.to_string(), Value::from(entity.entity_id.clone()));
        }

        let corrected = self.engine.process(fields);
        let mut fields = corrected.fields;

        let code = variant_code(&fields);
        let variant = code.classification();
        let legacy_variant = code.legacy_code();
        // Rich input gets its legacy projection; legacy input keeps its code
        if matches!(code, VariantCode::Classified(_))
            && !GameFields::new(&fields).has_text(f::GAME_VARIANT)
        {
            fields.insert(f::GAME_VARIANT.to_string(), Value::from(legacy_variant.clone()));
        }

        let view = GameFields::new(&fields);

        let classification_type = ClassificationType::from_flags(
            view.flag(f::IS_SERIES),
            view.flag(f::IS_SATELLITE),
            view.flag(f::IS_REGULAR),
        );
        let buy_in = view.number(f::BUY_IN).value();
        let band = buy_in.and_then(buyin::band_for);
        let day_of_week = view
            .text(f::GAME_START)
            .and_then(parse_datetime)
            .map(|dt| day_of_week_label(dt.weekday()).to_string());

        let query_keys = QueryKeySet::derive(&QueryKeyInputs {
            venue_id: view.text(f::VENUE_ID),
            entity_id: view.text(f::ENTITY_ID),
            day_of_week: day_of_week.as_deref(),
            variant: Some(legacy_variant.as_str()),
            buy_in,
            classification: Some(classification_type),
        });

        EnrichedRecord {
            identifier: raw.identifier,
            entity_id: entity.entity_id.clone(),
            source: raw.source,
            provenance: raw.provenance,
            variant,
            legacy_variant,
            classification_type,
            buy_in_tier: band.map(|b| b.tier),
            buy_in_bucket: band.map(|b| b.bucket.to_string()),
            day_of_week,
            query_keys,
            corrections: corrected.corrections,
            validation: corrected.validation,
            fields,
        }
    }
}
