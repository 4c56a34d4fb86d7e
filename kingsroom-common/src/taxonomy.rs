//! Legacy and two-axis game variant taxonomy
//!
//! Older records carry a single flat code (`NLHE`, `PLO5`, ...) that conflates
//! the game family with the betting structure. Newer records carry the two
//! axes separately. Both directions are table lookups over pure data:
//!
//! - legacy → rich uses [`LEGACY_TO_RICH`]; unknown codes become
//!   `OTHER` with no betting structure.
//! - rich → legacy uses [`RICH_TO_LEGACY`] by exact pair; a mixed variant
//!   without an exact entry collapses to [`LEGACY_MIXED`]; anything else
//!   becomes [`LEGACY_NOT_PUBLISHED`].
//!
//! The only legacy codes that do not survive legacy → rich → legacy are the
//! mixed-game codes listed in [`LOSSY_MIXED_CODES`]; they land on
//! [`LEGACY_MIXED`].

use serde::{Deserialize, Serialize};

wire_enum! {
    /// Game family, independent of betting structure
    GameVariant {
        Holdem => "HOLDEM",
        OmahaHi => "OMAHA_HI",
        OmahaHiLo => "OMAHA_HILO",
        Omaha5Hi => "OMAHA5_HI",
        Omaha6Hi => "OMAHA6_HI",
        MixedOmaha => "MIXED_OMAHA",
        MixedHoldemOmaha => "MIXED_HOLDEM_OMAHA",
        DealersChoice => "DEALERS_CHOICE",
        Horse => "HORSE",
        EightGame => "EIGHT_GAME",
        MixedGames => "MIXED_GAMES",
        Other => "OTHER",
    }
}

impl GameVariant {
    /// Variants that rotate or combine several games
    pub fn is_mixed(&self) -> bool {
        matches!(
            self,
            GameVariant::MixedOmaha
                | GameVariant::MixedHoldemOmaha
                | GameVariant::DealersChoice
                | GameVariant::Horse
                | GameVariant::EightGame
                | GameVariant::MixedGames
        )
    }
}

wire_enum! {
    /// Betting structure axis
    BettingStructure {
        NoLimit => "NO_LIMIT",
        PotLimit => "POT_LIMIT",
        FixedLimit => "FIXED_LIMIT",
        Mixed => "MIXED",
    }
}

/// Legacy code every unmapped mixed variant collapses to
pub const LEGACY_MIXED: &str = "MIXED";

/// Legacy code for anything that has no legacy representation
pub const LEGACY_NOT_PUBLISHED: &str = "NOT_PUBLISHED";

/// Two-axis classification of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantClassification {
    pub variant: GameVariant,
    pub betting_structure: Option<BettingStructure>,
}

impl VariantClassification {
    pub const fn new(variant: GameVariant, betting_structure: Option<BettingStructure>) -> Self {
        Self {
            variant,
            betting_structure,
        }
    }

    /// Fallback for unmapped legacy codes
    pub const OTHER: VariantClassification = VariantClassification::new(GameVariant::Other, None);
}

use BettingStructure as B;
use GameVariant as V;

/// Legacy code → rich classification
pub const LEGACY_TO_RICH: &[(&str, VariantClassification)] = &[
    ("NLHE", VariantClassification::new(V::Holdem, Some(B::NoLimit))),
    ("LHE", VariantClassification::new(V::Holdem, Some(B::FixedLimit))),
    ("PLHE", VariantClassification::new(V::Holdem, Some(B::PotLimit))),
    ("PLO", VariantClassification::new(V::OmahaHi, Some(B::PotLimit))),
    ("PLOHL", VariantClassification::new(V::OmahaHiLo, Some(B::PotLimit))),
    ("PLO5", VariantClassification::new(V::Omaha5Hi, Some(B::PotLimit))),
    ("PLO6", VariantClassification::new(V::Omaha6Hi, Some(B::PotLimit))),
    ("PLOM", VariantClassification::new(V::MixedOmaha, Some(B::PotLimit))),
    ("PLMIXED", VariantClassification::new(V::MixedHoldemOmaha, Some(B::PotLimit))),
    ("PLDC", VariantClassification::new(V::DealersChoice, Some(B::PotLimit))),
    ("NLDC", VariantClassification::new(V::DealersChoice, Some(B::NoLimit))),
    ("HORSE", VariantClassification::new(V::Horse, Some(B::FixedLimit))),
    ("8GAME", VariantClassification::new(V::EightGame, Some(B::Mixed))),
    ("MIXED", VariantClassification::new(V::MixedGames, None)),
    ("NOT_PUBLISHED", VariantClassification::OTHER),
];

/// Exact rich pair → legacy code
pub const RICH_TO_LEGACY: &[(VariantClassification, &str)] = &[
    (VariantClassification::new(V::Holdem, Some(B::NoLimit)), "NLHE"),
    (VariantClassification::new(V::Holdem, Some(B::FixedLimit)), "LHE"),
    (VariantClassification::new(V::Holdem, Some(B::PotLimit)), "PLHE"),
    (VariantClassification::new(V::OmahaHi, Some(B::PotLimit)), "PLO"),
    (VariantClassification::new(V::OmahaHiLo, Some(B::PotLimit)), "PLOHL"),
    (VariantClassification::new(V::Omaha5Hi, Some(B::PotLimit)), "PLO5"),
    (VariantClassification::new(V::Omaha6Hi, Some(B::PotLimit)), "PLO6"),
    (VariantClassification::new(V::MixedOmaha, Some(B::PotLimit)), "PLOM"),
    (VariantClassification::new(V::MixedHoldemOmaha, Some(B::PotLimit)), "PLMIXED"),
    (VariantClassification::new(V::DealersChoice, Some(B::PotLimit)), "PLDC"),
    (VariantClassification::new(V::DealersChoice, Some(B::NoLimit)), "NLDC"),
];

/// Legacy codes whose round trip collapses to [`LEGACY_MIXED`]
pub const LOSSY_MIXED_CODES: &[&str] = &["HORSE", "8GAME"];

/// Whether a legacy code is part of the mapping table
pub fn is_known_legacy(code: &str) -> bool {
    LEGACY_TO_RICH.iter().any(|(c, _)| *c == code.trim())
}

/// Legacy flat code → two-axis classification
pub fn legacy_to_rich(code: &str) -> VariantClassification {
    let code = code.trim();
    LEGACY_TO_RICH
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rich)| *rich)
        .unwrap_or(VariantClassification::OTHER)
}

/// Two-axis classification → legacy flat code
pub fn rich_to_legacy(rich: &VariantClassification) -> &'static str {
    if let Some((_, code)) = RICH_TO_LEGACY.iter().find(|(pair, _)| pair == rich) {
        return *code;
    }
    if rich.variant.is_mixed() {
        LEGACY_MIXED
    } else {
        LEGACY_NOT_PUBLISHED
    }
}

/// Variant as it arrives on a record: either a legacy flat code or an
/// already classified pair. Decided once at the input boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VariantCode {
    Legacy { code: String },
    Classified(VariantClassification),
}

impl VariantCode {
    pub fn legacy(code: impl Into<String>) -> Self {
        VariantCode::Legacy { code: code.into() }
    }

    /// Rich projection
    pub fn classification(&self) -> VariantClassification {
        match self {
            VariantCode::Legacy { code } => legacy_to_rich(code),
            VariantCode::Classified(rich) => *rich,
        }
    }

    /// Legacy-compatibility projection
    pub fn legacy_code(&self) -> String {
        match self {
            VariantCode::Legacy { code } => {
                let code = code.trim();
                if is_known_legacy(code) {
                    code.to_string()
                } else {
                    rich_to_legacy(&legacy_to_rich(code)).to_string()
                }
            }
            VariantCode::Classified(rich) => rich_to_legacy(rich).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_legacy_falls_back_to_other() {
        let rich = legacy_to_rich("STUD_HI_LO");
        assert_eq!(rich.variant, GameVariant::Other);
        assert_eq!(rich.betting_structure, None);
    }

    #[test]
    fn test_reverse_exact_pair() {
        let rich = VariantClassification::new(GameVariant::Omaha5Hi, Some(BettingStructure::PotLimit));
        assert_eq!(rich_to_legacy(&rich), "PLO5");
    }

    #[test]
    fn test_unmapped_mixed_collapses() {
        let rich = VariantClassification::new(GameVariant::MixedOmaha, Some(BettingStructure::NoLimit));
        assert_eq!(rich_to_legacy(&rich), LEGACY_MIXED);
    }

    #[test]
    fn test_unmapped_non_mixed_is_not_published() {
        let rich = VariantClassification::new(GameVariant::OmahaHi, Some(BettingStructure::NoLimit));
        assert_eq!(rich_to_legacy(&rich), LEGACY_NOT_PUBLISHED);
        assert_eq!(rich_to_legacy(&VariantClassification::OTHER), LEGACY_NOT_PUBLISHED);
    }

    #[test]
    fn test_variant_code_projections() {
        let code = VariantCode::legacy("PLO");
        assert_eq!(code.classification().variant, GameVariant::OmahaHi);
        assert_eq!(code.legacy_code(), "PLO");

        let unknown = VariantCode::legacy("RAZZ");
        assert_eq!(unknown.legacy_code(), LEGACY_NOT_PUBLISHED);

        let classified = VariantCode::Classified(VariantClassification::new(
            GameVariant::Holdem,
            Some(BettingStructure::NoLimit),
        ));
        assert_eq!(classified.legacy_code(), "NLHE");
    }
}
