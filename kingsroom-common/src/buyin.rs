//! Buy-in tiers and range buckets
//!
//! A fixed ascending table of inclusive upper bounds maps a buy-in amount to a
//! named tier and a zero-padded range label. Labels sort lexically in the same
//! order as the tiers, so bucket strings can be used directly in sort keys.

use serde::{Deserialize, Serialize};

/// Named buy-in tier, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyInTier {
    Freeroll,
    Micro,
    Low,
    Mid,
    High,
    Premium,
    HighRoller,
    SuperHighRoller,
}

/// Tier plus its range label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BuyInBand {
    pub tier: BuyInTier,
    pub bucket: &'static str,
}

/// (inclusive upper bound, tier, bucket label), ascending
pub const BUY_IN_THRESHOLDS: &[(f64, BuyInTier, &str)] = &[
    (0.0, BuyInTier::Freeroll, "0000-0000"),
    (20.0, BuyInTier::Micro, "0001-0020"),
    (55.0, BuyInTier::Low, "0021-0055"),
    (110.0, BuyInTier::Mid, "0056-0110"),
    (250.0, BuyInTier::High, "0111-0250"),
    (550.0, BuyInTier::Premium, "0251-0550"),
    (1100.0, BuyInTier::HighRoller, "0551-1100"),
];

/// Open-ended top band for amounts above the last threshold
pub const TOP_BAND: BuyInBand = BuyInBand {
    tier: BuyInTier::SuperHighRoller,
    bucket: "1101-PLUS",
};

/// Band for a buy-in amount; `None` for negative or non-finite amounts
pub fn band_for(amount: f64) -> Option<BuyInBand> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    let band = BUY_IN_THRESHOLDS
        .iter()
        .find(|(upper, _, _)| amount <= *upper)
        .map(|(_, tier, bucket)| BuyInBand {
            tier: *tier,
            bucket: *bucket,
        })
        .unwrap_or(TOP_BAND);

    Some(band)
}

/// Bucket label only
pub fn bucket_for(amount: f64) -> Option<&'static str> {
    band_for(amount).map(|b| b.bucket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(band_for(0.0).unwrap().tier, BuyInTier::Freeroll);
        assert_eq!(band_for(20.0).unwrap().tier, BuyInTier::Micro);
        assert_eq!(band_for(20.01).unwrap().tier, BuyInTier::Low);
        assert_eq!(band_for(1100.0).unwrap().tier, BuyInTier::HighRoller);
    }

    #[test]
    fn test_top_band_is_open_ended() {
        assert_eq!(band_for(1100.5), Some(TOP_BAND));
        assert_eq!(band_for(250_000.0), Some(TOP_BAND));
    }

    #[test]
    fn test_invalid_amounts() {
        assert_eq!(band_for(-1.0), None);
        assert_eq!(band_for(f64::NAN), None);
        assert_eq!(bucket_for(f64::INFINITY), None);
    }

    #[test]
    fn test_monotonic_over_a_sweep() {
        let mut previous: Option<BuyInBand> = None;
        let mut amount = 0.0;
        while amount < 3000.0 {
            let band = band_for(amount).unwrap();
            if let Some(prev) = previous {
                assert!(prev.tier <= band.tier, "tier regressed at {}", amount);
                assert!(prev.bucket <= band.bucket, "bucket regressed at {}", amount);
            }
            previous = Some(band);
            amount += 2.5;
        }
    }

    #[test]
    fn test_table_is_ascending() {
        for pair in BUY_IN_THRESHOLDS.windows(2) {
            assert!(pair[0].0 < pair[1].0);
            assert!(pair[0].1 < pair[1].1);
            assert!(pair[0].2 < pair[1].2);
        }
        let last = BUY_IN_THRESHOLDS.last().unwrap();
        assert!(last.2 < TOP_BAND.bucket);
    }
}
