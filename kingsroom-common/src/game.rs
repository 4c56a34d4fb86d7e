//! Game record field names and enumerations
//!
//! Extracted tournament records travel as JSON objects keyed by the camelCase
//! names below. The enumerations accept the upper-case wire codes used by the
//! downstream tables.

use std::fmt;

/// Wire field names of a game record
pub mod fields {
    pub const NAME: &str = "name";
    pub const GAME_START: &str = "gameStartDateTime";
    pub const GAME_END: &str = "gameEndDateTime";
    pub const GAME_STATUS: &str = "gameStatus";
    pub const GAME_TYPE: &str = "gameType";
    pub const GAME_VARIANT: &str = "gameVariant";
    pub const TOURNAMENT_TYPE: &str = "tournamentType";
    /// Rich classification axes, when the source already provides them
    pub const VARIANT_FAMILY: &str = "variantFamily";
    pub const BETTING_STRUCTURE: &str = "bettingStructure";
    pub const BUY_IN: &str = "buyIn";
    pub const RAKE: &str = "rake";
    pub const STARTING_STACK: &str = "startingStack";
    pub const GUARANTEE_AMOUNT: &str = "guaranteeAmount";
    pub const HAS_GUARANTEE: &str = "hasGuarantee";
    pub const TOTAL_ENTRIES: &str = "totalEntries";
    pub const TOTAL_INITIAL_ENTRIES: &str = "totalInitialEntries";
    pub const TOTAL_REBUYS: &str = "totalRebuys";
    pub const TOTAL_ADDONS: &str = "totalAddons";
    pub const TOTAL_UNIQUE_PLAYERS: &str = "totalUniquePlayers";
    pub const PRIZEPOOL_PAID: &str = "prizepoolPaid";
    pub const PRIZEPOOL_CALCULATED: &str = "prizepoolCalculated";
    pub const IS_SERIES: &str = "isSeries";
    pub const SERIES_NAME: &str = "seriesName";
    pub const IS_SATELLITE: &str = "isSatellite";
    pub const IS_REGULAR: &str = "isRegular";
    pub const VENUE_ID: &str = "venueId";
    pub const ENTITY_ID: &str = "entityId";

    /// Fields that are coerced from numeric-looking strings
    pub const NUMERIC: &[&str] = &[
        BUY_IN,
        RAKE,
        STARTING_STACK,
        GUARANTEE_AMOUNT,
        TOTAL_ENTRIES,
        TOTAL_INITIAL_ENTRIES,
        TOTAL_REBUYS,
        TOTAL_ADDONS,
        TOTAL_UNIQUE_PLAYERS,
        PRIZEPOOL_PAID,
        PRIZEPOOL_CALCULATED,
    ];

    /// Countable fields that default to zero when absent
    pub const COUNTABLE: &[&str] = &[
        TOTAL_ENTRIES,
        TOTAL_INITIAL_ENTRIES,
        TOTAL_REBUYS,
        TOTAL_ADDONS,
        TOTAL_UNIQUE_PLAYERS,
    ];

    /// Classification flags that default to `false` when absent
    pub const CLASSIFICATION_FLAGS: &[&str] = &[IS_SERIES, IS_SATELLITE, IS_REGULAR];
}

/// Error returned when a wire code is not part of an enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCode(pub String);

impl fmt::Display for UnknownCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown code '{}'", self.0)
    }
}

impl std::error::Error for UnknownCode {}

wire_enum! {
    /// Lifecycle status of a game as published by the source site
    GameStatus {
        Initiating => "INITIATING",
        Scheduled => "SCHEDULED",
        Registering => "REGISTERING",
        Running => "RUNNING",
        ClockStopped => "CLOCK_STOPPED",
        Finished => "FINISHED",
        Cancelled => "CANCELLED",
        NotPublished => "NOT_PUBLISHED",
        NotInUse => "NOT_IN_USE",
        Unknown => "UNKNOWN",
    }
}

impl GameStatus {
    /// Game has started but not finished
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            GameStatus::Initiating
                | GameStatus::Registering
                | GameStatus::Running
                | GameStatus::ClockStopped
        )
    }
}

wire_enum! {
    /// Tournament or cash game
    GameType {
        Tournament => "TOURNAMENT",
        CashGame => "CASH_GAME",
    }
}

wire_enum! {
    /// Tournament entry structure
    TournamentType {
        Freezeout => "FREEZEOUT",
        Rebuy => "REBUY",
        Satellite => "SATELLITE",
        Deepstack => "DEEPSTACK",
    }
}

/// Defaults filled by auto-correction when the field is absent
pub const DEFAULT_GAME_STATUS: GameStatus = GameStatus::Scheduled;
pub const DEFAULT_GAME_TYPE: GameType = GameType::Tournament;
pub const DEFAULT_TOURNAMENT_TYPE: TournamentType = TournamentType::Freezeout;
pub const DEFAULT_GAME_VARIANT: &str = "NLHE";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("FINISHED".parse::<GameStatus>(), Ok(GameStatus::Finished));
        assert_eq!(" RUNNING ".parse::<GameStatus>(), Ok(GameStatus::Running));
        assert_eq!(GameStatus::ClockStopped.to_string(), "CLOCK_STOPPED");
        assert!("finished".parse::<GameStatus>().is_err());
    }

    #[test]
    fn test_every_code_round_trips() {
        for status in GameStatus::ALL {
            assert_eq!(status.as_str().parse::<GameStatus>().unwrap(), *status);
        }
        for game_type in GameType::ALL {
            assert_eq!(game_type.as_str().parse::<GameType>().unwrap(), *game_type);
        }
    }

    #[test]
    fn test_in_progress() {
        assert!(GameStatus::Running.is_in_progress());
        assert!(!GameStatus::Finished.is_in_progress());
        assert!(!GameStatus::Scheduled.is_in_progress());
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&GameType::CashGame).unwrap();
        assert_eq!(json, "\"CASH_GAME\"");
    }
}
