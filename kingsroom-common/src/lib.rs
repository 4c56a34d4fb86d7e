//! # Kingsroom Common Library
//!
//! Shared code for the Kingsroom acquisition services including:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Game record field names and enumerations
//! - Legacy/rich game variant taxonomy
//! - Buy-in tiers and buckets
//! - Game classification type and composite query keys

#[macro_use]
mod macros;

pub mod buyin;
pub mod config;
pub mod error;
pub mod game;
pub mod query_keys;
pub mod taxonomy;

pub use buyin::{BuyInBand, BuyInTier};
pub use error::{Error, Result};
pub use game::{GameStatus, GameType, TournamentType};
pub use query_keys::{ClassificationType, QueryKeyInputs, QueryKeySet};
pub use taxonomy::{BettingStructure, GameVariant, VariantClassification, VariantCode};
