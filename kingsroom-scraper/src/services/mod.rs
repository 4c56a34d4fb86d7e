//! Collaborators behind the acquisition pipeline

pub mod extraction;
pub mod identity;
pub mod persistence;
pub mod progress;

pub use extraction::{ExtractionAdapter, ExtractionError, JsonExtractionAdapter};
pub use identity::{EntityContext, IdentityError, IdentityResolver, StaticIdentityResolver};
pub use persistence::{JsonLinesRouter, PersistenceRouter, RouterError};
pub use progress::{
    KnownGame, KnownGameIndex, NoKnownGames, ProgressLedger, StaticKnownGames, StoreProgressLedger,
};
