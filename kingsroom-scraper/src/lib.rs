//! kingsroom-scraper library interface
//!
//! Tournament page acquisition core: candidate selection, batch run control,
//! cached/live source resolution, validation with auto-correction, and
//! classification enrichment.

pub mod controller;
pub mod enrich;
pub mod error;
pub mod events;
pub mod models;
pub mod pipeline;
pub mod selector;
pub mod service;
pub mod services;
pub mod source;
pub mod validation;

pub use crate::controller::BatchRunController;
pub use crate::error::{FatalError, ScrapeError, ScrapeResult};
pub use crate::events::RunEvent;
pub use crate::service::{ScrapeService, ServiceParts};
