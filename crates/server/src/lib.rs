//! Server crate for the review lifecycle.
//!
//! This crate contains the orchestrator that ties the stores, the moderation
//! gate, the sentiment client, the reconciler, the interaction ledger and
//! the enrichment pipeline together.

pub mod actor;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod ledger;
pub mod orchestrator;

pub use actor::Actor;
pub use config::ServiceConfig;
pub use enrichment::{EnrichmentEvent, EnrichmentPipeline, EnrichmentReport};
pub use error::{Result, ReviewError, ValidationError};
pub use ledger::{apply_vote, InteractionLedger, VoteKind};
pub use orchestrator::{ReviewOrchestrator, ReviewStores, SubmitOutcome, SubmitRequest};
