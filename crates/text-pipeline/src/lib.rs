//! Text processing for review submissions.
//!
//! This crate provides:
//! - SpamChecker trait for pluggable abuse/spam checking services
//! - ProfanityFilter and TermListSpamChecker term-list filters
//! - ModerationGate combining both checks, failing open on spam-check outages
//! - Extractive summaries for long reviews
//!
//! ## Example Usage
//! ```ignore
//! use text_pipeline::{ModerationGate, summarize};
//! use text_pipeline::filters::*;
//!
//! let gate = ModerationGate::new(
//!     ProfanityFilter::with_default_list()?,
//!     Arc::new(TermListSpamChecker::with_default_list()?),
//! );
//! let report = gate.moderate("What a damn good film").await;
//! assert_eq!(report.cleaned_text(), "What a **** good film");
//! ```

pub mod filters;
pub mod gate;
pub mod summary;
pub mod traits;

// Re-export main types
pub use filters::{ProfanityFilter, ProfanityReport, TermListSpamChecker};
pub use gate::{ModerationGate, ModerationReport};
pub use summary::{summarize, summarize_with_threshold, SUMMARY_THRESHOLD};
pub use traits::{SpamChecker, SpamReport};
