//! Core traits for the moderation pipeline.

use anyhow::Result;
use async_trait::async_trait;

/// Outcome of the abusive/spam term check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpamReport {
    pub is_abusive: bool,
    /// Distinct matched terms, lowercase, in order of first appearance
    pub found_words: Vec<String>,
}

impl SpamReport {
    /// The verdict used when the checker cannot be reached
    pub fn clean() -> Self {
        Self::default()
    }
}

/// A spam/abuse checking service.
///
/// ## Design Note
/// - `Send + Sync` so one checker can be shared across concurrent submissions
/// - Errors mean "could not check", never "text is bad"; the gate turns
///   them into a clean verdict
#[async_trait]
pub trait SpamChecker: Send + Sync {
    /// Returns the name of this checker (for logging/debugging)
    fn name(&self) -> &str;

    async fn check(&self, text: &str) -> Result<SpamReport>;
}
