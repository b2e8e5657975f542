//! The ModerationGate runs both text checks before a review is persisted.
//!
//! ## Usage
//! ```ignore
//! let gate = ModerationGate::new(
//!     ProfanityFilter::with_default_list()?,
//!     Arc::new(TermListSpamChecker::with_default_list()?),
//! );
//!
//! let report = gate.moderate(&text).await;
//! if report.text_altered() { /* warn the user */ }
//! ```

use crate::filters::{ProfanityFilter, ProfanityReport};
use crate::traits::{SpamChecker, SpamReport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long the spam checker gets before the gate stops waiting
pub const DEFAULT_SPAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Combined outcome of both checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationReport {
    pub profanity: ProfanityReport,
    pub spam: SpamReport,
}

impl ModerationReport {
    /// Text to persist
    pub fn cleaned_text(&self) -> &str {
        &self.profanity.cleaned_text
    }

    /// Whether masking changed what the user typed
    pub fn text_altered(&self) -> bool {
        self.profanity.contains_profanity
    }
}

/// Profanity masking plus a fail-open spam check. Side-effect free.
#[derive(Clone)]
pub struct ModerationGate {
    profanity: ProfanityFilter,
    spam: Arc<dyn SpamChecker>,
    spam_timeout: Duration,
}

impl ModerationGate {
    pub fn new(profanity: ProfanityFilter, spam: Arc<dyn SpamChecker>) -> Self {
        Self {
            profanity,
            spam,
            spam_timeout: DEFAULT_SPAM_TIMEOUT,
        }
    }

    /// Configure the spam-check timeout (default: 5s)
    pub fn with_spam_timeout(mut self, timeout: Duration) -> Self {
        self.spam_timeout = timeout;
        self
    }

    pub fn check_profanity(&self, text: &str) -> ProfanityReport {
        self.profanity.check(text)
    }

    /// Run the spam check. An unreachable or slow checker yields a clean
    /// verdict so that moderation outages never block submission.
    pub async fn check_spam(&self, text: &str) -> SpamReport {
        match tokio::time::timeout(self.spam_timeout, self.spam.check(text)).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(
                    "Spam checker {} unavailable, passing text through: {:#}",
                    self.spam.name(),
                    e
                );
                SpamReport::clean()
            }
            Err(_) => {
                warn!(
                    "Spam checker {} timed out after {:?}, passing text through",
                    self.spam.name(),
                    self.spam_timeout
                );
                SpamReport::clean()
            }
        }
    }

    /// Run both checks. The spam check sees the original text.
    pub async fn moderate(&self, text: &str) -> ModerationReport {
        let profanity = self.check_profanity(text);
        let spam = self.check_spam(text).await;
        debug!(
            "Moderation: profanity={} ({} words), abusive={} ({} words)",
            profanity.contains_profanity,
            profanity.found_words.len(),
            spam.is_abusive,
            spam.found_words.len()
        );
        ModerationReport { profanity, spam }
    }
}
