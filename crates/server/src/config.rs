//! Service configuration.
//!
//! Every knob has a default matching production behaviour; binaries override
//! individual fields with the `with_*` builders.

use std::time::Duration;

use sentiment_client::{DEFAULT_BACKGROUND_TIMEOUT, DEFAULT_INLINE_TIMEOUT};
use text_pipeline::filters::{DEFAULT_DENYLIST, DEFAULT_SPAM_TERMS};
use text_pipeline::gate::DEFAULT_SPAM_TIMEOUT;
use text_pipeline::SUMMARY_THRESHOLD;

use crate::enrichment::{DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE};

pub const DEFAULT_CLASSIFIER_ADDR: &str = "http://localhost:50051";

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// gRPC address of the sentiment model service
    pub classifier_addr: String,
    /// Bound for the classification call on the submission path
    pub inline_timeout: Duration,
    /// Per-item bound for enrichment calls
    pub background_timeout: Duration,
    pub enrichment_batch_size: usize,
    pub batch_pause: Duration,
    /// Reviews longer than this many characters are summarized
    pub summary_threshold: usize,
    pub spam_check_timeout: Duration,
    pub denylist: Vec<String>,
    pub spam_terms: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            classifier_addr: DEFAULT_CLASSIFIER_ADDR.to_string(),
            inline_timeout: DEFAULT_INLINE_TIMEOUT,
            background_timeout: DEFAULT_BACKGROUND_TIMEOUT,
            enrichment_batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            summary_threshold: SUMMARY_THRESHOLD,
            spam_check_timeout: DEFAULT_SPAM_TIMEOUT,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
            spam_terms: DEFAULT_SPAM_TERMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServiceConfig {
    pub fn with_classifier_addr(mut self, addr: impl Into<String>) -> Self {
        self.classifier_addr = addr.into();
        self
    }

    pub fn with_inline_timeout(mut self, timeout: Duration) -> Self {
        self.inline_timeout = timeout;
        self
    }

    pub fn with_background_timeout(mut self, timeout: Duration) -> Self {
        self.background_timeout = timeout;
        self
    }

    /// Batch size is at least 1
    pub fn with_enrichment_batch_size(mut self, size: usize) -> Self {
        self.enrichment_batch_size = size.max(1);
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn with_summary_threshold(mut self, threshold: usize) -> Self {
        self.summary_threshold = threshold;
        self
    }

    pub fn with_spam_check_timeout(mut self, timeout: Duration) -> Self {
        self.spam_check_timeout = timeout;
        self
    }

    /// Replace the profanity denylist
    pub fn with_denylist(mut self, terms: Vec<String>) -> Self {
        self.denylist = terms;
        self
    }

    pub fn with_spam_terms(mut self, terms: Vec<String>) -> Self {
        self.spam_terms = terms;
        self
    }
}
