//! Local abusive/spam term checker.

use super::TermMatcher;
use crate::traits::{SpamChecker, SpamReport};
use anyhow::Result;
use async_trait::async_trait;

/// Smaller list of abusive phrases and spam markers
pub const DEFAULT_SPAM_TERMS: &[&str] = &[
    "buy now",
    "click here",
    "free money",
    "kill yourself",
    "kys",
    "promo code",
    "visit my channel",
];

/// In-process checker over a fixed term list. Never fails.
#[derive(Debug, Clone)]
pub struct TermListSpamChecker {
    matcher: TermMatcher,
}

impl TermListSpamChecker {
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            matcher: TermMatcher::new(terms)?,
        })
    }

    pub fn with_default_list() -> Result<Self> {
        Self::new(DEFAULT_SPAM_TERMS.iter().copied())
    }
}

#[async_trait]
impl SpamChecker for TermListSpamChecker {
    fn name(&self) -> &str {
        "TermListSpamChecker"
    }

    async fn check(&self, text: &str) -> Result<SpamReport> {
        let found_words = self.matcher.find(text);
        Ok(SpamReport {
            is_abusive: !found_words.is_empty(),
            found_words,
        })
    }
}
