//! Profanity filter.
//!
//! Masks denylisted words in review text. The mask keeps the length of the
//! original word so the text the user typed keeps its shape.

use super::TermMatcher;
use anyhow::Result;

/// Built-in denylist used when no custom list is configured
pub const DEFAULT_DENYLIST: &[&str] = &[
    "asshole",
    "bastard",
    "bitch",
    "bullshit",
    "crap",
    "damn",
    "dick",
    "fuck",
    "fucking",
    "motherfucker",
    "piss",
    "shit",
];

/// Output of the profanity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfanityReport {
    pub contains_profanity: bool,
    pub found_words: Vec<String>,
    /// Input text with every match replaced by `*` of equal length
    pub cleaned_text: String,
}

/// Case-insensitive, whole-word denylist filter
#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    matcher: TermMatcher,
}

impl ProfanityFilter {
    pub fn new<I, S>(denylist: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            matcher: TermMatcher::new(denylist)?,
        })
    }

    pub fn with_default_list() -> Result<Self> {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }

    pub fn check(&self, text: &str) -> ProfanityReport {
        let found_words = self.matcher.find(text);
        if found_words.is_empty() {
            return ProfanityReport {
                contains_profanity: false,
                found_words,
                cleaned_text: text.to_string(),
            };
        }
        ProfanityReport {
            contains_profanity: true,
            found_words,
            cleaned_text: self.matcher.mask(text),
        }
    }
}
