//! Term-list filters used by the moderation gate.
//!
//! Both filters share [`TermMatcher`]: case-insensitive, whole-word matching
//! against a configured term list.

pub mod profanity;
pub mod spam;

// Re-export for convenience
pub use profanity::{ProfanityFilter, ProfanityReport, DEFAULT_DENYLIST};
pub use spam::{TermListSpamChecker, DEFAULT_SPAM_TERMS};

use anyhow::{Context, Result};
use regex::Regex;
use std::path::Path;

/// Compiled whole-word matcher for a list of terms
#[derive(Debug, Clone)]
pub struct TermMatcher {
    /// `None` when the term list is empty
    regex: Option<Regex>,
}

impl TermMatcher {
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(Self { regex: None });
        }

        // Longest first so "bullshit" wins over "shit" at the same position
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();

        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .context("Failed to compile term list")?;
        Ok(Self { regex: Some(regex) })
    }

    /// Distinct matched terms, lowercase, in order of first appearance
    pub fn find(&self, text: &str) -> Vec<String> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        let mut found: Vec<String> = Vec::new();
        for m in regex.find_iter(text) {
            let word = m.as_str().to_lowercase();
            if !found.contains(&word) {
                found.push(word);
            }
        }
        found
    }

    /// Replace every match with `*` repeated once per character
    pub fn mask(&self, text: &str) -> String {
        match &self.regex {
            Some(regex) => regex
                .replace_all(text, |caps: &regex::Captures| {
                    "*".repeat(caps[0].chars().count())
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

/// Load a term list: one term per line, blank lines and `#` comments ignored
pub fn load_term_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read term list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
