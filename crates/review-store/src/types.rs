//! Core domain types for movie reviews.
//!
//! Two row shapes live here, one per store, plus the canonical [`Review`]
//! that everything downstream of the adapters works with:
//! - [`PrimaryReviewRow`]: current schema, owns vote state
//! - [`LegacyReviewRow`]: pre-migration schema, anonymous rows allowed
//! - [`Review`]: merged view shape produced by [`crate::adapters`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a movie (TMDB-style numeric id)
pub type MovieId = u32;

/// Opaque identifier for an authenticated user
pub type UserId = String;

/// Identifier of a review, unique within a merged view
pub type ReviewId = String;

/// Lowest and highest star rating a review may carry
pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 5;

// =============================================================================
// Sentiment
// =============================================================================

/// The three sentiment classes every classifier vocabulary collapses into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    /// Map a raw label from any known vocabulary onto a sentiment class.
    ///
    /// Accepts plain words ("POSITIVE", "neg"), index labels ("LABEL_0".."LABEL_2")
    /// and star buckets ("1 star".."5 stars"). Returns `None` for anything else.
    pub fn normalize(raw: &str) -> Option<Self> {
        let label = raw.trim().to_ascii_lowercase();
        match label.as_str() {
            "positive" | "pos" | "label_2" => return Some(SentimentLabel::Positive),
            "negative" | "neg" | "label_0" => return Some(SentimentLabel::Negative),
            "neutral" | "neu" | "mixed" | "label_1" => return Some(SentimentLabel::Neutral),
            _ => {}
        }

        let stars = label
            .strip_suffix("stars")
            .or_else(|| label.strip_suffix("star"))?
            .trim()
            .parse::<u8>()
            .ok()?;
        match stars {
            1 | 2 => Some(SentimentLabel::Negative),
            3 => Some(SentimentLabel::Neutral),
            4 | 5 => Some(SentimentLabel::Positive),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved classification: label plus confidence in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub confidence: u8,
}

impl Sentiment {
    /// Confidence above 100 is clamped
    pub fn new(label: SentimentLabel, confidence: u8) -> Self {
        Self {
            label,
            confidence: confidence.min(100),
        }
    }
}

// =============================================================================
// Review state enums
// =============================================================================

/// Which store a merged review came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStore {
    Primary,
    Legacy,
}

/// Progress of background sentiment backfill for one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentState {
    /// No sentiment yet, not scheduled
    Pending,
    /// Classification request in flight
    Analyzing,
    /// Sentiment set (fallback included)
    Done,
}

// =============================================================================
// Canonical Review
// =============================================================================

/// One review as seen by the merged view.
///
/// Both store rows are adapted into this shape, so the reconciler, the
/// stats aggregator and the enrichment pipeline never see schema quirks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub movie_id: MovieId,
    /// `None` for anonymous legacy rows
    pub author_id: Option<UserId>,
    pub author_display_name: String,
    /// Always within `MIN_STARS..=MAX_STARS`
    pub star_rating: u8,
    pub text: String,
    pub sentiment: Option<Sentiment>,
    pub like_count: u32,
    pub dislike_count: u32,
    pub liked_by: BTreeSet<UserId>,
    pub disliked_by: BTreeSet<UserId>,
    pub created_at: DateTime<Utc>,
    pub source_store: SourceStore,
    pub enrichment_state: EnrichmentState,
}

impl Review {
    pub fn sentiment_label(&self) -> Option<SentimentLabel> {
        self.sentiment.map(|s| s.label)
    }

    pub fn sentiment_confidence(&self) -> Option<u8> {
        self.sentiment.map(|s| s.confidence)
    }

    /// Whether the enrichment pipeline still has work to do for this review
    pub fn needs_enrichment(&self) -> bool {
        self.sentiment.is_none()
    }
}

// =============================================================================
// Store rows
// =============================================================================

/// Like/dislike membership for one review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Votes {
    pub liked_by: BTreeSet<UserId>,
    pub disliked_by: BTreeSet<UserId>,
}

impl Votes {
    pub fn like_count(&self) -> u32 {
        self.liked_by.len() as u32
    }

    pub fn dislike_count(&self) -> u32 {
        self.disliked_by.len() as u32
    }
}

/// Row shape of the current-schema (primary) store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryReviewRow {
    pub id: ReviewId,
    pub movie_id: MovieId,
    pub author_id: UserId,
    pub author_name: String,
    pub stars: u8,
    pub text: String,
    pub sentiment: Option<SentimentLabel>,
    pub confidence: Option<u8>,
    pub liked_by: BTreeSet<UserId>,
    pub disliked_by: BTreeSet<UserId>,
    pub like_count: u32,
    pub dislike_count: u32,
    pub created_at: DateTime<Utc>,
}

impl PrimaryReviewRow {
    pub fn votes(&self) -> Votes {
        Votes {
            liked_by: self.liked_by.clone(),
            disliked_by: self.disliked_by.clone(),
        }
    }

    /// Replace vote membership and recompute both counters from it
    pub fn apply_votes(&mut self, votes: &Votes) {
        self.liked_by = votes.liked_by.clone();
        self.disliked_by = votes.disliked_by.clone();
        self.like_count = votes.like_count();
        self.dislike_count = votes.dislike_count();
    }
}

/// Row shape of the legacy store, which predates the schema migration.
///
/// Differences from the primary schema: the author may be missing, the
/// rating is fractional, the sentiment label is free-form text, the score
/// is a 0.0-1.0 fraction and the timestamp is epoch milliseconds. There is
/// no vote state and no row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyReviewRow {
    pub movie_id: MovieId,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub rating: f32,
    pub review_text: String,
    pub sentiment: Option<String>,
    pub score: Option<f32>,
    pub timestamp_ms: i64,
}

// =============================================================================
// Movie metadata
// =============================================================================

/// Cached movie metadata, owned by an external lookup service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub id: MovieId,
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    pub genres: Vec<String>,
}
