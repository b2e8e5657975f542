//! Adapters from store-specific rows to the canonical [`Review`].
//!
//! These are the only functions that know about schema differences between
//! the primary and legacy stores.

use crate::types::*;
use chrono::{DateTime, TimeZone, Utc};

/// Display name used for legacy rows written without an author
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Adapt a primary-store row. Vote counters are recomputed from the sets.
pub fn from_primary(row: PrimaryReviewRow) -> Review {
    let sentiment = row
        .sentiment
        .map(|label| Sentiment::new(label, row.confidence.unwrap_or(0)));

    Review {
        id: row.id,
        movie_id: row.movie_id,
        author_id: Some(row.author_id),
        author_display_name: row.author_name,
        star_rating: row.stars.clamp(MIN_STARS, MAX_STARS),
        text: row.text,
        enrichment_state: enrichment_state_for(sentiment.as_ref()),
        sentiment,
        like_count: row.liked_by.len() as u32,
        dislike_count: row.disliked_by.len() as u32,
        liked_by: row.liked_by,
        disliked_by: row.disliked_by,
        created_at: row.created_at,
        source_store: SourceStore::Primary,
    }
}

/// Adapt a legacy-store row.
///
/// The id is synthesized from the timestamp and the author, so two fetches
/// of the same row always produce the same id.
pub fn from_legacy(row: LegacyReviewRow) -> Review {
    let sentiment = row
        .sentiment
        .as_deref()
        .and_then(SentimentLabel::normalize)
        .map(|label| Sentiment::new(label, row.score.map(score_to_confidence).unwrap_or(0)));

    Review {
        id: legacy_review_id(row.timestamp_ms, row.user_id.as_deref()),
        movie_id: row.movie_id,
        author_display_name: row
            .user_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string()),
        author_id: row.user_id,
        star_rating: legacy_stars(row.rating),
        text: row.review_text,
        enrichment_state: enrichment_state_for(sentiment.as_ref()),
        sentiment,
        like_count: 0,
        dislike_count: 0,
        liked_by: Default::default(),
        disliked_by: Default::default(),
        created_at: millis_to_datetime(row.timestamp_ms),
        source_store: SourceStore::Legacy,
    }
}

/// Build the legacy-schema copy of a freshly submitted review
pub fn to_legacy(review: &Review) -> LegacyReviewRow {
    LegacyReviewRow {
        movie_id: review.movie_id,
        user_id: review.author_id.clone(),
        user_name: Some(review.author_display_name.clone()),
        rating: f32::from(review.star_rating),
        review_text: review.text.clone(),
        sentiment: review.sentiment.map(|s| s.label.as_str().to_string()),
        score: review.sentiment.map(|s| f32::from(s.confidence) / 100.0),
        timestamp_ms: review.created_at.timestamp_millis(),
    }
}

/// Synthesized id for a legacy row: creation millis followed by the author id.
///
/// Two legacy reviews by one author within the same millisecond collide.
pub fn legacy_review_id(timestamp_ms: i64, author_id: Option<&str>) -> ReviewId {
    format!("{}-{}", timestamp_ms, author_id.unwrap_or("anonymous"))
}

pub fn millis_to_datetime(timestamp_ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_default()
}

/// Legacy ratings are fractional; round to the nearest whole star
fn legacy_stars(rating: f32) -> u8 {
    if !rating.is_finite() {
        return MIN_STARS;
    }
    (rating.round() as i64).clamp(i64::from(MIN_STARS), i64::from(MAX_STARS)) as u8
}

/// Legacy scores are 0.0-1.0 fractions; some rows already hold percentages
fn score_to_confidence(score: f32) -> u8 {
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    let percent = if score <= 1.0 { score * 100.0 } else { score };
    percent.round().min(100.0) as u8
}

fn enrichment_state_for(sentiment: Option<&Sentiment>) -> EnrichmentState {
    if sentiment.is_some() {
        EnrichmentState::Done
    } else {
        EnrichmentState::Pending
    }
}
