//! Dual-store reconciler.
//!
//! Produces one newest-first view of a movie's (or an author's) reviews from
//! the primary and legacy stores.
//!
//! ## Algorithm
//! 1. Fetch matching rows from both stores concurrently
//! 2. Adapt every row into the canonical `Review`
//! 3. Concatenate primary then legacy
//! 4. Stable-sort descending by `created_at`
//!
//! Sentiment is passed through untouched; backfilling it is the enrichment
//! pipeline's job. Both fetches are unbounded reads with no pagination.

use crate::error::{ReconcileError, Result};
use review_store::adapters::{from_legacy, from_primary};
use review_store::{
    LegacyReviewRow, LegacyStore, MovieId, PrimaryReviewRow, PrimaryStore, Review, UserId,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Which reviews to reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileScope {
    Movie(MovieId),
    Author(UserId),
}

impl fmt::Display for ReconcileScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileScope::Movie(id) => write!(f, "movie {}", id),
            ReconcileScope::Author(id) => write!(f, "author {}", id),
        }
    }
}

/// Merges the primary and legacy stores into one ordered view
#[derive(Clone)]
pub struct ReviewReconciler {
    primary: Arc<dyn PrimaryStore>,
    legacy: Arc<dyn LegacyStore>,
}

impl ReviewReconciler {
    pub fn new(primary: Arc<dyn PrimaryStore>, legacy: Arc<dyn LegacyStore>) -> Self {
        Self { primary, legacy }
    }

    pub async fn for_movie(&self, movie_id: MovieId) -> Result<Vec<Review>> {
        self.reconcile(&ReconcileScope::Movie(movie_id)).await
    }

    pub async fn for_author(&self, author_id: &str) -> Result<Vec<Review>> {
        self.reconcile(&ReconcileScope::Author(author_id.to_string()))
            .await
    }

    /// Fetch both stores and merge. Either fetch failing fails the whole call.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn reconcile(&self, scope: &ReconcileScope) -> Result<Vec<Review>> {
        let (primary_rows, legacy_rows) = match scope {
            ReconcileScope::Movie(movie_id) => tokio::join!(
                self.primary.fetch_by_movie(*movie_id),
                self.legacy.fetch_by_movie(*movie_id)
            ),
            ReconcileScope::Author(author_id) => tokio::join!(
                self.primary.fetch_by_author(author_id),
                self.legacy.fetch_by_author(author_id)
            ),
        };

        let primary_rows = primary_rows.map_err(|e| {
            error!("Primary fetch failed for {}: {}", scope, e);
            ReconcileError::PrimaryFetch(e)
        })?;
        let legacy_rows = legacy_rows.map_err(|e| {
            error!("Legacy fetch failed for {}: {}", scope, e);
            ReconcileError::LegacyFetch(e)
        })?;

        debug!(
            "Fetched {} primary and {} legacy rows",
            primary_rows.len(),
            legacy_rows.len()
        );
        Ok(merge_reviews(primary_rows, legacy_rows))
    }
}

/// Adapt and merge already-fetched rows into one newest-first list
pub fn merge_reviews(
    primary_rows: Vec<PrimaryReviewRow>,
    legacy_rows: Vec<LegacyReviewRow>,
) -> Vec<Review> {
    let mut merged: Vec<Review> = Vec::with_capacity(primary_rows.len() + legacy_rows.len());
    merged.extend(primary_rows.into_iter().map(from_primary));
    merged.extend(legacy_rows.into_iter().map(from_legacy));

    // `sort_by` is stable: equal timestamps keep primary-before-legacy order
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}
