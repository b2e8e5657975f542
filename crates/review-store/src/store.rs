//! Store seams.
//!
//! The primary and legacy stores are independent collaborators with their
//! own schemas. Both are fetched by movie or by author; only the primary
//! store supports deletes and vote updates.

use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;

/// Current-schema review persistence
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// All rows for a movie, in storage order
    async fn fetch_by_movie(&self, movie_id: MovieId) -> Result<Vec<PrimaryReviewRow>>;

    /// All rows written by an author, in storage order
    async fn fetch_by_author(&self, author_id: &str) -> Result<Vec<PrimaryReviewRow>>;

    async fn get(&self, id: &str) -> Result<Option<PrimaryReviewRow>>;

    /// Fails with `DuplicateId` if a row with the same id exists
    async fn insert(&self, row: PrimaryReviewRow) -> Result<()>;

    /// Fails with `ReviewNotFound` if the row is already gone
    async fn delete(&self, id: &str) -> Result<()>;

    /// Overwrite vote membership; counters are derived from the sets
    async fn update_votes(&self, id: &str, votes: &Votes) -> Result<()>;
}

/// Pre-migration review persistence, written best-effort
#[async_trait]
pub trait LegacyStore: Send + Sync {
    async fn fetch_by_movie(&self, movie_id: MovieId) -> Result<Vec<LegacyReviewRow>>;

    async fn fetch_by_author(&self, user_id: &str) -> Result<Vec<LegacyReviewRow>>;

    async fn insert(&self, row: LegacyReviewRow) -> Result<()>;
}

/// Externally owned movie metadata lookup, injected as a get/set capability
pub trait MovieMetadataCache: Send + Sync {
    fn get(&self, id: MovieId) -> Option<MovieMetadata>;

    fn set(&self, id: MovieId, value: MovieMetadata);
}
