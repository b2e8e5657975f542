//! Deduplication sweep over the primary store.
//!
//! Enforces "at most one review per (movie, author)": for every author with
//! several reviews of the same movie, the newest survives and the rest are
//! deleted. The legacy store is never touched.

use crate::error::{ReconcileError, Result};
use review_store::{MovieId, PrimaryReviewRow, PrimaryStore, ReviewId, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Outcome of one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub movie_id: MovieId,
    /// Rows actually deleted by this sweep
    pub removed: usize,
    /// Rows left for the movie
    pub kept: usize,
}

#[derive(Clone)]
pub struct DedupSweep {
    primary: Arc<dyn PrimaryStore>,
}

impl DedupSweep {
    pub fn new(primary: Arc<dyn PrimaryStore>) -> Self {
        Self { primary }
    }

    /// Run the sweep for one movie. Running it again is a no-op.
    #[instrument(skip(self))]
    pub async fn run(&self, movie_id: MovieId) -> Result<DedupReport> {
        let rows = self
            .primary
            .fetch_by_movie(movie_id)
            .await
            .map_err(ReconcileError::PrimaryFetch)?;
        let total = rows.len();

        let doomed = plan_removals(rows);
        debug!("{} of {} rows superseded", doomed.len(), total);

        let mut removed = 0;
        for id in &doomed {
            match self.primary.delete(id).await {
                Ok(()) => removed += 1,
                // Deleted concurrently by someone else; the end state is the same
                Err(StoreError::ReviewNotFound(_)) => {
                    debug!("Review {} already gone", id);
                }
                Err(source) => {
                    error!("Failed to delete duplicate {}: {}", id, source);
                    return Err(ReconcileError::Delete {
                        id: id.clone(),
                        source,
                    });
                }
            }
        }

        info!("Dedup for movie {}: removed {} duplicates", movie_id, removed);
        Ok(DedupReport {
            movie_id,
            removed,
            kept: total - doomed.len(),
        })
    }
}

/// Ids of rows superseded by a newer review from the same author.
///
/// Rows are ordered newest-first (stable, so storage order breaks ties) and
/// the first row seen per author wins.
pub fn plan_removals(mut rows: Vec<PrimaryReviewRow>) -> Vec<ReviewId> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| !seen.insert(row.author_id.clone()))
        .map(|row| row.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use review_store::adapters::millis_to_datetime;
    use review_store::{InMemoryPrimaryStore, Votes};
    use std::collections::HashMap;

    fn row(id: &str, movie_id: MovieId, author: &str, ms: i64) -> PrimaryReviewRow {
        PrimaryReviewRow {
            id: id.to_string(),
            movie_id,
            author_id: author.to_string(),
            author_name: author.to_string(),
            stars: 3,
            text: "text".to_string(),
            sentiment: None,
            confidence: None,
            liked_by: Default::default(),
            disliked_by: Default::default(),
            like_count: 0,
            dislike_count: 0,
            created_at: millis_to_datetime(ms),
        }
    }

    fn fixture() -> Vec<PrimaryReviewRow> {
        vec![
            row("a-old", 7, "alice", 1_000),
            row("a-new", 7, "alice", 3_000),
            row("a-mid", 7, "alice", 2_000),
            row("b-only", 7, "bob", 1_500),
            row("c-old", 7, "carol", 100),
            row("c-new", 7, "carol", 200),
            row("other-movie", 8, "alice", 50),
        ]
    }

    #[test]
    fn test_plan_keeps_newest_per_author() {
        let mut doomed = plan_removals(fixture().into_iter().filter(|r| r.movie_id == 7).collect());
        doomed.sort();
        assert_eq!(doomed, vec!["a-mid", "a-old", "c-old"]);
    }

    #[test]
    fn test_plan_no_duplicates() {
        let rows = vec![row("x", 1, "u1", 1), row("y", 1, "u2", 2)];
        assert!(plan_removals(rows).is_empty());
    }

    #[tokio::test]
    async fn test_sweep_leaves_one_newest_review_per_author() {
        let rows = fixture();
        let mut newest: HashMap<String, (i64, String)> = HashMap::new();
        for r in rows.iter().filter(|r| r.movie_id == 7) {
            let ms = r.created_at.timestamp_millis();
            let entry = newest.entry(r.author_id.clone()).or_insert((ms, r.id.clone()));
            if ms > entry.0 {
                *entry = (ms, r.id.clone());
            }
        }

        let store = Arc::new(InMemoryPrimaryStore::with_rows(rows).unwrap());
        let sweep = DedupSweep::new(store.clone());
        let report = sweep.run(7).await.unwrap();

        assert_eq!(report.removed, 3);
        assert_eq!(report.kept, 3);

        let survivors = store.fetch_by_movie(7).await.unwrap();
        assert_eq!(survivors.len(), newest.len());
        for survivor in survivors {
            assert_eq!(newest[&survivor.author_id].1, survivor.id);
        }

        // Other movies are untouched
        assert_eq!(store.fetch_by_movie(8).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = Arc::new(InMemoryPrimaryStore::with_rows(fixture()).unwrap());
        let sweep = DedupSweep::new(store.clone());

        sweep.run(7).await.unwrap();
        let second = sweep.run(7).await.unwrap();
        assert_eq!(second.removed, 0);
        assert_eq!(second.kept, 3);
    }

    /// Every delete reports the row as already gone
    struct RacingStore {
        rows: Vec<PrimaryReviewRow>,
    }

    #[async_trait]
    impl PrimaryStore for RacingStore {
        async fn fetch_by_movie(&self, movie_id: MovieId) -> review_store::Result<Vec<PrimaryReviewRow>> {
            Ok(self.rows.iter().filter(|r| r.movie_id == movie_id).cloned().collect())
        }
        async fn fetch_by_author(&self, _: &str) -> review_store::Result<Vec<PrimaryReviewRow>> {
            Ok(vec![])
        }
        async fn get(&self, _: &str) -> review_store::Result<Option<PrimaryReviewRow>> {
            Ok(None)
        }
        async fn insert(&self, _: PrimaryReviewRow) -> review_store::Result<()> {
            Ok(())
        }
        async fn delete(&self, id: &str) -> review_store::Result<()> {
            Err(StoreError::ReviewNotFound(id.to_string()))
        }
        async fn update_votes(&self, _: &str, _: &Votes) -> review_store::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_already_deleted_rows_are_not_counted() {
        let sweep = DedupSweep::new(Arc::new(RacingStore { rows: fixture() }));
        let report = sweep.run(7).await.unwrap();
        assert_eq!(report.removed, 0);
        assert_eq!(report.kept, 3);
    }
}
