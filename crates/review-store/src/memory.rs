//! In-memory store implementations.
//!
//! Rows live in a HashMap keyed by id with secondary indices by movie and
//! author, the same layout a remote document store would expose through
//! its query API. Index vectors keep insertion order, which is the
//! "storage order" the traits talk about.

use crate::error::{Result, StoreError};
use crate::store::{LegacyStore, MovieMetadataCache, PrimaryStore};
use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock as StdRwLock};
use tokio::sync::RwLock;

// =============================================================================
// Primary store
// =============================================================================

#[derive(Debug, Default)]
struct PrimaryIndex {
    rows: HashMap<ReviewId, PrimaryReviewRow>,
    /// Review ids per movie, insertion order
    movie_index: HashMap<MovieId, Vec<ReviewId>>,
    /// Review ids per author, insertion order
    author_index: HashMap<UserId, Vec<ReviewId>>,
}

impl PrimaryIndex {
    fn insert(&mut self, row: PrimaryReviewRow) -> Result<()> {
        if self.rows.contains_key(&row.id) {
            return Err(StoreError::DuplicateId(row.id));
        }
        self.movie_index
            .entry(row.movie_id)
            .or_default()
            .push(row.id.clone());
        self.author_index
            .entry(row.author_id.clone())
            .or_default()
            .push(row.id.clone());
        self.rows.insert(row.id.clone(), row);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<PrimaryReviewRow> {
        let row = self
            .rows
            .remove(id)
            .ok_or_else(|| StoreError::ReviewNotFound(id.to_string()))?;
        if let Some(ids) = self.movie_index.get_mut(&row.movie_id) {
            ids.retain(|existing| existing != id);
        }
        if let Some(ids) = self.author_index.get_mut(&row.author_id) {
            ids.retain(|existing| existing != id);
        }
        Ok(row)
    }

    fn collect(&self, ids: Option<&Vec<ReviewId>>) -> Vec<PrimaryReviewRow> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.rows.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

/// Primary store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryPrimaryStore {
    index: RwLock<PrimaryIndex>,
}

impl InMemoryPrimaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from seed rows, rejecting duplicate ids
    pub fn with_rows(rows: impl IntoIterator<Item = PrimaryReviewRow>) -> Result<Self> {
        let mut index = PrimaryIndex::default();
        for row in rows {
            index.insert(row)?;
        }
        Ok(Self {
            index: RwLock::new(index),
        })
    }

    /// Every row, grouped by movie in insertion order (used when saving seed files)
    pub async fn all_rows(&self) -> Vec<PrimaryReviewRow> {
        let index = self.index.read().await;
        let mut movies: Vec<&MovieId> = index.movie_index.keys().collect();
        movies.sort();
        movies
            .into_iter()
            .flat_map(|movie_id| index.collect(index.movie_index.get(movie_id)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PrimaryStore for InMemoryPrimaryStore {
    async fn fetch_by_movie(&self, movie_id: MovieId) -> Result<Vec<PrimaryReviewRow>> {
        let index = self.index.read().await;
        Ok(index.collect(index.movie_index.get(&movie_id)))
    }

    async fn fetch_by_author(&self, author_id: &str) -> Result<Vec<PrimaryReviewRow>> {
        let index = self.index.read().await;
        Ok(index.collect(index.author_index.get(author_id)))
    }

    async fn get(&self, id: &str) -> Result<Option<PrimaryReviewRow>> {
        Ok(self.index.read().await.rows.get(id).cloned())
    }

    async fn insert(&self, row: PrimaryReviewRow) -> Result<()> {
        self.index.write().await.insert(row)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.index.write().await.remove(id).map(|_| ())
    }

    async fn update_votes(&self, id: &str, votes: &Votes) -> Result<()> {
        let mut index = self.index.write().await;
        let row = index
            .rows
            .get_mut(id)
            .ok_or_else(|| StoreError::ReviewNotFound(id.to_string()))?;
        row.apply_votes(votes);
        Ok(())
    }
}

// =============================================================================
// Legacy store
// =============================================================================

#[derive(Debug, Default)]
struct LegacyIndex {
    /// Legacy rows are never deleted, so positions stay valid
    rows: Vec<LegacyReviewRow>,
    movie_index: HashMap<MovieId, Vec<usize>>,
    author_index: HashMap<UserId, Vec<usize>>,
}

impl LegacyIndex {
    fn insert(&mut self, row: LegacyReviewRow) {
        let position = self.rows.len();
        self.movie_index.entry(row.movie_id).or_default().push(position);
        if let Some(user_id) = &row.user_id {
            self.author_index
                .entry(user_id.clone())
                .or_default()
                .push(position);
        }
        self.rows.push(row);
    }

    fn collect(&self, positions: Option<&Vec<usize>>) -> Vec<LegacyReviewRow> {
        positions
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|&p| self.rows.get(p).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Legacy store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryLegacyStore {
    index: RwLock<LegacyIndex>,
}

impl InMemoryLegacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: impl IntoIterator<Item = LegacyReviewRow>) -> Self {
        let mut index = LegacyIndex::default();
        for row in rows {
            index.insert(row);
        }
        Self {
            index: RwLock::new(index),
        }
    }

    pub async fn all_rows(&self) -> Vec<LegacyReviewRow> {
        self.index.read().await.rows.clone()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LegacyStore for InMemoryLegacyStore {
    async fn fetch_by_movie(&self, movie_id: MovieId) -> Result<Vec<LegacyReviewRow>> {
        let index = self.index.read().await;
        Ok(index.collect(index.movie_index.get(&movie_id)))
    }

    async fn fetch_by_author(&self, user_id: &str) -> Result<Vec<LegacyReviewRow>> {
        let index = self.index.read().await;
        Ok(index.collect(index.author_index.get(user_id)))
    }

    async fn insert(&self, row: LegacyReviewRow) -> Result<()> {
        self.index.write().await.insert(row);
        Ok(())
    }
}

// =============================================================================
// Metadata cache
// =============================================================================

/// Process-local movie metadata cache
#[derive(Debug, Default)]
pub struct InMemoryMetadataCache {
    entries: StdRwLock<HashMap<MovieId, MovieMetadata>>,
}

impl InMemoryMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(movies: impl IntoIterator<Item = MovieMetadata>) -> Self {
        Self {
            entries: StdRwLock::new(movies.into_iter().map(|m| (m.id, m)).collect()),
        }
    }
}

impl MovieMetadataCache for InMemoryMetadataCache {
    fn get(&self, id: MovieId) -> Option<MovieMetadata> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn set(&self, id: MovieId, value: MovieMetadata) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, value);
    }
}
