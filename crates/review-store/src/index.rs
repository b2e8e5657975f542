//! Seed directory loading and saving.
//!
//! A seed directory holds the two review stores and the movie metadata as
//! flat files. Loading parses the three files in parallel, validates them
//! and hands back ready-to-use in-memory stores.

use crate::error::{Result, StoreError};
use crate::memory::{InMemoryLegacyStore, InMemoryMetadataCache, InMemoryPrimaryStore};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const PRIMARY_FILE: &str = "reviews.dat";
pub const LEGACY_FILE: &str = "legacy_reviews.dat";
pub const MOVIES_FILE: &str = "movies.dat";

/// Raw contents of a seed directory
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub primary: Vec<PrimaryReviewRow>,
    pub legacy: Vec<LegacyReviewRow>,
    pub movies: Vec<MovieMetadata>,
}

/// Stores built from a seed directory, shareable with the services using them
#[derive(Debug, Clone)]
pub struct SeededStores {
    pub primary: Arc<InMemoryPrimaryStore>,
    pub legacy: Arc<InMemoryLegacyStore>,
    pub metadata: Arc<InMemoryMetadataCache>,
}

impl SeedData {
    /// Load all three seed files from a directory.
    ///
    /// The review files are required; movies.dat is optional since metadata
    /// is only used for display.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading seed data from {}", data_dir.display());

        let primary_path = data_dir.join(PRIMARY_FILE);
        let legacy_path = data_dir.join(LEGACY_FILE);
        let movies_path = data_dir.join(MOVIES_FILE);

        let ((primary, legacy), movies) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_primary_reviews(&primary_path),
                    || parser::parse_legacy_reviews(&legacy_path),
                )
            },
            || {
                if movies_path.exists() {
                    parser::parse_movies(&movies_path)
                } else {
                    Ok(Vec::new())
                }
            },
        );

        let seed = SeedData {
            primary: primary?,
            legacy: legacy?,
            movies: movies?,
        };
        seed.validate()?;

        info!(
            "Loaded {} primary reviews, {} legacy reviews, {} movies",
            seed.primary.len(),
            seed.legacy.len(),
            seed.movies.len()
        );
        Ok(seed)
    }

    /// Check that:
    /// - primary ids are unique
    /// - primary vote sets are disjoint
    /// - legacy ratings are finite
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for row in &self.primary {
            if !seen.insert(row.id.as_str()) {
                return Err(StoreError::DuplicateId(row.id.clone()));
            }
            if let Some(user) = row.liked_by.intersection(&row.disliked_by).next() {
                return Err(StoreError::InvalidValue {
                    field: format!("votes of review {}", row.id),
                    value: format!("{} both liked and disliked", user),
                });
            }
        }
        for row in &self.legacy {
            if !row.rating.is_finite() {
                return Err(StoreError::InvalidValue {
                    field: "legacy rating".to_string(),
                    value: row.rating.to_string(),
                });
            }
        }
        debug!("Seed data validated");
        Ok(())
    }

    pub fn into_stores(self) -> Result<SeededStores> {
        Ok(SeededStores {
            primary: Arc::new(InMemoryPrimaryStore::with_rows(self.primary)?),
            legacy: Arc::new(InMemoryLegacyStore::with_rows(self.legacy)),
            metadata: Arc::new(InMemoryMetadataCache::with_movies(self.movies)),
        })
    }
}

impl SeededStores {
    /// Write both review stores back to the seed directory
    pub async fn save_to_dir(&self, data_dir: &Path) -> Result<()> {
        let primary = self.primary.all_rows().await;
        let legacy = self.legacy.all_rows().await;
        parser::write_primary_reviews(&data_dir.join(PRIMARY_FILE), &primary)?;
        parser::write_legacy_reviews(&data_dir.join(LEGACY_FILE), &legacy)?;
        info!(
            "Saved {} primary and {} legacy reviews to {}",
            primary.len(),
            legacy.len(),
            data_dir.display()
        );
        Ok(())
    }
}
