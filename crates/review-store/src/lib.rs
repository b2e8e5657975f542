//! # Review Store Crate
//!
//! Persistence-facing half of the review lifecycle.
//!
//! ## Main Components
//!
//! - **types**: Canonical `Review`, the two store row schemas, sentiment types
//! - **adapters**: Primary row → `Review`, legacy row → `Review`
//! - **store**: Async store traits plus the movie metadata cache capability
//! - **memory**: In-memory implementations of those traits
//! - **parser**: Parse and write `.dat` seed files
//! - **index**: Load a seed directory into ready-to-use stores
//! - **error**: Error types for store access
//!
//! ## Example Usage
//!
//! ```ignore
//! use review_store::{SeedData, PrimaryStore};
//! use std::path::Path;
//!
//! let stores = SeedData::load_from_dir(Path::new("data/reviews"))?.into_stores()?;
//! let rows = stores.primary.fetch_by_movie(603).await?;
//! ```

pub mod adapters;
pub mod error;
pub mod index;
pub mod memory;
pub mod parser;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{Result, StoreError};
pub use index::{SeedData, SeededStores};
pub use memory::{InMemoryLegacyStore, InMemoryMetadataCache, InMemoryPrimaryStore};
pub use store::{LegacyStore, MovieMetadataCache, PrimaryStore};
pub use types::{
    // Type aliases
    MovieId,
    ReviewId,
    UserId,
    // Core types
    LegacyReviewRow,
    MovieMetadata,
    PrimaryReviewRow,
    Review,
    Sentiment,
    Votes,
    // Enums
    EnrichmentState,
    SentimentLabel,
    SourceStore,
    // Constants
    MAX_STARS,
    MIN_STARS,
};
