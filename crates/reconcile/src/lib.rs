//! # Reconcile Crate
//!
//! Read-side operations over the two review stores.
//!
//! ## Main Components
//!
//! - **reconciler**: Merge primary and legacy rows into one newest-first view
//! - **dedup**: Keep one review per (movie, author) in the primary store
//! - **stats**: Rating histogram, average and per-period counts
//! - **error**: Error types for fetch and delete failures
//!
//! ## Example Usage
//!
//! ```ignore
//! use reconcile::{ReviewReconciler, compute_stats};
//!
//! let reconciler = ReviewReconciler::new(primary, legacy);
//! let reviews = reconciler.for_movie(603).await?;
//! let stats = compute_stats(&reviews);
//! ```

pub mod dedup;
pub mod error;
pub mod reconciler;
pub mod stats;

pub use dedup::{plan_removals, DedupReport, DedupSweep};
pub use error::{ReconcileError, Result};
pub use reconciler::{merge_reviews, ReconcileScope, ReviewReconciler};
pub use stats::{compute_stats, PeriodCount, ReviewStats};
