//! Errors surfaced by the review service.
//!
//! `ValidationError` messages are shown to users as-is, so they say what to
//! do next. Everything else in `ReviewError` is an operational failure.

use reconcile::ReconcileError;
use review_store::{MovieId, ReviewId, StoreError, MAX_STARS, MIN_STARS};
use thiserror::Error;

/// Rejections that happen before any state changes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please sign in to {action}")]
    Unauthenticated { action: &'static str },

    #[error("Please select a star rating between {min} and {max} (got {0})", min = MIN_STARS, max = MAX_STARS)]
    StarsOutOfRange(u8),

    #[error("Please write a few words about the movie before submitting")]
    EmptyText,

    #[error("You have already reviewed movie {movie_id}; edit or remove that review instead")]
    DuplicateSubmission { movie_id: MovieId },

    #[error("You already disliked this review; remove the dislike before liking it")]
    AlreadyDisliked,

    #[error("You already liked this review; remove the like before disliking it")]
    AlreadyLiked,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Review not found: {0}")]
    NotFound(ReviewId),

    /// Primary store read or write failed
    #[error("Review store failure: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl ReviewError {
    /// Whether the caller should show this error to the user rather than
    /// treat it as an outage
    pub fn is_user_facing(&self) -> bool {
        matches!(self, ReviewError::Validation(_) | ReviewError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_actionable() {
        assert_eq!(
            ValidationError::StarsOutOfRange(0).to_string(),
            "Please select a star rating between 1 and 5 (got 0)"
        );
        assert_eq!(
            ValidationError::Unauthenticated { action: "vote on reviews" }.to_string(),
            "Please sign in to vote on reviews"
        );
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(ReviewError::from(ValidationError::EmptyText).is_user_facing());
        assert!(!ReviewError::from(StoreError::ReviewNotFound("x".into())).is_user_facing());
    }
}
