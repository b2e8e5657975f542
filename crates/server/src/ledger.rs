//! # Interaction Ledger
//!
//! Per-review like/dislike state.
//!
//! ## Rules
//! - `like` by a user who disliked the review is rejected, nothing changes
//! - `like` by a user who already liked it removes the like (toggle)
//! - otherwise the like is added
//! - `dislike` mirrors `like`
//!
//! Counters are always derived from the membership sets, so
//! `like_count == |liked_by|` and `liked_by ∩ disliked_by = ∅` hold after
//! every call.
//!
//! ## Concurrency
//! The read-modify-write against the primary store runs inside a per-review
//! async mutex. Concurrent votes on one review are serialized; votes on
//! different reviews never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use review_store::{PrimaryStore, ReviewId, Votes};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument};

use crate::actor::Actor;
use crate::error::{Result, ReviewError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Like,
    Dislike,
}

/// Apply one vote to the current membership.
///
/// Pure: returns the next state, or the rejection with `votes` untouched.
pub fn apply_vote(votes: &Votes, user_id: &str, kind: VoteKind) -> std::result::Result<Votes, ValidationError> {
    let mut next = votes.clone();
    match kind {
        VoteKind::Like => {
            if next.disliked_by.contains(user_id) {
                return Err(ValidationError::AlreadyDisliked);
            }
            if !next.liked_by.remove(user_id) {
                next.liked_by.insert(user_id.to_string());
            }
        }
        VoteKind::Dislike => {
            if next.liked_by.contains(user_id) {
                return Err(ValidationError::AlreadyLiked);
            }
            if !next.disliked_by.remove(user_id) {
                next.disliked_by.insert(user_id.to_string());
            }
        }
    }
    Ok(next)
}

/// Like/dislike toggles backed by the primary store
#[derive(Clone)]
pub struct InteractionLedger {
    primary: Arc<dyn PrimaryStore>,
    locks: Arc<Mutex<HashMap<ReviewId, Arc<AsyncMutex<()>>>>>,
}

impl InteractionLedger {
    pub fn new(primary: Arc<dyn PrimaryStore>) -> Self {
        Self {
            primary,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Toggle `actor`'s like on a review. Returns the updated membership.
    pub async fn like(&self, review_id: &str, actor: &Actor) -> Result<Votes> {
        self.vote(review_id, actor, VoteKind::Like).await
    }

    /// Toggle `actor`'s dislike on a review. Returns the updated membership.
    pub async fn dislike(&self, review_id: &str, actor: &Actor) -> Result<Votes> {
        self.vote(review_id, actor, VoteKind::Dislike).await
    }

    #[instrument(skip(self, actor))]
    async fn vote(&self, review_id: &str, actor: &Actor, kind: VoteKind) -> Result<Votes> {
        // Checked before touching the store
        let (user_id, _) = actor.require_user("vote on reviews")?;

        let lock = self.lock_for(review_id);
        let _guard = lock.lock().await;

        let row = self
            .primary
            .get(review_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(review_id.to_string()))?;

        let next = apply_vote(&row.votes(), user_id, kind)?;
        self.primary.update_votes(review_id, &next).await?;

        debug!(
            "Review {} now has {} likes, {} dislikes",
            review_id,
            next.like_count(),
            next.dislike_count()
        );
        Ok(next)
    }

    fn lock_for(&self, review_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(review_id.to_string()).or_default().clone()
    }
}
