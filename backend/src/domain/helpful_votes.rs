//! Helpful-vote tracker.
//!
//! Each user may mark another user's rating helpful at most once. Marking
//! and unmarking are idempotent: repeating either reports `changed: false`
//! instead of failing. Votes never touch cafe aggregates.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::RatingRepository;
use crate::domain::store_errors::map_rating_store_error;
use crate::domain::{Error, Rating, RatingId, UserId};

/// Result of a mark or unmark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulVoteOutcome {
    /// Rating the vote applies to.
    pub rating_id: RatingId,
    /// Stored helpful count after the request.
    pub helpful_count: u32,
    /// Whether the caller's vote is now recorded.
    pub is_helpful: bool,
    /// Whether the request changed the voter set.
    pub changed: bool,
}

/// Service maintaining helpful votes on ratings.
#[derive(Clone)]
pub struct HelpfulVoteService<R> {
    ratings: Arc<R>,
}

impl<R> HelpfulVoteService<R> {
    /// Create a new service over the given store.
    pub fn new(ratings: Arc<R>) -> Self {
        Self { ratings }
    }
}

impl<R> HelpfulVoteService<R>
where
    R: RatingRepository,
{
    /// Mark a rating helpful on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` with reason `rating_not_found` or `user_not_found`.
    /// - `Conflict` with reason `self_vote_denied` when `user_id` wrote the
    ///   rating; nothing is stored.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn mark_helpful(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteOutcome, Error> {
        let rating = self.require_rating(rating_id).await?;
        if rating.is_authored_by(user_id) {
            debug!(%rating_id, %user_id, "rejected helpful vote on own rating");
            return Err(Error::self_vote_denied());
        }
        let change = self
            .ratings
            .add_helpful_vote(rating_id, user_id)
            .await
            .map_err(map_rating_store_error)?;
        if change.changed {
            info!(%rating_id, %user_id, helpful_count = change.helpful_count, "marked rating helpful");
        }
        Ok(HelpfulVoteOutcome {
            rating_id: *rating_id,
            helpful_count: change.helpful_count,
            is_helpful: true,
            changed: change.changed,
        })
    }

    /// Withdraw `user_id`'s helpful vote.
    ///
    /// Unmarking a rating the caller never marked, including their own, is
    /// a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `rating_not_found`, or `ServiceUnavailable`.
    pub async fn unmark_helpful(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteOutcome, Error> {
        let rating = self.require_rating(rating_id).await?;
        if rating.is_authored_by(user_id) {
            return Ok(HelpfulVoteOutcome {
                rating_id: *rating_id,
                helpful_count: rating.helpful_count(),
                is_helpful: false,
                changed: false,
            });
        }
        let change = self
            .ratings
            .remove_helpful_vote(rating_id, user_id)
            .await
            .map_err(map_rating_store_error)?;
        if change.changed {
            info!(%rating_id, %user_id, helpful_count = change.helpful_count, "unmarked rating helpful");
        }
        Ok(HelpfulVoteOutcome {
            rating_id: *rating_id,
            helpful_count: change.helpful_count,
            is_helpful: false,
            changed: change.changed,
        })
    }

    /// Whether `user_id` has marked the rating helpful.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `rating_not_found`, or `ServiceUnavailable`.
    pub async fn is_marked_helpful(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<bool, Error> {
        self.require_rating(rating_id).await?;
        self.ratings
            .has_helpful_vote(rating_id, user_id)
            .await
            .map_err(map_rating_store_error)
    }

    async fn require_rating(&self, rating_id: &RatingId) -> Result<Rating, Error> {
        self.ratings
            .find_rating_by_id(rating_id)
            .await
            .map_err(map_rating_store_error)?
            .ok_or_else(|| Error::rating_not_found(rating_id.to_string()))
    }
}
