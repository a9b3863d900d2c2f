//! Port for rating persistence, aggregate recomputation and helpful votes.
//!
//! The [`RatingRepository`] trait owns every write that touches derived
//! rating data. Operations that read-then-write derived values run as one
//! atomic unit inside the adapter:
//!
//! - [`RatingRepository::recompute_cafe_aggregates`] locks the cafe, reads
//!   every score for it, applies the supplied pure recompute and stores the
//!   result. Concurrent recomputes for the same cafe are serialized.
//! - [`RatingRepository::add_helpful_vote`] and
//!   [`RatingRepository::remove_helpful_vote`] lock the rating, change the
//!   voter set and store the recounted `helpful_count`.

use async_trait::async_trait;

use crate::domain::{
    CafeId, CafeRatingAggregates, Rating, RatingId, RatingScore, ReviewSort, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rating repository adapters.
    pub enum RatingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "rating repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "rating repository query failed: {message}",
        /// The (user, cafe) pair already has a rating.
        DuplicateRating { user_id: String, cafe_id: String } =>
            "user {user_id} has already rated cafe {cafe_id}",
        /// Referenced cafe does not exist.
        CafeNotFound { cafe_id: String } =>
            "cafe not found: {cafe_id}",
        /// Referenced rating does not exist.
        RatingNotFound { rating_id: String } =>
            "rating not found: {rating_id}",
        /// Referenced user does not exist.
        UserNotFound { user_id: String } =>
            "user not found: {user_id}",
    }
}

/// Pure recompute applied by the adapter inside its atomic unit.
pub type AggregateRecompute = fn(&[RatingScore]) -> CafeRatingAggregates;

/// Result of a helpful-vote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HelpfulVoteChange {
    /// Stored vote count after the mutation.
    pub helpful_count: u32,
    /// Whether the voter set changed.
    pub changed: bool,
}

/// One window of a cafe's ratings plus the cafe's rating total.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RatingMatches {
    /// Ratings inside the requested window, in the requested order.
    pub ratings: Vec<Rating>,
    /// Number of ratings the cafe has.
    pub total_count: u64,
}

/// Port for rating storage and the derived data that depends on it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Fetch a rating, with its helpful voters, by id.
    async fn find_rating_by_id(
        &self,
        rating_id: &RatingId,
    ) -> Result<Option<Rating>, RatingRepositoryError>;

    /// Fetch the rating a user wrote for a cafe, if any.
    async fn find_rating_by_user_and_cafe(
        &self,
        user_id: &UserId,
        cafe_id: &CafeId,
    ) -> Result<Option<Rating>, RatingRepositoryError>;

    /// Fetch every rating of a cafe in id order.
    async fn find_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
    ) -> Result<Vec<Rating>, RatingRepositoryError>;

    /// Fetch the `[offset, offset + limit)` window of a cafe's ratings.
    async fn list_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
        sort: ReviewSort,
        offset: u64,
        limit: u32,
    ) -> Result<RatingMatches, RatingRepositoryError>;

    /// Store a new rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingRepositoryError::DuplicateRating`] when the author has
    /// already rated the cafe, and `CafeNotFound`/`UserNotFound` for dangling
    /// references.
    async fn insert_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError>;

    /// Overwrite score, review, aspects and `updated_at` of a stored rating.
    ///
    /// Helpful votes are left untouched.
    async fn update_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError>;

    /// Delete a rating and its helpful votes.
    ///
    /// Returns `Ok(false)` when the rating did not exist.
    async fn delete_rating(&self, rating_id: &RatingId) -> Result<bool, RatingRepositoryError>;

    /// Recompute and store a cafe's aggregates as one atomic unit.
    ///
    /// Returns the stored aggregates, or
    /// [`RatingRepositoryError::CafeNotFound`].
    async fn recompute_cafe_aggregates(
        &self,
        cafe_id: &CafeId,
        recompute: AggregateRecompute,
    ) -> Result<CafeRatingAggregates, RatingRepositoryError>;

    /// Add `user_id` to the rating's voters if absent, then recount.
    async fn add_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError>;

    /// Remove `user_id` from the rating's voters if present, then recount.
    async fn remove_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError>;

    /// Whether `user_id` has marked the rating helpful.
    async fn has_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<bool, RatingRepositoryError>;
}

/// Fixture implementation for tests that do not exercise rating storage.
///
/// Lookups find nothing, writes are discarded, and recomputes see no
/// ratings.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRatingRepository;

#[async_trait]
impl RatingRepository for FixtureRatingRepository {
    async fn find_rating_by_id(
        &self,
        _rating_id: &RatingId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        Ok(None)
    }

    async fn find_rating_by_user_and_cafe(
        &self,
        _user_id: &UserId,
        _cafe_id: &CafeId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        Ok(None)
    }

    async fn find_ratings_by_cafe(
        &self,
        _cafe_id: &CafeId,
    ) -> Result<Vec<Rating>, RatingRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_ratings_by_cafe(
        &self,
        _cafe_id: &CafeId,
        _sort: ReviewSort,
        _offset: u64,
        _limit: u32,
    ) -> Result<RatingMatches, RatingRepositoryError> {
        Ok(RatingMatches::default())
    }

    async fn insert_rating(&self, _rating: &Rating) -> Result<(), RatingRepositoryError> {
        Ok(())
    }

    async fn update_rating(&self, _rating: &Rating) -> Result<(), RatingRepositoryError> {
        Ok(())
    }

    async fn delete_rating(&self, _rating_id: &RatingId) -> Result<bool, RatingRepositoryError> {
        Ok(false)
    }

    async fn recompute_cafe_aggregates(
        &self,
        _cafe_id: &CafeId,
        recompute: AggregateRecompute,
    ) -> Result<CafeRatingAggregates, RatingRepositoryError> {
        Ok(recompute(&[]))
    }

    async fn add_helpful_vote(
        &self,
        _rating_id: &RatingId,
        _user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        Ok(HelpfulVoteChange::default())
    }

    async fn remove_helpful_vote(
        &self,
        _rating_id: &RatingId,
        _user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        Ok(HelpfulVoteChange::default())
    }

    async fn has_helpful_vote(
        &self,
        _rating_id: &RatingId,
        _user_id: &UserId,
    ) -> Result<bool, RatingRepositoryError> {
        Ok(false)
    }
}
