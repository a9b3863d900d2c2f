//! Rating write path: submit, revise, delete and list ratings.
//!
//! Every change to the set of scores of a cafe is followed by an explicit
//! aggregate recompute. If the recompute fails after the write committed,
//! the error is returned to the caller; rerunning the recompute repairs the
//! aggregates because it always starts from the full score set.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use pagination::{DEFAULT_MAX_PAGE_SIZE, Page};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ports::{CafeRepository, RatingRepository};
use crate::domain::search::page_request;
use crate::domain::store_errors::{map_cafe_store_error, map_rating_store_error};
use crate::domain::{
    AspectRatings, CafeId, CafeRatingAggregates, Error, Rating, RatingAggregateService,
    RatingDraft, RatingId, RatingScore, RatingValidationError, ReviewText, UserId,
};

/// Order for a cafe's rating listing; ties break on id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewSort {
    /// Most recent first, then id desc.
    #[default]
    Newest,
    /// Oldest first, then id asc.
    Oldest,
    /// Highest score first, then id asc.
    Highest,
    /// Lowest score first, then id asc.
    Lowest,
    /// Most helpful votes first, then id asc.
    MostHelpful,
}

impl ReviewSort {
    /// Total order over ratings for this mode.
    pub fn compare(self, left: &Rating, right: &Rating) -> Ordering {
        match self {
            Self::Newest => right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id())),
            Self::Oldest => left
                .created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(&right.id())),
            Self::Highest => right
                .score()
                .cmp(&left.score())
                .then_with(|| left.id().cmp(&right.id())),
            Self::Lowest => left
                .score()
                .cmp(&right.score())
                .then_with(|| left.id().cmp(&right.id())),
            Self::MostHelpful => right
                .helpful_count()
                .cmp(&left.helpful_count())
                .then_with(|| left.id().cmp(&right.id())),
        }
    }
}

/// Raw aspect scores as submitted; validated into [`AspectRatings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectInput {
    /// Food score.
    pub food: i64,
    /// Service score.
    pub service: i64,
    /// Ambiance score.
    pub ambiance: i64,
    /// Value-for-money score.
    pub value: i64,
}

/// Request to rate a cafe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRating {
    /// Author of the rating.
    pub user_id: UserId,
    /// Cafe being rated.
    pub cafe_id: CafeId,
    /// Overall score, 1 to 5.
    pub score: i64,
    /// Review body.
    pub review: String,
    /// Optional per-aspect scores.
    pub aspects: Option<AspectInput>,
}

/// Request to revise an existing rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRating {
    /// Rating to revise.
    pub rating_id: RatingId,
    /// Caller; must be the rating's author.
    pub requester: UserId,
    /// New overall score, 1 to 5.
    pub score: i64,
    /// New review body.
    pub review: String,
    /// Replaces stored aspects when present; stored aspects are kept
    /// otherwise.
    pub aspects: Option<AspectInput>,
}

/// A stored rating together with the cafe aggregates after the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingReceipt {
    /// The stored rating.
    pub rating: Rating,
    /// Aggregates recomputed from the stored rating set after the write.
    pub aggregates: CafeRatingAggregates,
}

/// Service for rating mutations and listings.
#[derive(Clone)]
pub struct RatingCommandService<R, C> {
    ratings: Arc<R>,
    cafes: Arc<C>,
    aggregates: RatingAggregateService<R, C>,
    clock: Arc<dyn Clock>,
    max_page_size: u32,
}

impl<R, C> RatingCommandService<R, C> {
    /// Create a new service over the given stores.
    pub fn new(ratings: Arc<R>, cafes: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            aggregates: RatingAggregateService::new(Arc::clone(&ratings), Arc::clone(&cafes)),
            ratings,
            cafes,
            clock,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Override the page size ceiling for listings.
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }
}

fn invalid(error: &RatingValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

fn validate_aspects(input: Option<AspectInput>) -> Result<Option<AspectRatings>, Error> {
    input
        .map(|aspects| {
            AspectRatings::try_new(aspects.food, aspects.service, aspects.ambiance, aspects.value)
                .map_err(|err| invalid(&err))
        })
        .transpose()
}

impl<R, C> RatingCommandService<R, C>
where
    R: RatingRepository,
    C: CafeRepository,
{
    /// Rate a cafe and refresh its aggregates.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a bad score, review or aspect score.
    /// - `NotFound` with reason `cafe_not_found` or `user_not_found`.
    /// - `Conflict` with reason `duplicate_rating` when the user already
    ///   rated the cafe.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn submit_rating(&self, request: SubmitRating) -> Result<RatingReceipt, Error> {
        let SubmitRating {
            user_id,
            cafe_id,
            score,
            review,
            aspects,
        } = request;
        let score = RatingScore::new(score).map_err(|err| invalid(&err))?;
        let review = ReviewText::new(review).map_err(|err| invalid(&err))?;
        let aspects = validate_aspects(aspects)?;

        self.require_cafe(&cafe_id).await?;
        let existing = self
            .ratings
            .find_rating_by_user_and_cafe(&user_id, &cafe_id)
            .await
            .map_err(map_rating_store_error)?;
        if existing.is_some() {
            return Err(Error::duplicate_rating(
                user_id.to_string(),
                cafe_id.to_string(),
            ));
        }

        let now = self.clock.utc();
        let rating = Rating::new(RatingDraft {
            id: RatingId::random(),
            user_id,
            cafe_id,
            score,
            review,
            aspects,
            helpful_voters: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        });
        self.ratings
            .insert_rating(&rating)
            .await
            .map_err(map_rating_store_error)?;
        info!(rating_id = %rating.id(), %cafe_id, score = %rating.score(), "rating submitted");

        let aggregates = self.aggregates.recompute_aggregates(&cafe_id).await?;
        Ok(RatingReceipt { rating, aggregates })
    }

    /// Revise a rating; only its author may do so.
    ///
    /// Aggregates are recomputed after every revision, whatever score this
    /// caller last read.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a bad score, review or aspect score.
    /// - `NotFound` with reason `rating_not_found`.
    /// - `Forbidden` with reason `not_rating_author`.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn update_rating(&self, request: UpdateRating) -> Result<RatingReceipt, Error> {
        let UpdateRating {
            rating_id,
            requester,
            score,
            review,
            aspects,
        } = request;
        let score = RatingScore::new(score).map_err(|err| invalid(&err))?;
        let review = ReviewText::new(review).map_err(|err| invalid(&err))?;
        let aspects = validate_aspects(aspects)?;

        let mut rating = self.require_authored_rating(&rating_id, &requester).await?;
        let score_changed = rating.revise(score, review, aspects, self.clock.utc());
        self.ratings
            .update_rating(&rating)
            .await
            .map_err(map_rating_store_error)?;
        info!(%rating_id, score_changed, "rating updated");

        let aggregates = self.aggregates.recompute_aggregates(&rating.cafe_id()).await?;
        Ok(RatingReceipt { rating, aggregates })
    }

    /// Delete a rating; only its author may do so.
    ///
    /// Returns the cafe's aggregates after the delete.
    ///
    /// # Errors
    ///
    /// - `NotFound` with reason `rating_not_found`.
    /// - `Forbidden` with reason `not_rating_author`.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn delete_rating(
        &self,
        rating_id: &RatingId,
        requester: &UserId,
    ) -> Result<CafeRatingAggregates, Error> {
        let rating = self.require_authored_rating(rating_id, requester).await?;
        let deleted = self
            .ratings
            .delete_rating(rating_id)
            .await
            .map_err(map_rating_store_error)?;
        if !deleted {
            return Err(Error::rating_not_found(rating_id.to_string()));
        }
        info!(%rating_id, cafe_id = %rating.cafe_id(), "rating deleted");
        self.aggregates
            .recompute_aggregates(&rating.cafe_id())
            .await
    }

    /// One page of a cafe's ratings.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` with reason `invalid_pagination`.
    /// - `NotFound` with reason `cafe_not_found`.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn list_cafe_ratings(
        &self,
        cafe_id: &CafeId,
        sort: ReviewSort,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Rating>, Error> {
        let paging = page_request(page, page_size, self.max_page_size)?;
        self.require_cafe(cafe_id).await?;
        debug!(%cafe_id, ?sort, page = paging.page(), "listing cafe ratings");
        let matches = self
            .ratings
            .list_ratings_by_cafe(cafe_id, sort, paging.offset(), paging.limit())
            .await
            .map_err(map_rating_store_error)?;
        Ok(Page::from_window(matches.ratings, paging, matches.total_count))
    }

    /// The rating `user_id` wrote for `cafe_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `rating_not_found`, or `ServiceUnavailable`.
    pub async fn find_user_rating(
        &self,
        user_id: &UserId,
        cafe_id: &CafeId,
    ) -> Result<Rating, Error> {
        self.ratings
            .find_rating_by_user_and_cafe(user_id, cafe_id)
            .await
            .map_err(map_rating_store_error)?
            .ok_or_else(|| {
                Error::not_found("user has not rated this cafe").with_details(serde_json::json!({
                    "code": "rating_not_found",
                    "userId": user_id.to_string(),
                    "cafeId": cafe_id.to_string(),
                }))
            })
    }

    async fn require_cafe(&self, cafe_id: &CafeId) -> Result<(), Error> {
        self.cafes
            .find_cafe_by_id(cafe_id)
            .await
            .map_err(map_cafe_store_error)?
            .map(|_| ())
            .ok_or_else(|| Error::cafe_not_found(cafe_id.to_string()))
    }

    async fn require_authored_rating(
        &self,
        rating_id: &RatingId,
        requester: &UserId,
    ) -> Result<Rating, Error> {
        let rating = self
            .ratings
            .find_rating_by_id(rating_id)
            .await
            .map_err(map_rating_store_error)?
            .ok_or_else(|| Error::rating_not_found(rating_id.to_string()))?;
        if !rating.is_authored_by(requester) {
            return Err(Error::not_rating_author(rating_id.to_string()));
        }
        Ok(rating)
    }
}

#[cfg(test)]
#[path = "ratings_tests.rs"]
mod tests;
