//! Aggregate maintainer: keeps a cafe's derived rating statistics in step
//! with its rating set, and serves read-only rating summaries.
//!
//! Recomputation always starts from the full score set, so it is idempotent
//! and safe to rerun after a partial failure. Votes never trigger it.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::{CafeRepository, RatingRepository};
use crate::domain::store_errors::{map_cafe_store_error, map_rating_store_error};
use crate::domain::{
    AspectRatings, Cafe, CafeId, CafeRatingAggregates, Error, RatingScore, round_average,
};

/// Mean of each aspect over the ratings that supplied aspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectSummary {
    /// Mean food score, `None` when no rating has aspects.
    pub food: Option<Decimal>,
    /// Mean service score.
    pub service: Option<Decimal>,
    /// Mean ambiance score.
    pub ambiance: Option<Decimal>,
    /// Mean value-for-money score.
    pub value: Option<Decimal>,
    /// Number of ratings that supplied aspects.
    pub sample_size: u32,
}

/// Count and share of ratings with one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBucket {
    /// Score between 1 and 5.
    pub score: u8,
    /// Ratings with this score.
    pub count: u32,
    /// Share of all ratings, rounded half-up to a whole percent.
    pub percentage: u32,
}

/// Histogram of scores, highest score first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RatingDistribution(Vec<ScoreBucket>);

impl RatingDistribution {
    /// Build the histogram for a score set.
    ///
    /// # Examples
    /// ```
    /// use cafehub::domain::{RatingDistribution, RatingScore};
    ///
    /// let scores = [5, 5, 4].map(|s| RatingScore::new(s).expect("valid score"));
    /// let distribution = RatingDistribution::from_scores(&scores);
    /// let five = distribution.bucket(5).expect("bucket for 5");
    /// assert_eq!((five.count, five.percentage), (2, 67));
    /// ```
    pub fn from_scores(scores: &[RatingScore]) -> Self {
        let total = u32::try_from(scores.len()).unwrap_or(u32::MAX);
        let buckets = (RatingScore::MIN..=RatingScore::MAX)
            .rev()
            .map(|score| {
                let count = scores.iter().filter(|s| s.get() == score).count();
                let count = u32::try_from(count).unwrap_or(u32::MAX);
                ScoreBucket {
                    score,
                    count,
                    percentage: rounded_percentage(count, total),
                }
            })
            .collect();
        Self(buckets)
    }

    /// Buckets from score 5 down to score 1.
    pub fn buckets(&self) -> &[ScoreBucket] {
        self.0.as_slice()
    }

    /// Bucket for one score.
    pub fn bucket(&self, score: u8) -> Option<&ScoreBucket> {
        self.0.iter().find(|bucket| bucket.score == score)
    }
}

fn rounded_percentage(count: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (count, total) = (u64::from(count), u64::from(total));
    let rounded = (count * 200 + total) / (total * 2);
    u32::try_from(rounded).unwrap_or(100)
}

/// Stored aggregates plus the score histogram for one cafe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// Average rating and rating count as stored on the cafe.
    pub aggregates: CafeRatingAggregates,
    /// Score histogram.
    pub distribution: RatingDistribution,
}

/// Service that recomputes and reports cafe rating statistics.
#[derive(Clone)]
pub struct RatingAggregateService<R, C> {
    ratings: Arc<R>,
    cafes: Arc<C>,
}

impl<R, C> RatingAggregateService<R, C> {
    /// Create a new service over the given stores.
    pub fn new(ratings: Arc<R>, cafes: Arc<C>) -> Self {
        Self { ratings, cafes }
    }
}

impl<R, C> RatingAggregateService<R, C>
where
    R: RatingRepository,
    C: CafeRepository,
{
    /// Recompute and store a cafe's average rating and rating count.
    ///
    /// Runs as one atomic unit in the store, serialized per cafe.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `cafe_not_found`, or `ServiceUnavailable`.
    pub async fn recompute_aggregates(
        &self,
        cafe_id: &CafeId,
    ) -> Result<CafeRatingAggregates, Error> {
        let aggregates = self
            .ratings
            .recompute_cafe_aggregates(cafe_id, CafeRatingAggregates::from_scores)
            .await
            .map_err(map_rating_store_error)?;
        info!(
            %cafe_id,
            average_rating = %aggregates.average_rating(),
            rating_count = aggregates.rating_count(),
            "recomputed cafe rating aggregates"
        );
        Ok(aggregates)
    }

    /// Per-aspect means over the ratings that supplied aspects.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `cafe_not_found`, or `ServiceUnavailable`.
    pub async fn aspect_summary(&self, cafe_id: &CafeId) -> Result<AspectSummary, Error> {
        self.require_cafe(cafe_id).await?;
        let ratings = self
            .ratings
            .find_ratings_by_cafe(cafe_id)
            .await
            .map_err(map_rating_store_error)?;
        let aspects: Vec<_> = ratings
            .iter()
            .filter_map(|rating| rating.aspects().copied())
            .collect();
        debug!(%cafe_id, sample_size = aspects.len(), "summarising rating aspects");

        let mean = |pick: fn(&AspectRatings) -> RatingScore| {
            round_average(aspects.iter().map(|aspect| pick(aspect).as_decimal()))
        };
        Ok(AspectSummary {
            food: mean(|aspect| aspect.food),
            service: mean(|aspect| aspect.service),
            ambiance: mean(|aspect| aspect.ambiance),
            value: mean(|aspect| aspect.value),
            sample_size: u32::try_from(aspects.len()).unwrap_or(u32::MAX),
        })
    }

    /// Stored aggregates plus the score histogram.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `cafe_not_found`, or `ServiceUnavailable`.
    pub async fn rating_summary(&self, cafe_id: &CafeId) -> Result<RatingSummary, Error> {
        let cafe = self.require_cafe(cafe_id).await?;
        let ratings = self
            .ratings
            .find_ratings_by_cafe(cafe_id)
            .await
            .map_err(map_rating_store_error)?;
        let scores: Vec<_> = ratings.iter().map(|rating| rating.score()).collect();
        debug!(%cafe_id, ratings = scores.len(), "summarising rating distribution");
        Ok(RatingSummary {
            aggregates: cafe.rating_aggregates(),
            distribution: RatingDistribution::from_scores(&scores),
        })
    }

    async fn require_cafe(&self, cafe_id: &CafeId) -> Result<Cafe, Error> {
        self.cafes
            .find_cafe_by_id(cafe_id)
            .await
            .map_err(map_cafe_store_error)?
            .ok_or_else(|| Error::cafe_not_found(cafe_id.to_string()))
    }
}

#[cfg(test)]
#[path = "rating_aggregates_tests.rs"]
mod tests;
