//! Derived rating statistics stored on each cafe.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::rating::RatingScore;

/// Average rating and rating count for one cafe.
///
/// ## Invariants
/// - `rating_count` equals the number of ratings the cafe has.
/// - `average_rating` is the mean score rounded half-up to two decimals, or
///   zero when `rating_count` is zero.
///
/// # Examples
/// ```
/// use cafehub::domain::{CafeRatingAggregates, RatingScore};
/// use rust_decimal::Decimal;
///
/// let scores = [5, 5, 5, 3].map(|s| RatingScore::new(s).expect("valid score"));
/// let aggregates = CafeRatingAggregates::from_scores(&scores);
/// assert_eq!(aggregates.average_rating(), Decimal::new(450, 2));
/// assert_eq!(aggregates.rating_count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CafeRatingAggregates {
    average_rating: Decimal,
    rating_count: u32,
}

impl CafeRatingAggregates {
    /// Aggregates of a cafe with no ratings.
    pub fn empty() -> Self {
        Self {
            average_rating: Decimal::new(0, 2),
            rating_count: 0,
        }
    }

    /// Rehydrate stored aggregates.
    ///
    /// The average is normalised to two decimal places.
    pub fn new(average_rating: Decimal, rating_count: u32) -> Self {
        let mut average_rating =
            average_rating.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        average_rating.rescale(2);
        Self {
            average_rating,
            rating_count,
        }
    }

    /// Recompute aggregates from the full score set of a cafe.
    pub fn from_scores(scores: &[RatingScore]) -> Self {
        let Some(average_rating) = round_average(scores.iter().map(|score| score.as_decimal()))
        else {
            return Self::empty();
        };
        Self {
            average_rating,
            rating_count: u32::try_from(scores.len()).unwrap_or(u32::MAX),
        }
    }

    /// Mean score rounded to two decimals.
    pub fn average_rating(&self) -> Decimal {
        self.average_rating
    }

    /// Number of ratings the average covers.
    pub fn rating_count(&self) -> u32 {
        self.rating_count
    }
}

impl Default for CafeRatingAggregates {
    fn default() -> Self {
        Self::empty()
    }
}

/// Arithmetic mean rounded half-up to two decimals, `None` for no values.
pub fn round_average(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, count) = values
        .into_iter()
        .fold((Decimal::ZERO, 0_u32), |(sum, count), value| {
            (sum + value, count + 1)
        });
    if count == 0 {
        return None;
    }
    let mut mean = (sum / Decimal::from(count))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    mean.rescale(2);
    Some(mean)
}
