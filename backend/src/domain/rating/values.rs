//! Validated value types carried by a rating.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{MAX_REVIEW_CHARS, RatingValidationError};

/// Star score between 1 and 5 inclusive.
///
/// # Examples
/// ```
/// use cafehub::domain::RatingScore;
///
/// assert!(RatingScore::new(0).is_err());
/// assert_eq!(RatingScore::new(4).map(RatingScore::get), Ok(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RatingScore(u8);

impl RatingScore {
    /// Lowest allowed score.
    pub const MIN: u8 = 1;
    /// Highest allowed score.
    pub const MAX: u8 = 5;

    /// Validate a score.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValidationError::ScoreOutOfRange`] outside `1..=5`.
    pub fn new(value: impl Into<i64>) -> Result<Self, RatingValidationError> {
        let value = value.into();
        u8::try_from(value)
            .ok()
            .filter(|score| (Self::MIN..=Self::MAX).contains(score))
            .map(Self)
            .ok_or(RatingValidationError::ScoreOutOfRange { value })
    }

    /// Raw score.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Score as a decimal for averaging.
    pub fn as_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl fmt::Display for RatingScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review body, trimmed and between 1 and 1000 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReviewText(String);

impl ReviewText {
    /// Trim and validate review text.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValidationError::EmptyReview`] or
    /// [`RatingValidationError::ReviewTooLong`].
    pub fn new(text: impl AsRef<str>) -> Result<Self, RatingValidationError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RatingValidationError::EmptyReview);
        }
        let actual = trimmed.chars().count();
        if actual > MAX_REVIEW_CHARS {
            return Err(RatingValidationError::ReviewTooLong {
                max: MAX_REVIEW_CHARS,
                actual,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Review body.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ReviewText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Optional per-aspect scores; either all four are given or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AspectRatings {
    /// Food quality.
    pub food: RatingScore,
    /// Service quality.
    pub service: RatingScore,
    /// Atmosphere.
    pub ambiance: RatingScore,
    /// Value for money.
    pub value: RatingScore,
}

impl AspectRatings {
    /// Validate four raw aspect scores.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValidationError::ScoreOutOfRange`] for the first score
    /// outside `1..=5`.
    pub fn try_new(
        food: i64,
        service: i64,
        ambiance: i64,
        value: i64,
    ) -> Result<Self, RatingValidationError> {
        Ok(Self {
            food: RatingScore::new(food)?,
            service: RatingScore::new(service)?,
            ambiance: RatingScore::new(ambiance)?,
            value: RatingScore::new(value)?,
        })
    }
}
