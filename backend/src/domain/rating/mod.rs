//! Rating domain types.
//!
//! A [`Rating`] is one user's scored review of one cafe. Its helpful-vote
//! set and the derived `helpful_count` change together; callers cannot
//! reach one without the other.

mod entity;
mod values;

pub use entity::{Rating, RatingDraft};
pub use values::{AspectRatings, RatingScore, ReviewText};

use super::identifier::uuid_identifier;

uuid_identifier!(
    /// Stable rating identifier.
    RatingId,
    "rating"
);

/// Maximum review length in characters, after trimming.
pub const MAX_REVIEW_CHARS: usize = 1000;

/// Validation errors raised by rating constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingValidationError {
    /// A score fell outside `1..=5`.
    #[error("rating score must be between 1 and 5 (got {value})")]
    ScoreOutOfRange {
        /// Rejected score.
        value: i64,
    },
    /// The review was blank once trimmed.
    #[error("review must not be empty")]
    EmptyReview,
    /// The review exceeded the length limit.
    #[error("review must be at most {max} characters (got {actual})")]
    ReviewTooLong {
        /// Maximum length allowed.
        max: usize,
        /// Trimmed length supplied.
        actual: usize,
    },
}
