//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed cafe, rating and user model, and the
//! services that search cafes and keep rating aggregates consistent. Types
//! are immutable outside their constructors and mutators; each documents its
//! invariants in Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic error payload.
//! - Cafe / Rating / User: entities with validated constructors.
//! - CafeSearchService: filtered, paginated cafe search.
//! - RatingCommandService: rating submit/update/delete/list.
//! - RatingAggregateService: aggregate recompute and summaries.
//! - HelpfulVoteService: helpful-vote bookkeeping.

pub mod cafe;
pub mod error;
mod helpful_votes;
pub mod identifier;
pub mod ports;
pub mod rating;
mod rating_aggregates;
mod ratings;
pub mod search;
mod store_errors;
pub mod user;

pub use self::cafe::{
    Amenity, Budget, Cafe, CafeDraft, CafeId, CafeRatingAggregates, CafeValidationError, Contact,
    Coordinates, DayOfWeek, Location, MenuCategory, MenuItem, MenuItemDraft, MenuItemId,
    OperatingHours, ParseCafeEnumError, round_average,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::helpful_votes::{HelpfulVoteOutcome, HelpfulVoteService};
pub use self::identifier::ParseIdError;
pub use self::rating::{
    AspectRatings, MAX_REVIEW_CHARS, Rating, RatingDraft, RatingId, RatingScore,
    RatingValidationError, ReviewText,
};
pub use self::rating_aggregates::{
    AspectSummary, RatingAggregateService, RatingDistribution, RatingSummary, ScoreBucket,
};
pub use self::ratings::{
    AspectInput, RatingCommandService, RatingReceipt, ReviewSort, SubmitRating, UpdateRating,
};
pub use self::search::{
    BoundingBox, CafePredicate, CafeQuery, CafeSearchRequest, CafeSearchService, Criterion,
    NearbyArea, SortMode,
};
pub use self::user::{User, UserId, UserRole, UserValidationError};

/// Result alias for domain operations.
///
/// # Examples
/// ```
/// use cafehub::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<u32> {
///     Err(Error::not_found("no such cafe"))
/// }
///
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
