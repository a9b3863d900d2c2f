//! Mapping from store port errors onto domain errors.
//!
//! Connection and query failures surface as `store_unavailable` with the
//! adapter message unchanged; they are never turned into empty results.

use crate::domain::Error;
use crate::domain::ports::{CafeRepositoryError, RatingRepositoryError};

pub(crate) fn map_cafe_store_error(error: CafeRepositoryError) -> Error {
    match error {
        CafeRepositoryError::Connection { .. } | CafeRepositoryError::Query { .. } => {
            Error::store_unavailable(error.to_string())
        }
    }
}

pub(crate) fn map_rating_store_error(error: RatingRepositoryError) -> Error {
    match error {
        RatingRepositoryError::Connection { .. } | RatingRepositoryError::Query { .. } => {
            Error::store_unavailable(error.to_string())
        }
        RatingRepositoryError::DuplicateRating { user_id, cafe_id } => {
            Error::duplicate_rating(user_id, cafe_id)
        }
        RatingRepositoryError::CafeNotFound { cafe_id } => Error::cafe_not_found(cafe_id),
        RatingRepositoryError::RatingNotFound { rating_id } => Error::rating_not_found(rating_id),
        RatingRepositoryError::UserNotFound { user_id } => Error::user_not_found(user_id),
    }
}
