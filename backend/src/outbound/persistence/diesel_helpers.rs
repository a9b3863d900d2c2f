//! Shared helpers for Diesel repository implementations.
//!
//! This module provides common utilities for database access including:
//! - Message extraction from pool and Diesel errors
//! - Classification of constraint violations by constraint name
//! - `ILIKE` pattern escaping
//! - Checked conversions between database and domain integers

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, warn};

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Extract a readable message from a Diesel error and emit debug context.
pub fn map_diesel_error_message(error: &DieselError, operation: &str) -> String {
    let error_message = error.to_string();
    debug!(%error_message, %operation, "diesel operation failed");
    error_message
}

/// Whether the error means the connection itself is gone.
pub fn is_connection_error(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
            | DieselError::BrokenTransactionManager
    )
}

/// Constraint violations the rating adapter turns into domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// `ratings_user_id_cafe_id_key`: the user already rated the cafe.
    DuplicateRating,
    /// A rating referenced a cafe that does not exist.
    MissingCafe,
    /// A rating or vote referenced a user that does not exist.
    MissingUser,
    /// A vote referenced a rating that does not exist.
    MissingRating,
}

const CONSTRAINTS: [(&str, ConstraintViolation); 5] = [
    ("ratings_user_id_cafe_id_key", ConstraintViolation::DuplicateRating),
    ("ratings_cafe_id_fkey", ConstraintViolation::MissingCafe),
    ("ratings_user_id_fkey", ConstraintViolation::MissingUser),
    ("rating_helpful_votes_user_id_fkey", ConstraintViolation::MissingUser),
    ("rating_helpful_votes_rating_id_fkey", ConstraintViolation::MissingRating),
];

/// Classify a unique or foreign key violation by constraint name.
///
/// Falls back to the message when the driver does not report the
/// constraint name. Unrecognised violations are logged and yield `None`.
pub fn classify_violation(error: &DieselError) -> Option<ConstraintViolation> {
    let DieselError::DatabaseError(kind, info) = error else {
        return None;
    };
    if !matches!(
        kind,
        DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation
    ) {
        return None;
    }
    let constraint = info.constraint_name();
    let message = info.message();
    let found = CONSTRAINTS.iter().find_map(|(name, violation)| {
        let named = constraint.is_some_and(|c| c == *name) || message.contains(name);
        named.then_some(*violation)
    });
    if found.is_none() {
        warn!(
            message,
            constraint_name = ?constraint,
            "unrecognised constraint violation - may need specific error mapping"
        );
    }
    found
}

/// Escape `%`, `_` and `\` so `needle` matches literally under `ILIKE`.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `ILIKE` pattern matching `needle` anywhere in the column.
pub fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(needle))
}

/// Convert a row count from the database.
pub fn count_from_db(count: i64, column: &str) -> Result<u64, String> {
    u64::try_from(count).map_err(|_| format!("negative {column} in database: {count}"))
}

/// Convert a window offset for the database.
pub fn offset_for_db(offset: u64) -> Result<i64, String> {
    i64::try_from(offset).map_err(|_| format!("offset {offset} exceeds i64 range"))
}
