//! Domain-level error types.
//!
//! These errors are transport agnostic. The controller layer maps them to
//! HTTP responses or any other protocol-specific envelope; the `details`
//! payload carries a machine-readable `code` naming the precise reason.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The caller may not perform this action on the resource.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with existing state.
    Conflict,
    /// The backing store could not serve the request.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use cafehub::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("cafe not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace only.
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error, panicking if validation fails.
    ///
    /// # Panics
    ///
    /// Panics when `message` is blank. Every constructor in this crate passes
    /// a literal or formatted non-empty message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message content.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorValidationError::EmptyMessage`] for blank messages.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// The `code` entry of the details payload, naming the precise reason.
    ///
    /// # Examples
    /// ```
    /// use cafehub::domain::Error;
    ///
    /// let err = Error::self_vote_denied();
    /// assert_eq!(err.reason(), Some("self_vote_denied"));
    /// ```
    pub fn reason(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("code"))
            .and_then(Value::as_str)
    }

    /// Attach structured details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The store failed; the adapter message is kept verbatim.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::service_unavailable(message).with_details(json!({ "code": "store_unavailable" }))
    }

    /// Paging parameters were rejected before the store was touched.
    pub fn invalid_pagination(message: impl Into<String>) -> Self {
        Self::invalid_request(message).with_details(json!({ "code": "invalid_pagination" }))
    }

    /// A user tried to mark their own rating as helpful.
    pub fn self_vote_denied() -> Self {
        Self::conflict("users cannot mark their own rating as helpful")
            .with_details(json!({ "code": "self_vote_denied" }))
    }

    /// Only the author may change or delete a rating.
    pub fn not_rating_author(rating_id: impl Into<String>) -> Self {
        Self::forbidden("only the author may modify this rating").with_details(json!({
            "code": "not_rating_author",
            "ratingId": rating_id.into(),
        }))
    }

    /// The user has already rated this cafe.
    pub fn duplicate_rating(user_id: impl Into<String>, cafe_id: impl Into<String>) -> Self {
        Self::conflict("user has already rated this cafe").with_details(json!({
            "code": "duplicate_rating",
            "userId": user_id.into(),
            "cafeId": cafe_id.into(),
        }))
    }

    /// The referenced cafe does not exist.
    pub fn cafe_not_found(cafe_id: impl Into<String>) -> Self {
        Self::not_found("cafe not found").with_details(json!({
            "code": "cafe_not_found",
            "cafeId": cafe_id.into(),
        }))
    }

    /// The referenced rating does not exist.
    pub fn rating_not_found(rating_id: impl Into<String>) -> Self {
        Self::not_found("rating not found").with_details(json!({
            "code": "rating_not_found",
            "ratingId": rating_id.into(),
        }))
    }

    /// The referenced user does not exist.
    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::not_found("user not found").with_details(json!({
            "code": "user_not_found",
            "userId": user_id.into(),
        }))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}
