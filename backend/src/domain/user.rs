//! User data model.
//!
//! Users appear in this engine only as reference targets: rating authors,
//! helpful voters and cafe owners. Credentials are handled elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The identifier string was empty.
    #[error("user id must not be empty")]
    EmptyId,
    /// The identifier string was not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// The user name was blank.
    #[error("user name must not be empty")]
    EmptyName,
    /// The email address is not of the form `local@domain`.
    #[error("email must contain a local part and a domain")]
    InvalidEmail,
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError`] when the input is empty, padded with
    /// whitespace, or not a UUID.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Role a user plays in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Browses cafes and writes ratings.
    Customer,
    /// Lists and manages cafes.
    Owner,
}

impl UserRole {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Owner => "OWNER",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CUSTOMER" => Ok(Self::Customer),
            "OWNER" => Ok(Self::Owner),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique contact email.
    pub email: String,
    /// Directory role.
    pub role: UserRole,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional avatar image reference.
    pub avatar: Option<String>,
}

impl User {
    /// Validate and construct a user without optional contact details.
    ///
    /// # Errors
    ///
    /// Returns [`UserValidationError::EmptyName`] or
    /// [`UserValidationError::InvalidEmail`].
    ///
    /// # Examples
    /// ```
    /// use cafehub::domain::{User, UserId, UserRole};
    ///
    /// let user = User::try_new(UserId::random(), "Ada", "ada@example.com", UserRole::Customer)
    ///     .expect("valid user");
    /// assert_eq!(user.role, UserRole::Customer);
    /// ```
    pub fn try_new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Result<Self, UserValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        let email = email.into();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self {
            id,
            name,
            email,
            role,
            phone: None,
            avatar: None,
        })
    }
}
