//! Where a cafe is and how to reach it.

use serde::Serialize;

use super::CafeValidationError;

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and construct coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CafeValidationError::CoordinatesOutOfRange`] for non-finite
    /// values, `|latitude| > 90` or `|longitude| > 180`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CafeValidationError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > 90.0
            || longitude.abs() > 180.0
        {
            return Err(CafeValidationError::CoordinatesOutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Postal address plus map position.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Street address.
    pub address: String,
    /// City name; searched by substring.
    pub city: String,
    /// State or region; searched by substring.
    pub state: String,
    /// Postal code.
    pub zip_code: String,
    /// Map position, `0/0` when unknown.
    pub coordinates: Coordinates,
}

/// Contact channels for a cafe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    /// Phone number.
    pub phone: String,
    /// Contact email.
    pub email: String,
    /// Optional website URL.
    pub website: Option<String>,
}
