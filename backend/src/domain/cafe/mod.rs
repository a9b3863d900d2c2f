//! Cafe listing domain types.
//!
//! A [`Cafe`] owns its menu, amenities and opening hours. Its rating
//! aggregates are derived data: they are rehydrated from the store and only
//! ever rewritten by the rating aggregate service.

mod aggregates;
mod entity;
mod enums;
mod location;
mod menu;

pub use aggregates::{CafeRatingAggregates, round_average};
pub use entity::{Budget, Cafe, CafeDraft, OperatingHours};
pub use enums::{Amenity, DayOfWeek, MenuCategory, ParseCafeEnumError};
pub use location::{Contact, Coordinates, Location};
pub use menu::{MenuItem, MenuItemDraft};

use rust_decimal::Decimal;

use super::identifier::uuid_identifier;

uuid_identifier!(
    /// Stable cafe identifier.
    CafeId,
    "cafe"
);

uuid_identifier!(
    /// Stable menu item identifier.
    MenuItemId,
    "menu item"
);

/// Validation errors raised by cafe constructors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CafeValidationError {
    /// The cafe name was blank.
    #[error("cafe name must not be empty")]
    EmptyName,
    /// The city was blank.
    #[error("cafe city must not be empty")]
    EmptyCity,
    /// Latitude or longitude outside the valid range.
    #[error("coordinates out of range: latitude {latitude}, longitude {longitude}")]
    CoordinatesOutOfRange {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },
    /// A budget bound was negative.
    #[error("budget bounds must be non-negative (min {min}, max {max})")]
    NegativeBudget {
        /// Rejected lower bound.
        min: Decimal,
        /// Rejected upper bound.
        max: Decimal,
    },
    /// The budget lower bound exceeded the upper bound.
    #[error("budget min {min} must not exceed max {max}")]
    InvertedBudget {
        /// Rejected lower bound.
        min: Decimal,
        /// Rejected upper bound.
        max: Decimal,
    },
    /// Opening hours were inconsistent with the closed flag.
    #[error("opening hours for {day} must be closed or carry both times")]
    InconsistentHours {
        /// Day with the inconsistent entry.
        day: DayOfWeek,
    },
    /// A menu item name was blank.
    #[error("menu item name must not be empty")]
    EmptyMenuItemName,
    /// A menu item price was negative.
    #[error("menu item price must be non-negative (got {price})")]
    NegativePrice {
        /// Rejected price.
        price: Decimal,
    },
    /// The same menu item id appeared twice.
    #[error("cafe menu has duplicate item id {id}")]
    DuplicateMenuItem {
        /// Repeated identifier.
        id: MenuItemId,
    },
}
