//! The cafe aggregate root.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::UserId;

use super::{
    Amenity, CafeId, CafeRatingAggregates, CafeValidationError, Contact, DayOfWeek, Location,
    MenuItem,
};

/// Price range a cafe advertises, in the listing currency.
///
/// ## Invariants
/// - `0 <= min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    min: Decimal,
    max: Decimal,
}

impl Budget {
    /// Validate and construct a budget range.
    ///
    /// # Errors
    ///
    /// Returns [`CafeValidationError::NegativeBudget`] or
    /// [`CafeValidationError::InvertedBudget`].
    ///
    /// # Examples
    /// ```
    /// use cafehub::domain::Budget;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(Budget::new(Decimal::from(5), Decimal::from(3)).is_err());
    /// ```
    pub fn new(min: Decimal, max: Decimal) -> Result<Self, CafeValidationError> {
        if min < Decimal::ZERO || max < Decimal::ZERO {
            return Err(CafeValidationError::NegativeBudget { min, max });
        }
        if min > max {
            return Err(CafeValidationError::InvertedBudget { min, max });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> Decimal {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Decimal {
        self.max
    }
}

/// Opening hours for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    open: Option<NaiveTime>,
    close: Option<NaiveTime>,
    is_closed: bool,
}

impl OperatingHours {
    /// Open between `open` and `close`.
    pub fn open(open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            open: Some(open),
            close: Some(close),
            is_closed: false,
        }
    }

    /// Closed all day.
    pub fn closed() -> Self {
        Self {
            open: None,
            close: None,
            is_closed: true,
        }
    }

    /// Rehydrate stored hours for `day`.
    ///
    /// # Errors
    ///
    /// Returns [`CafeValidationError::InconsistentHours`] unless the entry is
    /// either closed without times, or open with both times.
    pub fn from_parts(
        day: DayOfWeek,
        open: Option<NaiveTime>,
        close: Option<NaiveTime>,
        is_closed: bool,
    ) -> Result<Self, CafeValidationError> {
        match (open, close, is_closed) {
            (None, None, true) => Ok(Self::closed()),
            (Some(open), Some(close), false) => Ok(Self::open(open, close)),
            _ => Err(CafeValidationError::InconsistentHours { day }),
        }
    }

    /// Opening time, `None` when closed.
    pub fn opens_at(&self) -> Option<NaiveTime> {
        self.open
    }

    /// Closing time, `None` when closed.
    pub fn closes_at(&self) -> Option<NaiveTime> {
        self.close
    }

    /// Whether the cafe is closed all day.
    pub fn is_closed(&self) -> bool {
        self.is_closed
    }
}

/// Input payload for [`Cafe::new`].
///
/// `rating_aggregates` carries the stored derived values when an adapter
/// rehydrates a cafe; new listings start from
/// [`CafeRatingAggregates::empty`].
#[derive(Debug, Clone)]
pub struct CafeDraft {
    pub id: CafeId,
    pub name: String,
    pub description: String,
    pub owner_id: UserId,
    pub images: Vec<String>,
    pub location: Location,
    pub contact: Contact,
    pub menu: Vec<MenuItem>,
    pub amenities: BTreeSet<Amenity>,
    pub operating_hours: BTreeMap<DayOfWeek, OperatingHours>,
    pub budget: Budget,
    pub rating_aggregates: CafeRatingAggregates,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listed cafe with its menu and derived rating statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cafe {
    id: CafeId,
    name: String,
    description: String,
    owner_id: UserId,
    images: Vec<String>,
    location: Location,
    contact: Contact,
    menu: Vec<MenuItem>,
    amenities: BTreeSet<Amenity>,
    operating_hours: BTreeMap<DayOfWeek, OperatingHours>,
    budget: Budget,
    rating_aggregates: CafeRatingAggregates,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cafe {
    /// Validate and construct a cafe.
    ///
    /// # Errors
    ///
    /// Returns [`CafeValidationError`] for a blank name or city, or a menu
    /// that repeats an item id.
    pub fn new(draft: CafeDraft) -> Result<Self, CafeValidationError> {
        Self::try_from(draft)
    }

    /// Cafe identifier.
    pub fn id(&self) -> CafeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Owning user.
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    /// Image references in display order.
    pub fn images(&self) -> &[String] {
        self.images.as_slice()
    }

    /// Postal address and coordinates.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Contact channels.
    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    /// Menu in display order.
    pub fn menu(&self) -> &[MenuItem] {
        self.menu.as_slice()
    }

    /// Advertised amenities.
    pub fn amenities(&self) -> &BTreeSet<Amenity> {
        &self.amenities
    }

    /// Opening hours keyed by weekday.
    pub fn operating_hours(&self) -> &BTreeMap<DayOfWeek, OperatingHours> {
        &self.operating_hours
    }

    /// Price range.
    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Derived rating statistics.
    pub fn rating_aggregates(&self) -> CafeRatingAggregates {
        self.rating_aggregates
    }

    /// Whether the listing is visible in searches.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the derived aggregates after a recompute.
    pub(crate) fn set_rating_aggregates(&mut self, aggregates: CafeRatingAggregates) {
        self.rating_aggregates = aggregates;
    }
}

impl TryFrom<CafeDraft> for Cafe {
    type Error = CafeValidationError;

    fn try_from(draft: CafeDraft) -> Result<Self, Self::Error> {
        let CafeDraft {
            id,
            name,
            description,
            owner_id,
            images,
            location,
            contact,
            menu,
            amenities,
            operating_hours,
            budget,
            rating_aggregates,
            is_active,
            created_at,
            updated_at,
        } = draft;

        if name.trim().is_empty() {
            return Err(CafeValidationError::EmptyName);
        }
        if location.city.trim().is_empty() {
            return Err(CafeValidationError::EmptyCity);
        }
        let mut seen = HashSet::with_capacity(menu.len());
        if let Some(item) = menu.iter().find(|item| !seen.insert(item.id())) {
            return Err(CafeValidationError::DuplicateMenuItem { id: item.id() });
        }

        Ok(Self {
            id,
            name,
            description,
            owner_id,
            images,
            location,
            contact,
            menu,
            amenities,
            operating_hours,
            budget,
            rating_aggregates,
            is_active,
            created_at,
            updated_at,
        })
    }
}
