//! Filter compiler: turns a search request into a store-independent query.
//!
//! A [`CafeQuery`] is a conjunction of [`Criterion`]s plus a [`SortMode`].
//! [`CafePredicate::matches`] and [`SortMode::compare`] are the reference
//! semantics every store adapter must reproduce.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Amenity, Cafe, Coordinates, Error};

/// Structured search request. Every field is independently optional.
///
/// Blank strings are treated as absent. An empty amenity set adds no
/// constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CafeSearchRequest {
    /// Case-insensitive substring of the city.
    pub city: Option<String>,
    /// Case-insensitive substring of the state.
    pub state: Option<String>,
    /// Lower bound on the cafe's minimum budget.
    pub min_budget: Option<Decimal>,
    /// Upper bound on the cafe's maximum budget.
    pub max_budget: Option<Decimal>,
    /// Case-insensitive substring of name, description or city.
    pub term: Option<String>,
    /// Amenities the cafe must all offer.
    pub amenities: BTreeSet<Amenity>,
    /// Bounding box around a centre point.
    pub near: Option<NearbyArea>,
    /// Result order.
    pub sort: SortMode,
}

/// Centre point plus half-widths of a bounding box, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyArea {
    /// Centre latitude.
    pub latitude: f64,
    /// Centre longitude.
    pub longitude: f64,
    /// Maximum latitude distance from the centre.
    pub latitude_range: f64,
    /// Maximum longitude distance from the centre.
    pub longitude_range: f64,
}

/// Validated bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    centre: Coordinates,
    latitude_range: f64,
    longitude_range: f64,
}

impl BoundingBox {
    /// Centre of the box.
    pub fn centre(&self) -> Coordinates {
        self.centre
    }

    /// Latitude half-width.
    pub fn latitude_range(&self) -> f64 {
        self.latitude_range
    }

    /// Longitude half-width.
    pub fn longitude_range(&self) -> f64 {
        self.longitude_range
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Coordinates) -> bool {
        (point.latitude() - self.centre.latitude()).abs() <= self.latitude_range
            && (point.longitude() - self.centre.longitude()).abs() <= self.longitude_range
    }
}

impl TryFrom<NearbyArea> for BoundingBox {
    type Error = Error;

    fn try_from(area: NearbyArea) -> Result<Self, Self::Error> {
        let centre = Coordinates::new(area.latitude, area.longitude)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        for (name, range) in [
            ("latitude", area.latitude_range),
            ("longitude", area.longitude_range),
        ] {
            if !range.is_finite() || range < 0.0 {
                return Err(Error::invalid_request(format!(
                    "{name} range must be finite and non-negative (got {range})"
                )));
            }
        }
        Ok(Self {
            centre,
            latitude_range: area.latitude_range,
            longitude_range: area.longitude_range,
        })
    }
}

/// One conjunct of a [`CafePredicate`].
///
/// Substring needles are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// The listing is active.
    Active,
    /// City contains the needle.
    CityContains(String),
    /// State contains the needle.
    StateContains(String),
    /// Stored minimum budget is at least this value.
    MinBudgetAtLeast(Decimal),
    /// Stored maximum budget is at most this value.
    MaxBudgetAtMost(Decimal),
    /// Name, description or city contains the needle.
    TermMatches(String),
    /// The cafe offers this amenity.
    HasAmenity(Amenity),
    /// Coordinates fall inside the box.
    WithinBox(BoundingBox),
}

impl Criterion {
    /// Evaluate this criterion against one cafe.
    pub fn matches(&self, cafe: &Cafe) -> bool {
        match self {
            Self::Active => cafe.is_active(),
            Self::CityContains(needle) => contains_folded(&cafe.location().city, needle),
            Self::StateContains(needle) => contains_folded(&cafe.location().state, needle),
            Self::MinBudgetAtLeast(min) => cafe.budget().min() >= *min,
            Self::MaxBudgetAtMost(max) => cafe.budget().max() <= *max,
            Self::TermMatches(needle) => {
                contains_folded(cafe.name(), needle)
                    || contains_folded(cafe.description(), needle)
                    || contains_folded(&cafe.location().city, needle)
            }
            Self::HasAmenity(amenity) => cafe.amenities().contains(amenity),
            Self::WithinBox(area) => area.contains(cafe.location().coordinates),
        }
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Conjunction of criteria; always includes [`Criterion::Active`].
#[derive(Debug, Clone, PartialEq)]
pub struct CafePredicate {
    criteria: Vec<Criterion>,
}

impl CafePredicate {
    /// Criteria in evaluation order.
    pub fn criteria(&self) -> &[Criterion] {
        self.criteria.as_slice()
    }

    /// Whether every criterion holds for `cafe`.
    pub fn matches(&self, cafe: &Cafe) -> bool {
        self.criteria.iter().all(|criterion| criterion.matches(cafe))
    }
}

/// Result order for cafe searches.
///
/// Every mode ends with an id tie-break so the order is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Average rating desc, then rating count desc, then id asc.
    TopRated,
    /// Creation time desc, then id desc.
    Newest,
    /// Id asc.
    #[default]
    Default,
    /// Minimum budget asc, then id asc.
    BudgetLowest,
    /// Maximum budget desc, then id asc.
    BudgetHighest,
}

impl SortMode {
    /// Total order over cafes for this mode.
    pub fn compare(self, left: &Cafe, right: &Cafe) -> Ordering {
        match self {
            Self::TopRated => {
                let (l, r) = (left.rating_aggregates(), right.rating_aggregates());
                r.average_rating()
                    .cmp(&l.average_rating())
                    .then_with(|| r.rating_count().cmp(&l.rating_count()))
                    .then_with(|| left.id().cmp(&right.id()))
            }
            Self::Newest => right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id())),
            Self::Default => left.id().cmp(&right.id()),
            Self::BudgetLowest => left
                .budget()
                .min()
                .cmp(&right.budget().min())
                .then_with(|| left.id().cmp(&right.id())),
            Self::BudgetHighest => right
                .budget()
                .max()
                .cmp(&left.budget().max())
                .then_with(|| left.id().cmp(&right.id())),
        }
    }
}

/// Compiled, store-independent search query.
#[derive(Debug, Clone, PartialEq)]
pub struct CafeQuery {
    /// Filter to apply.
    pub predicate: CafePredicate,
    /// Order to return matches in.
    pub sort: SortMode,
}

impl CafeSearchRequest {
    /// Validate the request and compile it into a [`CafeQuery`].
    ///
    /// # Errors
    ///
    /// Returns an `InvalidRequest` [`Error`] for a negative budget bound,
    /// `min_budget > max_budget`, or an invalid bounding box.
    ///
    /// # Examples
    /// ```
    /// use cafehub::domain::{CafeSearchRequest, Criterion};
    ///
    /// let request = CafeSearchRequest {
    ///     city: Some("  ".to_owned()),
    ///     ..CafeSearchRequest::default()
    /// };
    /// let query = request.compile().expect("blank city is ignored");
    /// assert_eq!(query.predicate.criteria(), &[Criterion::Active]);
    /// ```
    pub fn compile(&self) -> Result<CafeQuery, Error> {
        let mut criteria = vec![Criterion::Active];

        if let Some(city) = folded_needle(self.city.as_deref()) {
            criteria.push(Criterion::CityContains(city));
        }
        if let Some(state) = folded_needle(self.state.as_deref()) {
            criteria.push(Criterion::StateContains(state));
        }

        for (name, bound) in [("min", self.min_budget), ("max", self.max_budget)] {
            if let Some(value) = bound.filter(|value| *value < Decimal::ZERO) {
                return Err(Error::invalid_request(format!(
                    "{name} budget must be non-negative (got {value})"
                )));
            }
        }
        if let Some((min, max)) = self
            .min_budget
            .zip(self.max_budget)
            .filter(|(min, max)| min > max)
        {
            return Err(Error::invalid_request(format!(
                "min budget {min} must not exceed max budget {max}"
            )));
        }
        if let Some(min) = self.min_budget {
            criteria.push(Criterion::MinBudgetAtLeast(min));
        }
        if let Some(max) = self.max_budget {
            criteria.push(Criterion::MaxBudgetAtMost(max));
        }

        if let Some(term) = folded_needle(self.term.as_deref()) {
            criteria.push(Criterion::TermMatches(term));
        }
        criteria.extend(self.amenities.iter().copied().map(Criterion::HasAmenity));
        if let Some(area) = self.near {
            criteria.push(Criterion::WithinBox(BoundingBox::try_from(area)?));
        }

        Ok(CafeQuery {
            predicate: CafePredicate { criteria },
            sort: self.sort,
        })
    }
}

fn folded_needle(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_lowercase)
}
