//! Test utilities for the cafehub crate.
//!
//! Shared by unit tests in `src/` and integration tests in `tests/`. Only
//! compiled for tests or with the `test-support` feature.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    Amenity, AspectRatings, Budget, Cafe, CafeDraft, CafeId, CafeRatingAggregates,
    CafeValidationError, Contact, Coordinates, Location, Rating, RatingDraft, RatingId,
    RatingScore, ReviewText, User, UserId, UserRole,
};

/// Fixed instant used as the default creation time of fixtures.
pub fn fixture_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

/// Build a customer with a random id.
///
/// # Panics
///
/// Panics when `name` is blank.
pub fn sample_user(name: &str) -> User {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    match User::try_new(UserId::random(), name, email, UserRole::Customer) {
        Ok(user) => user,
        Err(err) => panic!("invalid user fixture: {err}"),
    }
}

/// Build a rating of `score` by `user_id` for `cafe_id`.
///
/// # Panics
///
/// Panics when `score` is outside `1..=5`.
pub fn sample_rating(cafe_id: CafeId, user_id: UserId, score: u8) -> Rating {
    sample_rating_with_aspects(cafe_id, user_id, score, None)
}

/// Build a rating carrying optional aspect scores.
///
/// # Panics
///
/// Panics when `score` is outside `1..=5`.
pub fn sample_rating_with_aspects(
    cafe_id: CafeId,
    user_id: UserId,
    score: u8,
    aspects: Option<AspectRatings>,
) -> Rating {
    let score = match RatingScore::new(score) {
        Ok(score) => score,
        Err(err) => panic!("invalid rating fixture: {err}"),
    };
    let review = match ReviewText::new(format!("Rated {score} out of 5")) {
        Ok(review) => review,
        Err(err) => panic!("invalid rating fixture: {err}"),
    };
    Rating::new(RatingDraft {
        id: RatingId::random(),
        user_id,
        cafe_id,
        score,
        review,
        aspects,
        helpful_voters: BTreeSet::new(),
        created_at: fixture_epoch(),
        updated_at: fixture_epoch(),
    })
}

/// Builder for cafe fixtures with sensible defaults.
///
/// Defaults: active, in Austin TX at `0/0`, budget 5..20, no amenities,
/// no ratings, created at [`fixture_epoch`].
///
/// # Examples
/// ```
/// use cafehub::domain::Amenity;
/// use cafehub::test_support::CafeBuilder;
///
/// let cafe = CafeBuilder::new("Bean There").amenity(Amenity::Wifi).build();
/// assert_eq!(cafe.location().city, "Austin");
/// ```
#[derive(Debug, Clone)]
pub struct CafeBuilder {
    draft: CafeDraft,
    budget: (Decimal, Decimal),
    coordinates: (f64, f64),
}

impl CafeBuilder {
    /// Start a fixture named `name`.
    pub fn new(name: &str) -> Self {
        let created_at = fixture_epoch();
        Self {
            draft: CafeDraft {
                id: CafeId::random(),
                name: name.to_owned(),
                description: format!("{name} serves coffee"),
                owner_id: UserId::random(),
                images: Vec::new(),
                location: Location {
                    address: "1 Main St".to_owned(),
                    city: "Austin".to_owned(),
                    state: "TX".to_owned(),
                    zip_code: "78701".to_owned(),
                    coordinates: Coordinates::default(),
                },
                contact: Contact {
                    phone: "555-0100".to_owned(),
                    email: "hello@example.com".to_owned(),
                    website: None,
                },
                menu: Vec::new(),
                amenities: BTreeSet::new(),
                operating_hours: BTreeMap::new(),
                budget: Budget::default(),
                rating_aggregates: CafeRatingAggregates::empty(),
                is_active: true,
                created_at,
                updated_at: created_at,
            },
            budget: (Decimal::from(5), Decimal::from(20)),
            coordinates: (0.0, 0.0),
        }
    }

    /// Override the identifier.
    pub fn id(mut self, id: CafeId) -> Self {
        self.draft.id = id;
        self
    }

    /// Override the owner.
    pub fn owner(mut self, owner_id: UserId) -> Self {
        self.draft.owner_id = owner_id;
        self
    }

    /// Override the description.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.draft.description);
        self
    }

    /// Override the city.
    pub fn city(mut self, city: &str) -> Self {
        city.clone_into(&mut self.draft.location.city);
        self
    }

    /// Override the state.
    pub fn state(mut self, state: &str) -> Self {
        state.clone_into(&mut self.draft.location.state);
        self
    }

    /// Override the map position.
    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = (latitude, longitude);
        self
    }

    /// Override the budget range.
    pub fn budget(mut self, min: Decimal, max: Decimal) -> Self {
        self.budget = (min, max);
        self
    }

    /// Add one amenity.
    pub fn amenity(mut self, amenity: Amenity) -> Self {
        self.draft.amenities.insert(amenity);
        self
    }

    /// Preset stored aggregates.
    pub fn aggregates(mut self, aggregates: CafeRatingAggregates) -> Self {
        self.draft.rating_aggregates = aggregates;
        self
    }

    /// Override the creation time.
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.draft.created_at = created_at;
        self.draft.updated_at = created_at;
        self
    }

    /// Shift the creation time by whole minutes after [`fixture_epoch`].
    pub fn created_minutes_after_epoch(self, minutes: i64) -> Self {
        self.created_at(fixture_epoch() + Duration::minutes(minutes))
    }

    /// Mark the listing inactive.
    pub fn inactive(mut self) -> Self {
        self.draft.is_active = false;
        self
    }

    /// Validate the fixture.
    ///
    /// # Errors
    ///
    /// Propagates [`CafeValidationError`] from the budget, coordinates or
    /// cafe constructors.
    pub fn try_build(self) -> Result<Cafe, CafeValidationError> {
        let Self {
            mut draft,
            budget: (min, max),
            coordinates: (latitude, longitude),
        } = self;
        draft.budget = Budget::new(min, max)?;
        draft.location.coordinates = Coordinates::new(latitude, longitude)?;
        Cafe::new(draft)
    }

    /// Build the fixture.
    ///
    /// # Panics
    ///
    /// Panics when the fixture is invalid.
    pub fn build(self) -> Cafe {
        match self.try_build() {
            Ok(cafe) => cafe,
            Err(err) => panic!("invalid cafe fixture: {err}"),
        }
    }
}
