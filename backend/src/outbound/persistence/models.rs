//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{
    cafe_amenities, cafe_operating_hours, cafes, menu_items, rating_helpful_votes, ratings,
};

// ---------------------------------------------------------------------------
// Cafe models
// ---------------------------------------------------------------------------

/// Row struct for reading from the cafes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cafes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CafeRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub phone: String,
    pub email: String,
    pub website: Option<String>,
    pub min_budget: Decimal,
    pub max_budget: Decimal,
    pub average_rating: Decimal,
    pub rating_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the menu_items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MenuItemRow {
    pub id: Uuid,
    pub cafe_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: String,
    pub image: Option<String>,
}

/// Row struct for reading from the cafe_amenities table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cafe_amenities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CafeAmenityRow {
    pub cafe_id: Uuid,
    pub amenity: String,
}

/// Row struct for reading from the cafe_operating_hours table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = cafe_operating_hours)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OperatingHoursRow {
    pub cafe_id: Uuid,
    pub day_of_week: String,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub is_closed: bool,
}

// ---------------------------------------------------------------------------
// Rating models
// ---------------------------------------------------------------------------

/// Row struct for reading from the ratings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cafe_id: Uuid,
    pub score: i16,
    pub review: String,
    pub food_score: Option<i16>,
    pub service_score: Option<i16>,
    pub ambiance_score: Option<i16>,
    pub value_score: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating rating records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ratings)]
pub(crate) struct NewRatingRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cafe_id: Uuid,
    pub score: i16,
    pub review: &'a str,
    pub food_score: Option<i16>,
    pub service_score: Option<i16>,
    pub ambiance_score: Option<i16>,
    pub value_score: Option<i16>,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changeset for revising a rating; votes and counts are untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ratings)]
pub(crate) struct RatingRevision<'a> {
    pub score: i16,
    pub review: &'a str,
    pub food_score: Option<i16>,
    pub service_score: Option<i16>,
    pub ambiance_score: Option<i16>,
    pub value_score: Option<i16>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for recording a helpful vote.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = rating_helpful_votes)]
pub(crate) struct NewHelpfulVoteRow {
    pub rating_id: Uuid,
    pub user_id: Uuid,
}
