//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Registered users; referenced by cafes, ratings and votes.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Unique contact email.
        email -> Varchar,
        /// `CUSTOMER` or `OWNER`.
        role -> Varchar,
        phone -> Nullable<Varchar>,
        avatar -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cafe listings with their stored rating aggregates.
    ///
    /// `average_rating` and `rating_count` are derived columns written only
    /// by the aggregate recompute.
    cafes (id) {
        id -> Uuid,
        owner_id -> Uuid,
        name -> Varchar,
        description -> Text,
        images -> Array<Text>,
        address -> Text,
        city -> Varchar,
        state -> Varchar,
        zip_code -> Varchar,
        latitude -> Float8,
        longitude -> Float8,
        phone -> Varchar,
        email -> Varchar,
        website -> Nullable<Text>,
        min_budget -> Numeric,
        max_budget -> Numeric,
        average_rating -> Numeric,
        rating_count -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Menu entries; `position` keeps the owner's ordering.
    menu_items (id) {
        id -> Uuid,
        cafe_id -> Uuid,
        position -> Int4,
        name -> Varchar,
        description -> Nullable<Text>,
        price -> Numeric,
        category -> Varchar,
        image -> Nullable<Text>,
    }
}

diesel::table! {
    /// Amenities offered by a cafe, one row per amenity.
    cafe_amenities (cafe_id, amenity) {
        cafe_id -> Uuid,
        amenity -> Varchar,
    }
}

diesel::table! {
    /// Weekly opening hours, one row per day.
    cafe_operating_hours (cafe_id, day_of_week) {
        cafe_id -> Uuid,
        day_of_week -> Varchar,
        open_time -> Nullable<Time>,
        close_time -> Nullable<Time>,
        is_closed -> Bool,
    }
}

diesel::table! {
    /// One row per (user, cafe) rating.
    ///
    /// The four aspect columns are all null or all set.
    ratings (id) {
        id -> Uuid,
        user_id -> Uuid,
        cafe_id -> Uuid,
        score -> Int2,
        review -> Text,
        food_score -> Nullable<Int2>,
        service_score -> Nullable<Int2>,
        ambiance_score -> Nullable<Int2>,
        value_score -> Nullable<Int2>,
        /// Size of the voter set in `rating_helpful_votes`.
        helpful_count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Helpful votes; the primary key enforces one vote per user.
    rating_helpful_votes (rating_id, user_id) {
        rating_id -> Uuid,
        user_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(cafes -> users (owner_id));
diesel::joinable!(menu_items -> cafes (cafe_id));
diesel::joinable!(cafe_amenities -> cafes (cafe_id));
diesel::joinable!(cafe_operating_hours -> cafes (cafe_id));
diesel::joinable!(ratings -> cafes (cafe_id));
diesel::joinable!(rating_helpful_votes -> ratings (rating_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    cafes,
    menu_items,
    cafe_amenities,
    cafe_operating_hours,
    ratings,
    rating_helpful_votes,
);
