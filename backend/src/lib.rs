//! Cafe discovery and rating engine.
//!
//! The crate is organised as a hexagon:
//! - [`domain`] holds the cafe, rating and user model, the filter compiler,
//!   and the services that keep rating aggregates consistent.
//! - [`domain::ports`] declares the narrow store interfaces the services
//!   depend on.
//! - [`outbound`] provides adapters for those ports (PostgreSQL via Diesel,
//!   plus an in-memory store).
//! - [`settings`] loads runtime configuration, and [`engine`] wires the
//!   services from it.

pub mod domain;
pub mod engine;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use engine::CafeEngine;
pub use domain::{
    CafeSearchService, HelpfulVoteService, RatingAggregateService, RatingCommandService,
};
