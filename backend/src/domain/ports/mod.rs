//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cafe_repository;
mod rating_repository;

#[cfg(test)]
pub use cafe_repository::MockCafeRepository;
pub use cafe_repository::{
    CafeMatches, CafeRepository, CafeRepositoryError, FixtureCafeRepository,
};
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
pub use rating_repository::{
    AggregateRecompute, FixtureRatingRepository, HelpfulVoteChange, RatingMatches,
    RatingRepository, RatingRepositoryError,
};
