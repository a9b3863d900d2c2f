//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations translate between Diesel rows and domain
//! types and hold no business rules. Row structs (`models.rs`) and the
//! schema (`schema.rs`) stay private to this module. Connections come from a
//! `bb8` pool through `diesel-async`.
//!
//! # Example
//!
//! ```no_run
//! use cafehub::outbound::persistence::{DbPool, DieselCafeRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), cafehub::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/cafehub")).await?;
//! let cafes = DieselCafeRepository::new(pool);
//! # let _ = cafes;
//! # Ok(())
//! # }
//! ```

mod diesel_cafe_repository;
pub(crate) mod diesel_helpers;
mod diesel_rating_repository;
mod models;
mod pool;
mod schema;

pub use diesel_cafe_repository::DieselCafeRepository;
pub use diesel_rating_repository::DieselRatingRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
