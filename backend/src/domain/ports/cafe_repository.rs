//! Port for cafe listing reads.
//!
//! Search runs a compiled [`CafeQuery`] against the store. The predicate and
//! sort order must be applied by the adapter exactly as
//! [`CafePredicate::matches`](crate::domain::CafePredicate::matches) and
//! [`SortMode::compare`](crate::domain::SortMode::compare) define them, so
//! that every adapter returns the same page for the same query.

use async_trait::async_trait;

use crate::domain::{Cafe, CafeId, CafeQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by cafe repository adapters.
    pub enum CafeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "cafe repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "cafe repository query failed: {message}",
    }
}

/// One window of search results plus the size of the full match set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CafeMatches {
    /// Cafes inside the requested window, in query order.
    pub cafes: Vec<Cafe>,
    /// Number of cafes matching the predicate, ignoring the window.
    pub total_count: u64,
}

/// Port for reading cafe listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CafeRepository: Send + Sync {
    /// Fetch a cafe by id, active or not.
    ///
    /// Returns `None` when no cafe has the given id.
    async fn find_cafe_by_id(&self, cafe_id: &CafeId) -> Result<Option<Cafe>, CafeRepositoryError>;

    /// Run a compiled query and return the `[offset, offset + limit)` window.
    ///
    /// `total_count` counts every match regardless of the window, so a window
    /// past the end yields no cafes but the correct total.
    async fn find_cafes(
        &self,
        query: &CafeQuery,
        offset: u64,
        limit: u32,
    ) -> Result<CafeMatches, CafeRepositoryError>;
}

/// Fixture implementation for tests that do not exercise cafe reads.
///
/// Every lookup finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCafeRepository;

#[async_trait]
impl CafeRepository for FixtureCafeRepository {
    async fn find_cafe_by_id(
        &self,
        _cafe_id: &CafeId,
    ) -> Result<Option<Cafe>, CafeRepositoryError> {
        Ok(None)
    }

    async fn find_cafes(
        &self,
        _query: &CafeQuery,
        _offset: u64,
        _limit: u32,
    ) -> Result<CafeMatches, CafeRepositoryError> {
        Ok(CafeMatches::default())
    }
}
