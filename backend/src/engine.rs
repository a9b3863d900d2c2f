//! Service wiring from [`EngineSettings`].
//!
//! [`CafeEngine`] builds every domain service over one pair of stores and
//! applies the configured page size ceiling to the paged reads.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::domain::{
    CafeSearchService, HelpfulVoteService, RatingAggregateService, RatingCommandService,
};
use crate::outbound::persistence::{
    DbPool, DieselCafeRepository, DieselRatingRepository, PoolConfig, PoolError,
};
use crate::settings::EngineSettings;

/// The domain services, sharing one rating store and one cafe store.
#[derive(Clone)]
pub struct CafeEngine<R, C> {
    /// Filtered cafe search.
    pub search: CafeSearchService<C>,
    /// Rating writes and listings.
    pub ratings: RatingCommandService<R, C>,
    /// Helpful-vote toggles.
    pub votes: HelpfulVoteService<R>,
    /// Aggregate recompute and rating summaries.
    pub aggregates: RatingAggregateService<R, C>,
}

impl<R, C> CafeEngine<R, C> {
    /// Wire the services over `ratings` and `cafes`.
    pub fn new(
        ratings: Arc<R>,
        cafes: Arc<C>,
        clock: Arc<dyn Clock>,
        settings: &EngineSettings,
    ) -> Self {
        let max_page_size = settings.max_page_size();
        Self {
            search: CafeSearchService::new(Arc::clone(&cafes)).with_max_page_size(max_page_size),
            ratings: RatingCommandService::new(Arc::clone(&ratings), Arc::clone(&cafes), clock)
                .with_max_page_size(max_page_size),
            votes: HelpfulVoteService::new(Arc::clone(&ratings)),
            aggregates: RatingAggregateService::new(ratings, cafes),
        }
    }
}

impl CafeEngine<DieselRatingRepository, DieselCafeRepository> {
    /// Open a pool from `settings` and wire the services over PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] when the pool cannot be built.
    pub async fn connect(settings: &EngineSettings) -> Result<Self, PoolError> {
        let pool = DbPool::new(PoolConfig::from_settings(settings)).await?;
        Ok(Self::new(
            Arc::new(DieselRatingRepository::new(pool.clone())),
            Arc::new(DieselCafeRepository::new(pool)),
            Arc::new(DefaultClock),
            settings,
        ))
    }
}
