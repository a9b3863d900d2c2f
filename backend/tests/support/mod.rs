//! Shared helpers for the integration suites.
//!
//! [`Harness`] wires every service to the same [`InMemoryCafeStore`], so
//! writes made through one service are visible to the others. The
//! database-backed suites use [`embedded_postgres`] and [`cluster_skip`].

pub mod cluster_skip;
pub mod embedded_postgres;

use std::sync::Arc;

use cafehub::domain::{CafeId, RatingReceipt, SubmitRating, UserId};
use cafehub::outbound::memory::InMemoryCafeStore;
use cafehub::settings::EngineSettings;
use cafehub::test_support::{CafeBuilder, sample_user};
use cafehub::{
    CafeEngine, CafeSearchService, HelpfulVoteService, RatingAggregateService,
    RatingCommandService,
};
use mockable::DefaultClock;

/// Services sharing one store.
pub struct Harness {
    pub store: InMemoryCafeStore,
    pub search: CafeSearchService<InMemoryCafeStore>,
    pub ratings: RatingCommandService<InMemoryCafeStore, InMemoryCafeStore>,
    pub votes: HelpfulVoteService<InMemoryCafeStore>,
    pub aggregates: RatingAggregateService<InMemoryCafeStore, InMemoryCafeStore>,
}

/// Settings with every value left to its default.
pub fn default_settings() -> EngineSettings {
    EngineSettings {
        database_url: None,
        pool_max_size: None,
        pool_connection_timeout_secs: None,
        max_page_size: None,
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(&default_settings())
    }

    /// Wire every service from `settings` over a fresh store.
    pub fn with_settings(settings: &EngineSettings) -> Self {
        let store = InMemoryCafeStore::new();
        let shared = Arc::new(store.clone());
        let CafeEngine {
            search,
            ratings,
            votes,
            aggregates,
        } = CafeEngine::new(
            Arc::clone(&shared),
            shared,
            Arc::new(DefaultClock),
            settings,
        );
        Self {
            store,
            search,
            ratings,
            votes,
            aggregates,
        }
    }

    /// Register a customer and return their id.
    pub fn seed_user(&self, name: &str) -> UserId {
        let user = sample_user(name);
        let id = user.id.clone();
        self.store.insert_user(user);
        id
    }

    /// Store the cafe built by `builder` and return its id.
    pub fn seed_cafe(&self, builder: CafeBuilder) -> CafeId {
        let cafe = builder.build();
        let id = cafe.id();
        self.store.insert_cafe(cafe);
        id
    }

    /// Submit a plain rating, panicking on rejection.
    pub async fn rate(&self, user_id: &UserId, cafe_id: CafeId, score: i64) -> RatingReceipt {
        self.ratings
            .submit_rating(SubmitRating {
                user_id: user_id.clone(),
                cafe_id,
                score,
                review: format!("Scored it {score}"),
                aspects: None,
            })
            .await
            .expect("rating accepted")
    }
}
