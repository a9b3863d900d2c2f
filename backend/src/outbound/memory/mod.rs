//! In-memory adapter implementing the cafe and rating ports.
//!
//! One mutex guards users, cafes and ratings together, so every port call is
//! a single critical section. That gives the same guarantees the PostgreSQL
//! adapter gets from row locks: recomputes are serialized per cafe and vote
//! changes per rating. Used by integration tests and local tooling.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    AggregateRecompute, CafeMatches, CafeRepository, CafeRepositoryError, HelpfulVoteChange,
    RatingMatches, RatingRepository, RatingRepositoryError,
};
use crate::domain::{
    Cafe, CafeId, CafeQuery, CafeRatingAggregates, Rating, RatingId, ReviewSort, User, UserId,
};

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    cafes: BTreeMap<CafeId, Cafe>,
    ratings: BTreeMap<RatingId, Rating>,
}

impl StoreState {
    fn rating_mut(&mut self, rating_id: &RatingId) -> Result<&mut Rating, RatingRepositoryError> {
        self.ratings
            .get_mut(rating_id)
            .ok_or_else(|| RatingRepositoryError::rating_not_found(rating_id.to_string()))
    }
}

fn window<T>(items: Vec<T>, offset: u64, limit: u32) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Shared in-memory store; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCafeStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryCafeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, action: impl FnOnce(&mut StoreState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut state)
    }

    /// Register a user so ratings and votes can reference it.
    pub fn insert_user(&self, user: User) {
        self.with_state(|state| {
            state.users.insert(user.id.clone(), user);
        });
    }

    /// Add or replace a cafe listing.
    pub fn insert_cafe(&self, cafe: Cafe) {
        self.with_state(|state| {
            state.cafes.insert(cafe.id(), cafe);
        });
    }

    /// Snapshot of a stored cafe.
    pub fn cafe(&self, cafe_id: &CafeId) -> Option<Cafe> {
        self.with_state(|state| state.cafes.get(cafe_id).cloned())
    }

    /// Snapshot of a stored rating.
    pub fn rating(&self, rating_id: &RatingId) -> Option<Rating> {
        self.with_state(|state| state.ratings.get(rating_id).cloned())
    }
}

#[async_trait]
impl CafeRepository for InMemoryCafeStore {
    async fn find_cafe_by_id(&self, cafe_id: &CafeId) -> Result<Option<Cafe>, CafeRepositoryError> {
        Ok(self.cafe(cafe_id))
    }

    async fn find_cafes(
        &self,
        query: &CafeQuery,
        offset: u64,
        limit: u32,
    ) -> Result<CafeMatches, CafeRepositoryError> {
        let mut matches: Vec<Cafe> = self.with_state(|state| {
            state
                .cafes
                .values()
                .filter(|cafe| query.predicate.matches(cafe))
                .cloned()
                .collect()
        });
        matches.sort_by(|left, right| query.sort.compare(left, right));
        let total_count = count(matches.len());
        debug!(total_count, offset, limit, "in-memory cafe search");
        Ok(CafeMatches {
            cafes: window(matches, offset, limit),
            total_count,
        })
    }
}

#[async_trait]
impl RatingRepository for InMemoryCafeStore {
    async fn find_rating_by_id(
        &self,
        rating_id: &RatingId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        Ok(self.rating(rating_id))
    }

    async fn find_rating_by_user_and_cafe(
        &self,
        user_id: &UserId,
        cafe_id: &CafeId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .ratings
                .values()
                .find(|rating| rating.cafe_id() == *cafe_id && rating.is_authored_by(user_id))
                .cloned()
        }))
    }

    async fn find_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
    ) -> Result<Vec<Rating>, RatingRepositoryError> {
        Ok(self.with_state(|state| {
            state
                .ratings
                .values()
                .filter(|rating| rating.cafe_id() == *cafe_id)
                .cloned()
                .collect()
        }))
    }

    async fn list_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
        sort: ReviewSort,
        offset: u64,
        limit: u32,
    ) -> Result<RatingMatches, RatingRepositoryError> {
        let mut ratings = self.find_ratings_by_cafe(cafe_id).await?;
        ratings.sort_by(|left, right| sort.compare(left, right));
        let total_count = count(ratings.len());
        Ok(RatingMatches {
            ratings: window(ratings, offset, limit),
            total_count,
        })
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        self.with_state(|state| {
            let cafe_id = rating.cafe_id();
            if !state.cafes.contains_key(&cafe_id) {
                return Err(RatingRepositoryError::cafe_not_found(cafe_id.to_string()));
            }
            if !state.users.contains_key(rating.user_id()) {
                return Err(RatingRepositoryError::user_not_found(
                    rating.user_id().to_string(),
                ));
            }
            let duplicate = state
                .ratings
                .values()
                .any(|other| other.cafe_id() == cafe_id && other.is_authored_by(rating.user_id()));
            if duplicate {
                return Err(RatingRepositoryError::duplicate_rating(
                    rating.user_id().to_string(),
                    cafe_id.to_string(),
                ));
            }
            state.ratings.insert(rating.id(), rating.clone());
            Ok(())
        })
    }

    async fn update_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        self.with_state(|state| {
            // Votes recorded since the caller read the rating are kept.
            let stored = state.rating_mut(&rating.id())?;
            stored.revise(
                rating.score(),
                rating.review().clone(),
                rating.aspects().copied(),
                rating.updated_at(),
            );
            Ok(())
        })
    }

    async fn delete_rating(&self, rating_id: &RatingId) -> Result<bool, RatingRepositoryError> {
        Ok(self.with_state(|state| state.ratings.remove(rating_id).is_some()))
    }

    async fn recompute_cafe_aggregates(
        &self,
        cafe_id: &CafeId,
        recompute: AggregateRecompute,
    ) -> Result<CafeRatingAggregates, RatingRepositoryError> {
        self.with_state(|state| {
            let scores: Vec<_> = state
                .ratings
                .values()
                .filter(|rating| rating.cafe_id() == *cafe_id)
                .map(Rating::score)
                .collect();
            let cafe = state
                .cafes
                .get_mut(cafe_id)
                .ok_or_else(|| RatingRepositoryError::cafe_not_found(cafe_id.to_string()))?;
            let aggregates = recompute(&scores);
            cafe.set_rating_aggregates(aggregates);
            Ok(aggregates)
        })
    }

    async fn add_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        self.with_state(|state| {
            if !state.users.contains_key(user_id) {
                // Checked after the rating so a missing rating wins.
                state.rating_mut(rating_id)?;
                return Err(RatingRepositoryError::user_not_found(user_id.to_string()));
            }
            let rating = state.rating_mut(rating_id)?;
            let changed = rating.add_helpful_vote(user_id);
            Ok(HelpfulVoteChange {
                helpful_count: rating.helpful_count(),
                changed,
            })
        })
    }

    async fn remove_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        self.with_state(|state| {
            let rating = state.rating_mut(rating_id)?;
            let changed = rating.remove_helpful_vote(user_id);
            Ok(HelpfulVoteChange {
                helpful_count: rating.helpful_count(),
                changed,
            })
        })
    }

    async fn has_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<bool, RatingRepositoryError> {
        self.with_state(|state| {
            state
                .rating_mut(rating_id)
                .map(|rating| rating.has_helpful_vote(user_id))
        })
    }
}
