//! The rating entity and its helpful-vote bookkeeping.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{CafeId, UserId};

use super::{AspectRatings, RatingId, RatingScore, ReviewText};

/// Input payload for [`Rating::new`].
#[derive(Debug, Clone)]
pub struct RatingDraft {
    /// Rating identifier.
    pub id: RatingId,
    /// Author.
    pub user_id: UserId,
    /// Rated cafe.
    pub cafe_id: CafeId,
    /// Overall score.
    pub score: RatingScore,
    /// Review body.
    pub review: ReviewText,
    /// Optional per-aspect scores.
    pub aspects: Option<AspectRatings>,
    /// Users who marked the rating helpful; the author is dropped.
    pub helpful_voters: BTreeSet<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last revision time.
    pub updated_at: DateTime<Utc>,
}

/// One user's scored review of one cafe.
///
/// ## Invariants
/// - `helpful_count` always equals the size of the helpful-voter set.
/// - The author never appears in the helpful-voter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    id: RatingId,
    user_id: UserId,
    cafe_id: CafeId,
    score: RatingScore,
    review: ReviewText,
    aspects: Option<AspectRatings>,
    helpful_voters: BTreeSet<UserId>,
    helpful_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Rating {
    /// Construct a rating, deriving `helpful_count` from the voter set.
    ///
    /// A voter set that names the author is repaired by dropping the author.
    pub fn new(draft: RatingDraft) -> Self {
        let RatingDraft {
            id,
            user_id,
            cafe_id,
            score,
            review,
            aspects,
            mut helpful_voters,
            created_at,
            updated_at,
        } = draft;
        helpful_voters.remove(&user_id);
        let mut rating = Self {
            id,
            user_id,
            cafe_id,
            score,
            review,
            aspects,
            helpful_voters,
            helpful_count: 0,
            created_at,
            updated_at,
        };
        rating.recount();
        rating
    }

    /// Rating identifier.
    pub fn id(&self) -> RatingId {
        self.id
    }

    /// Author.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Rated cafe.
    pub fn cafe_id(&self) -> CafeId {
        self.cafe_id
    }

    /// Headline score.
    pub fn score(&self) -> RatingScore {
        self.score
    }

    /// Review body.
    pub fn review(&self) -> &ReviewText {
        &self.review
    }

    /// Optional aspect scores.
    pub fn aspects(&self) -> Option<&AspectRatings> {
        self.aspects.as_ref()
    }

    /// Users who marked this rating helpful.
    pub fn helpful_voters(&self) -> &BTreeSet<UserId> {
        &self.helpful_voters
    }

    /// Number of helpful votes.
    pub fn helpful_count(&self) -> u32 {
        self.helpful_count
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last modification timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `user_id` wrote this rating.
    pub fn is_authored_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Whether `user_id` has marked this rating helpful.
    pub fn has_helpful_vote(&self, user_id: &UserId) -> bool {
        self.helpful_voters.contains(user_id)
    }

    /// Record a helpful vote and recount.
    ///
    /// Returns `false` when the vote was already present or `user_id` is the
    /// author; the rating is unchanged in both cases.
    pub fn add_helpful_vote(&mut self, user_id: &UserId) -> bool {
        if self.is_authored_by(user_id) {
            return false;
        }
        let changed = self.helpful_voters.insert(user_id.clone());
        self.recount();
        changed
    }

    /// Withdraw a helpful vote and recount.
    ///
    /// Returns `false` when no vote was present.
    pub fn remove_helpful_vote(&mut self, user_id: &UserId) -> bool {
        let changed = self.helpful_voters.remove(user_id);
        self.recount();
        changed
    }

    /// Replace score and review, and aspects when given.
    ///
    /// Returns whether the headline score changed.
    pub fn revise(
        &mut self,
        score: RatingScore,
        review: ReviewText,
        aspects: Option<AspectRatings>,
        now: DateTime<Utc>,
    ) -> bool {
        let score_changed = self.score != score;
        self.score = score;
        self.review = review;
        if aspects.is_some() {
            self.aspects = aspects;
        }
        self.updated_at = now;
        score_changed
    }

    fn recount(&mut self) {
        self.helpful_count = u32::try_from(self.helpful_voters.len()).unwrap_or(u32::MAX);
    }
}
