//! Aggregate consistency across the rating write path.

#[expect(
    dead_code,
    reason = "Shared harness exposes services used only by other integration suites."
)]
mod support;

use std::sync::Arc;

use async_trait::async_trait;
use cafehub::RatingCommandService;
use cafehub::domain::ports::{
    AggregateRecompute, HelpfulVoteChange, RatingMatches, RatingRepository, RatingRepositoryError,
};
use cafehub::domain::{
    CafeId, CafeRatingAggregates, ErrorCode, Rating, RatingId, ReviewSort, UpdateRating, UserId,
};
use cafehub::outbound::memory::InMemoryCafeStore;
use cafehub::test_support::CafeBuilder;
use mockable::DefaultClock;
use rstest::rstest;
use rust_decimal::Decimal;
use support::Harness;

#[rstest]
#[tokio::test]
async fn aggregates_follow_each_submission() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Crema"));

    for (name, score) in [("Ann", 5), ("Bo", 5), ("Cy", 5), ("Di", 3)] {
        let user = harness.seed_user(name);
        harness.rate(&user, cafe_id, score).await;
    }
    let stored = harness.store.cafe(&cafe_id).expect("cafe stored");
    assert_eq!(
        stored.rating_aggregates(),
        CafeRatingAggregates::new(Decimal::new(450, 2), 4)
    );

    let late = harness.seed_user("Ed");
    let receipt = harness.rate(&late, cafe_id, 1).await;
    assert_eq!(
        receipt.aggregates,
        CafeRatingAggregates::new(Decimal::new(380, 2), 5)
    );
}

#[rstest]
#[tokio::test]
async fn recompute_is_idempotent() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Steady"));
    for (name, score) in [("Ann", 4), ("Bo", 5), ("Cy", 4)] {
        let user = harness.seed_user(name);
        harness.rate(&user, cafe_id, score).await;
    }

    let first = harness
        .aggregates
        .recompute_aggregates(&cafe_id)
        .await
        .expect("recompute succeeds");
    let second = harness
        .aggregates
        .recompute_aggregates(&cafe_id)
        .await
        .expect("recompute succeeds");

    assert_eq!(first, second);
    assert_eq!(first.average_rating(), Decimal::new(433, 2));
    assert_eq!(first.rating_count(), 3);
}

#[rstest]
#[tokio::test]
async fn deleting_every_rating_resets_aggregates() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Fleeting"));
    let ann = harness.seed_user("Ann");
    let bo = harness.seed_user("Bo");
    let first = harness.rate(&ann, cafe_id, 2).await;
    let second = harness.rate(&bo, cafe_id, 5).await;

    harness
        .ratings
        .delete_rating(&first.rating.id(), &ann)
        .await
        .expect("author deletes");
    let aggregates = harness
        .ratings
        .delete_rating(&second.rating.id(), &bo)
        .await
        .expect("author deletes");

    assert_eq!(aggregates, CafeRatingAggregates::empty());
    let stored = harness.store.cafe(&cafe_id).expect("cafe stored");
    assert_eq!(stored.rating_aggregates().rating_count(), 0);
    assert_eq!(stored.rating_aggregates().average_rating(), Decimal::ZERO);
}

#[rstest]
#[tokio::test]
async fn second_rating_by_same_user_conflicts() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Once"));
    let ann = harness.seed_user("Ann");
    harness.rate(&ann, cafe_id, 4).await;

    let err = harness
        .ratings
        .submit_rating(cafehub::domain::SubmitRating {
            user_id: ann.clone(),
            cafe_id,
            score: 1,
            review: "Changed my mind".to_owned(),
            aspects: None,
        })
        .await
        .expect_err("duplicate rejected");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.reason(), Some("duplicate_rating"));
    let stored = harness.store.cafe(&cafe_id).expect("cafe stored");
    assert_eq!(stored.rating_aggregates().rating_count(), 1);
}

#[rstest]
#[tokio::test]
async fn revising_a_score_moves_the_average() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Revised"));
    let ann = harness.seed_user("Ann");
    let bo = harness.seed_user("Bo");
    let receipt = harness.rate(&ann, cafe_id, 2).await;
    harness.rate(&bo, cafe_id, 4).await;

    let revised = harness
        .ratings
        .update_rating(UpdateRating {
            rating_id: receipt.rating.id(),
            requester: ann,
            score: 5,
            review: "Much better on a second visit".to_owned(),
            aspects: None,
        })
        .await
        .expect("author revises");

    assert_eq!(
        revised.aggregates,
        CafeRatingAggregates::new(Decimal::new(450, 2), 2)
    );
}

/// Serves a fixed copy of one rating from `find_rating_by_id`, as a caller
/// would see it after reading just before a concurrent revision landed.
struct PinnedRead {
    store: InMemoryCafeStore,
    pinned: Rating,
}

#[async_trait]
impl RatingRepository for PinnedRead {
    async fn find_rating_by_id(
        &self,
        rating_id: &RatingId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        if *rating_id == self.pinned.id() {
            return Ok(Some(self.pinned.clone()));
        }
        self.store.find_rating_by_id(rating_id).await
    }

    async fn find_rating_by_user_and_cafe(
        &self,
        user_id: &UserId,
        cafe_id: &CafeId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        self.store.find_rating_by_user_and_cafe(user_id, cafe_id).await
    }

    async fn find_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
    ) -> Result<Vec<Rating>, RatingRepositoryError> {
        self.store.find_ratings_by_cafe(cafe_id).await
    }

    async fn list_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
        sort: ReviewSort,
        offset: u64,
        limit: u32,
    ) -> Result<RatingMatches, RatingRepositoryError> {
        self.store
            .list_ratings_by_cafe(cafe_id, sort, offset, limit)
            .await
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        self.store.insert_rating(rating).await
    }

    async fn update_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        self.store.update_rating(rating).await
    }

    async fn delete_rating(&self, rating_id: &RatingId) -> Result<bool, RatingRepositoryError> {
        self.store.delete_rating(rating_id).await
    }

    async fn recompute_cafe_aggregates(
        &self,
        cafe_id: &CafeId,
        recompute: AggregateRecompute,
    ) -> Result<CafeRatingAggregates, RatingRepositoryError> {
        self.store.recompute_cafe_aggregates(cafe_id, recompute).await
    }

    async fn add_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        self.store.add_helpful_vote(rating_id, user_id).await
    }

    async fn remove_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        self.store.remove_helpful_vote(rating_id, user_id).await
    }

    async fn has_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<bool, RatingRepositoryError> {
        self.store.has_helpful_vote(rating_id, user_id).await
    }
}

fn revision(rating: &Rating, score: i64) -> UpdateRating {
    UpdateRating {
        rating_id: rating.id(),
        requester: rating.user_id().clone(),
        score,
        review: format!("Revised to {score}"),
        aspects: None,
    }
}

#[rstest]
#[tokio::test]
async fn revision_from_a_stale_read_still_refreshes_aggregates() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Contested"));
    let ann = harness.seed_user("Ann");
    let submitted = harness.rate(&ann, cafe_id, 3).await;

    // Second writer reads the score of 3 before the first writer revises it.
    let stale = harness
        .store
        .rating(&submitted.rating.id())
        .expect("rating stored");
    let second_writer = RatingCommandService::new(
        Arc::new(PinnedRead {
            store: harness.store.clone(),
            pinned: stale.clone(),
        }),
        Arc::new(harness.store.clone()),
        Arc::new(DefaultClock),
    );

    let first = harness
        .ratings
        .update_rating(revision(&stale, 5))
        .await
        .expect("first writer revises");
    assert_eq!(first.aggregates.average_rating(), Decimal::new(500, 2));

    let second = second_writer
        .update_rating(revision(&stale, 3))
        .await
        .expect("second writer revises");

    let stored = harness
        .store
        .rating(&stale.id())
        .expect("rating stored");
    assert_eq!(stored.score().get(), 3);
    let expected = CafeRatingAggregates::new(Decimal::new(300, 2), 1);
    assert_eq!(second.aggregates, expected);
    let cafe = harness.store.cafe(&cafe_id).expect("cafe stored");
    assert_eq!(cafe.rating_aggregates(), expected);
}

#[rstest]
#[tokio::test]
async fn summary_reports_histogram_alongside_stored_aggregates() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Charted"));
    for (name, score) in [("Ann", 5), ("Bo", 5), ("Cy", 4), ("Di", 1)] {
        let user = harness.seed_user(name);
        harness.rate(&user, cafe_id, score).await;
    }

    let summary = harness
        .aggregates
        .rating_summary(&cafe_id)
        .await
        .expect("summary loads");

    assert_eq!(summary.aggregates.rating_count(), 4);
    let five = summary.distribution.bucket(5).expect("bucket for 5");
    assert_eq!((five.count, five.percentage), (2, 50));
    let three = summary.distribution.bucket(3).expect("bucket for 3");
    assert_eq!((three.count, three.percentage), (0, 0));
}

#[rstest]
#[tokio::test]
async fn listing_orders_by_requested_sort() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Sorted"));
    for (name, score) in [("Ann", 3), ("Bo", 5), ("Cy", 1)] {
        let user = harness.seed_user(name);
        harness.rate(&user, cafe_id, score).await;
    }

    let page = harness
        .ratings
        .list_cafe_ratings(&cafe_id, ReviewSort::Highest, 0, 2)
        .await
        .expect("listing loads");

    let scores: Vec<u8> = page.items().iter().map(|r| r.score().get()).collect();
    assert_eq!(scores, vec![5, 3]);
    assert_eq!(page.total_count(), 3);
    assert!(page.has_more());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_leave_consistent_aggregates() {
    let harness = Harness::new();
    let cafe_id = harness.seed_cafe(CafeBuilder::new("Busy"));
    let users: Vec<_> = (0..8)
        .map(|n| harness.seed_user(&format!("Guest {n}")))
        .collect();

    let submissions = users.iter().enumerate().map(|(n, user)| {
        let ratings = harness.ratings.clone();
        let user = user.clone();
        let score = if n % 2 == 0 { 5 } else { 2 };
        tokio::spawn(async move {
            ratings
                .submit_rating(cafehub::domain::SubmitRating {
                    user_id: user,
                    cafe_id,
                    score,
                    review: "Queued at the counter".to_owned(),
                    aspects: None,
                })
                .await
        })
    });
    let handles: Vec<_> = submissions.collect();
    for handle in handles {
        handle.await.expect("task joins").expect("rating accepted");
    }

    let stored = harness.store.cafe(&cafe_id).expect("cafe stored");
    assert_eq!(
        stored.rating_aggregates(),
        CafeRatingAggregates::new(Decimal::new(350, 2), 8)
    );
}
