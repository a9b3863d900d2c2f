//! Tests for the rating write path.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, Utc};
use mockable::Clock;
use rstest::rstest;
use rust_decimal::Decimal;

use super::*;
use crate::domain::ports::{
    MockCafeRepository, MockRatingRepository, RatingMatches, RatingRepositoryError,
};
use crate::domain::ErrorCode;
use crate::test_support::{CafeBuilder, fixture_epoch, sample_rating};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_now() -> DateTime<Utc> {
    fixture_epoch() + Duration::days(30)
}

fn make_service(
    ratings: MockRatingRepository,
    cafes: MockCafeRepository,
) -> RatingCommandService<MockRatingRepository, MockCafeRepository> {
    RatingCommandService::new(
        Arc::new(ratings),
        Arc::new(cafes),
        Arc::new(FixtureClock {
            utc_now: fixture_now(),
        }),
    )
}

fn cafes_with(cafe_id: CafeId) -> MockCafeRepository {
    let cafe = CafeBuilder::new("Rated").id(cafe_id).build();
    let mut cafes = MockCafeRepository::new();
    cafes
        .expect_find_cafe_by_id()
        .return_once(move |_| Ok(Some(cafe)));
    cafes
}

fn submission(cafe_id: CafeId, score: i64) -> SubmitRating {
    SubmitRating {
        user_id: UserId::random(),
        cafe_id,
        score,
        review: "  Great flat white  ".to_owned(),
        aspects: None,
    }
}

fn recompute_to(ratings: &mut MockRatingRepository, raw: &'static [u8]) {
    ratings
        .expect_recompute_cafe_aggregates()
        .times(1)
        .return_once(move |_, recompute| {
            let scores: Vec<_> = raw
                .iter()
                .map(|&s| RatingScore::new(s).expect("valid score"))
                .collect();
            Ok(recompute(&scores))
        });
}

#[tokio::test]
async fn submit_stores_rating_and_returns_fresh_aggregates() {
    let cafe_id = CafeId::random();
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_user_and_cafe()
        .times(1)
        .return_once(|_, _| Ok(None));
    ratings
        .expect_insert_rating()
        .withf(|rating| rating.review().as_str() == "Great flat white")
        .times(1)
        .return_once(|_| Ok(()));
    recompute_to(&mut ratings, &[5, 5, 5, 3]);

    let receipt = make_service(ratings, cafes_with(cafe_id))
        .submit_rating(submission(cafe_id, 3))
        .await
        .expect("submit succeeds");
    assert_eq!(receipt.rating.created_at(), fixture_now());
    assert_eq!(receipt.rating.helpful_count(), 0);
    assert_eq!(receipt.aggregates.average_rating(), Decimal::new(450, 2));
    assert_eq!(receipt.aggregates.rating_count(), 4);
}

#[rstest]
#[case(0)]
#[case(6)]
#[case(-1)]
#[tokio::test]
async fn submit_rejects_out_of_range_scores(#[case] score: i64) {
    let mut ratings = MockRatingRepository::new();
    ratings.expect_insert_rating().never();
    let mut cafes = MockCafeRepository::new();
    cafes.expect_find_cafe_by_id().never();

    let error = make_service(ratings, cafes)
        .submit_rating(submission(CafeId::random(), score))
        .await
        .expect_err("invalid score");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn submit_rejects_blank_review_and_bad_aspects() {
    let service = make_service(MockRatingRepository::new(), MockCafeRepository::new());
    let mut blank = submission(CafeId::random(), 4);
    blank.review = "   ".to_owned();
    let error = service.submit_rating(blank).await.expect_err("blank review");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);

    let mut aspects = submission(CafeId::random(), 4);
    aspects.aspects = Some(AspectInput {
        food: 5,
        service: 9,
        ambiance: 3,
        value: 3,
    });
    let error = service
        .submit_rating(aspects)
        .await
        .expect_err("bad aspect");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn submit_requires_the_cafe() {
    let mut cafes = MockCafeRepository::new();
    cafes
        .expect_find_cafe_by_id()
        .times(1)
        .return_once(|_| Ok(None));
    let mut ratings = MockRatingRepository::new();
    ratings.expect_insert_rating().never();

    let error = make_service(ratings, cafes)
        .submit_rating(submission(CafeId::random(), 4))
        .await
        .expect_err("missing cafe");
    assert_eq!(error.reason(), Some("cafe_not_found"));
}

#[tokio::test]
async fn second_rating_by_same_user_conflicts() {
    let cafe_id = CafeId::random();
    let request = submission(cafe_id, 4);
    let existing = sample_rating(cafe_id, request.user_id.clone(), 5);
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_user_and_cafe()
        .return_once(move |_, _| Ok(Some(existing)));
    ratings.expect_insert_rating().never();
    ratings.expect_recompute_cafe_aggregates().never();

    let error = make_service(ratings, cafes_with(cafe_id))
        .submit_rating(request)
        .await
        .expect_err("duplicate");
    assert_eq!(error.code(), ErrorCode::Conflict);
    assert_eq!(error.reason(), Some("duplicate_rating"));
}

#[tokio::test]
async fn racing_duplicate_insert_surfaces_as_conflict() {
    let cafe_id = CafeId::random();
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_user_and_cafe()
        .return_once(|_, _| Ok(None));
    ratings.expect_insert_rating().return_once(|rating| {
        Err(RatingRepositoryError::duplicate_rating(
            rating.user_id().to_string(),
            rating.cafe_id().to_string(),
        ))
    });
    ratings.expect_recompute_cafe_aggregates().never();

    let error = make_service(ratings, cafes_with(cafe_id))
        .submit_rating(submission(cafe_id, 4))
        .await
        .expect_err("duplicate insert");
    assert_eq!(error.reason(), Some("duplicate_rating"));
}

fn update(rating: &Rating, score: i64) -> UpdateRating {
    UpdateRating {
        rating_id: rating.id(),
        requester: rating.user_id().clone(),
        score,
        review: "Revised after a second visit".to_owned(),
        aspects: None,
    }
}

#[tokio::test]
async fn update_with_new_score_recomputes() {
    let rating = sample_rating(CafeId::random(), UserId::random(), 2);
    let request = update(&rating, 4);
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_id()
        .return_once(move |_| Ok(Some(rating)));
    ratings
        .expect_update_rating()
        .withf(|stored| stored.score().get() == 4 && stored.updated_at() == fixture_now())
        .times(1)
        .return_once(|_| Ok(()));
    recompute_to(&mut ratings, &[4]);

    let receipt = make_service(ratings, MockCafeRepository::new())
        .update_rating(request)
        .await
        .expect("update succeeds");
    assert_eq!(receipt.aggregates.average_rating(), Decimal::new(400, 2));
}

#[tokio::test]
async fn update_recomputes_even_when_the_read_score_is_unchanged() {
    // The caller read 3 and writes 3, but a concurrent revision to 5 had
    // already been recomputed; the store's rating set is what counts.
    let rating = sample_rating(CafeId::random(), UserId::random(), 3);
    let request = update(&rating, 3);
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_id()
        .return_once(move |_| Ok(Some(rating)));
    ratings.expect_update_rating().times(1).return_once(|_| Ok(()));
    recompute_to(&mut ratings, &[3]);

    let receipt = make_service(ratings, MockCafeRepository::new())
        .update_rating(request)
        .await
        .expect("update succeeds");
    assert_eq!(receipt.aggregates.average_rating(), Decimal::new(300, 2));
    assert_eq!(receipt.aggregates.rating_count(), 1);
    assert_eq!(receipt.rating.review().as_str(), "Revised after a second visit");
}

#[tokio::test]
async fn only_the_author_may_update() {
    let rating = sample_rating(CafeId::random(), UserId::random(), 3);
    let mut request = update(&rating, 5);
    request.requester = UserId::random();
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_id()
        .return_once(move |_| Ok(Some(rating)));
    ratings.expect_update_rating().never();

    let error = make_service(ratings, MockCafeRepository::new())
        .update_rating(request)
        .await
        .expect_err("not the author");
    assert_eq!(error.code(), ErrorCode::Forbidden);
    assert_eq!(error.reason(), Some("not_rating_author"));
}

#[tokio::test]
async fn delete_recomputes_down_to_zero() {
    let rating = sample_rating(CafeId::random(), UserId::random(), 5);
    let rating_id = rating.id();
    let author = rating.user_id().clone();
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_id()
        .return_once(move |_| Ok(Some(rating)));
    ratings
        .expect_delete_rating()
        .times(1)
        .return_once(|_| Ok(true));
    recompute_to(&mut ratings, &[]);

    let aggregates = make_service(ratings, MockCafeRepository::new())
        .delete_rating(&rating_id, &author)
        .await
        .expect("delete succeeds");
    assert_eq!(aggregates, CafeRatingAggregates::empty());
}

#[tokio::test]
async fn delete_of_missing_rating_is_not_found() {
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_id()
        .return_once(|_| Ok(None));
    ratings.expect_delete_rating().never();

    let error = make_service(ratings, MockCafeRepository::new())
        .delete_rating(&RatingId::random(), &UserId::random())
        .await
        .expect_err("missing rating");
    assert_eq!(error.reason(), Some("rating_not_found"));
}

#[tokio::test]
async fn listing_passes_window_and_sort_to_the_store() {
    let cafe_id = CafeId::random();
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_list_ratings_by_cafe()
        .withf(|_, sort, offset, limit| {
            *sort == ReviewSort::MostHelpful && *offset == 5 && *limit == 5
        })
        .times(1)
        .return_once(move |_, _, _, _| {
            Ok(RatingMatches {
                ratings: vec![sample_rating(cafe_id, UserId::random(), 4)],
                total_count: 6,
            })
        });

    let page = make_service(ratings, cafes_with(cafe_id))
        .list_cafe_ratings(&cafe_id, ReviewSort::MostHelpful, 1, 5)
        .await
        .expect("listing succeeds");
    assert_eq!(page.items().len(), 1);
    assert_eq!(page.total_count(), 6);
    assert!(!page.has_more());
}

#[tokio::test]
async fn listing_rejects_bad_pagination_before_the_store() {
    let mut ratings = MockRatingRepository::new();
    ratings.expect_list_ratings_by_cafe().never();
    let mut cafes = MockCafeRepository::new();
    cafes.expect_find_cafe_by_id().never();

    let error = make_service(ratings, cafes)
        .list_cafe_ratings(&CafeId::random(), ReviewSort::Newest, 0, 0)
        .await
        .expect_err("bad pagination");
    assert_eq!(error.reason(), Some("invalid_pagination"));
}

#[tokio::test]
async fn missing_user_rating_is_not_found() {
    let mut ratings = MockRatingRepository::new();
    ratings
        .expect_find_rating_by_user_and_cafe()
        .return_once(|_, _| Ok(None));

    let error = make_service(ratings, MockCafeRepository::new())
        .find_user_rating(&UserId::random(), &CafeId::random())
        .await
        .expect_err("no rating");
    assert_eq!(error.code(), ErrorCode::NotFound);
    assert_eq!(error.reason(), Some("rating_not_found"));
}

#[rstest]
#[case(ReviewSort::Highest, [5, 3, 1])]
#[case(ReviewSort::Lowest, [1, 3, 5])]
fn review_sort_orders_by_score(#[case] sort: ReviewSort, #[case] expected: [u8; 3]) {
    let cafe_id = CafeId::random();
    let mut rows = vec![
        sample_rating(cafe_id, UserId::random(), 3),
        sample_rating(cafe_id, UserId::random(), 1),
        sample_rating(cafe_id, UserId::random(), 5),
    ];
    rows.sort_by(|a, b| sort.compare(a, b));
    let scores: Vec<_> = rows.iter().map(|rating| rating.score().get()).collect();
    assert_eq!(scores, expected.to_vec());
}

#[test]
fn review_sort_breaks_ties_on_id() {
    let cafe_id = CafeId::random();
    let mut rows: Vec<_> = (0..4)
        .map(|_| sample_rating(cafe_id, UserId::random(), 4))
        .collect();
    rows.sort_by(|a, b| ReviewSort::Highest.compare(a, b));
    let ids: Vec<_> = rows.iter().map(Rating::id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
