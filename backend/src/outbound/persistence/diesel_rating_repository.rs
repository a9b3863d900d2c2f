//! PostgreSQL-backed rating adapter.
//!
//! Writes that derive a value from other rows run in one transaction:
//!
//! - aggregate recompute locks the cafe row (`SELECT ... FOR UPDATE`), reads
//!   every score and writes `average_rating` and `rating_count`;
//! - vote changes lock the rating row, insert or delete the vote and store
//!   the recounted `helpful_count`.
//!
//! A future dropped before commit rolls the transaction back.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    AggregateRecompute, HelpfulVoteChange, RatingMatches, RatingRepository, RatingRepositoryError,
};
use crate::domain::{
    AspectRatings, CafeId, CafeRatingAggregates, Rating, RatingDraft, RatingId, RatingScore,
    ReviewSort, ReviewText, UserId,
};

use super::diesel_helpers::{
    ConstraintViolation, classify_violation, count_from_db, is_connection_error,
    map_diesel_error_message, map_pool_error_message, offset_for_db,
};
use super::models::{NewHelpfulVoteRow, NewRatingRow, RatingRevision, RatingRow};
use super::pool::{DbPool, PoolError};
use super::schema::{cafes, rating_helpful_votes, ratings};

/// Diesel-backed implementation of the rating port.
#[derive(Clone)]
pub struct DieselRatingRepository {
    pool: DbPool,
}

impl DieselRatingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RatingRepositoryError {
    RatingRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: DieselError) -> RatingRepositoryError {
    let message = map_diesel_error_message(&error, "rating store");
    if is_connection_error(&error) {
        RatingRepositoryError::connection(message)
    } else {
        RatingRepositoryError::query(message)
    }
}

/// Identifiers a write touched, used to name the missing or duplicate row.
#[derive(Debug, Clone, Copy)]
struct WriteContext<'a> {
    user_id: &'a UserId,
    cafe_id: Option<CafeId>,
    rating_id: Option<RatingId>,
}

fn map_write_error(error: DieselError, context: WriteContext<'_>) -> RatingRepositoryError {
    let cafe = || context.cafe_id.map(|id| id.to_string()).unwrap_or_default();
    let rating = || context.rating_id.map(|id| id.to_string()).unwrap_or_default();
    match classify_violation(&error) {
        Some(ConstraintViolation::DuplicateRating) => {
            RatingRepositoryError::duplicate_rating(context.user_id.to_string(), cafe())
        }
        Some(ConstraintViolation::MissingCafe) => RatingRepositoryError::cafe_not_found(cafe()),
        Some(ConstraintViolation::MissingUser) => {
            RatingRepositoryError::user_not_found(context.user_id.to_string())
        }
        Some(ConstraintViolation::MissingRating) => {
            RatingRepositoryError::rating_not_found(rating())
        }
        None => map_diesel_error(error),
    }
}

/// Transaction error: either a database failure or a domain rejection that
/// must abort the transaction.
#[derive(Debug)]
enum TxError {
    Database(DieselError),
    Rejected(RatingRepositoryError),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Database(error)
    }
}

impl TxError {
    fn into_port_error(self, context: WriteContext<'_>) -> RatingRepositoryError {
        match self {
            Self::Database(error) => map_write_error(error, context),
            Self::Rejected(error) => error,
        }
    }
}

// ---------------------------------------------------------------------------
// Row-to-domain converters
// ---------------------------------------------------------------------------

fn row_to_aspects(row: &RatingRow) -> Result<Option<AspectRatings>, String> {
    match (
        row.food_score,
        row.service_score,
        row.ambiance_score,
        row.value_score,
    ) {
        (None, None, None, None) => Ok(None),
        (Some(food), Some(service), Some(ambiance), Some(value)) => AspectRatings::try_new(
            i64::from(food),
            i64::from(service),
            i64::from(ambiance),
            i64::from(value),
        )
        .map(Some)
        .map_err(|err| err.to_string()),
        _ => Err(format!("rating {} has partial aspect scores", row.id)),
    }
}

fn row_to_rating(row: RatingRow, helpful_voters: BTreeSet<UserId>) -> Result<Rating, String> {
    let aspects = row_to_aspects(&row)?;
    let score = RatingScore::new(row.score).map_err(|err| err.to_string())?;
    let review = ReviewText::new(row.review).map_err(|err| err.to_string())?;
    Ok(Rating::new(RatingDraft {
        id: RatingId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        cafe_id: CafeId::from_uuid(row.cafe_id),
        score,
        review,
        aspects,
        helpful_voters,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn aspect_columns(rating: &Rating) -> [Option<i16>; 4] {
    rating.aspects().map_or([None; 4], |aspects| {
        [aspects.food, aspects.service, aspects.ambiance, aspects.value]
            .map(|score| Some(i16::from(score.get())))
    })
}

fn new_rating_row(rating: &Rating) -> NewRatingRow<'_> {
    let [food_score, service_score, ambiance_score, value_score] = aspect_columns(rating);
    NewRatingRow {
        id: *rating.id().as_uuid(),
        user_id: *rating.user_id().as_uuid(),
        cafe_id: *rating.cafe_id().as_uuid(),
        score: i16::from(rating.score().get()),
        review: rating.review().as_str(),
        food_score,
        service_score,
        ambiance_score,
        value_score,
        helpful_count: i32::try_from(rating.helpful_count()).unwrap_or(i32::MAX),
        created_at: rating.created_at(),
        updated_at: rating.updated_at(),
    }
}

fn rating_revision(rating: &Rating) -> RatingRevision<'_> {
    let [food_score, service_score, ambiance_score, value_score] = aspect_columns(rating);
    RatingRevision {
        score: i16::from(rating.score().get()),
        review: rating.review().as_str(),
        food_score,
        service_score,
        ambiance_score,
        value_score,
        updated_at: rating.updated_at(),
    }
}

async fn load_voters(
    conn: &mut AsyncPgConnection,
    rating_ids: &[Uuid],
) -> QueryResult<BTreeMap<Uuid, BTreeSet<UserId>>> {
    let mut voters: BTreeMap<Uuid, BTreeSet<UserId>> = BTreeMap::new();
    if rating_ids.is_empty() {
        return Ok(voters);
    }
    let rows: Vec<(Uuid, Uuid)> = rating_helpful_votes::table
        .filter(rating_helpful_votes::rating_id.eq_any(rating_ids))
        .select((rating_helpful_votes::rating_id, rating_helpful_votes::user_id))
        .load(conn)
        .await?;
    for (rating_id, user_id) in rows {
        voters
            .entry(rating_id)
            .or_default()
            .insert(UserId::from_uuid(user_id));
    }
    Ok(voters)
}

async fn with_voters(
    conn: &mut AsyncPgConnection,
    rows: Vec<RatingRow>,
) -> Result<Vec<Rating>, RatingRepositoryError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut voters = load_voters(conn, &ids).await.map_err(map_diesel_error)?;
    rows.into_iter()
        .map(|row| {
            let own = voters.remove(&row.id).unwrap_or_default();
            row_to_rating(row, own).map_err(RatingRepositoryError::query)
        })
        .collect()
}

fn ordered(cafe_id: Uuid, sort: ReviewSort) -> ratings::BoxedQuery<'static, diesel::pg::Pg> {
    let sql = ratings::table
        .filter(ratings::cafe_id.eq(cafe_id))
        .into_boxed();
    match sort {
        ReviewSort::Newest => sql.order_by((ratings::created_at.desc(), ratings::id.desc())),
        ReviewSort::Oldest => sql.order_by((ratings::created_at.asc(), ratings::id.asc())),
        ReviewSort::Highest => sql.order_by((ratings::score.desc(), ratings::id.asc())),
        ReviewSort::Lowest => sql.order_by((ratings::score.asc(), ratings::id.asc())),
        ReviewSort::MostHelpful => {
            sql.order_by((ratings::helpful_count.desc(), ratings::id.asc()))
        }
    }
}

/// Lock a rating row and return its id, or reject with `RatingNotFound`.
async fn lock_rating(conn: &mut AsyncPgConnection, rating_id: RatingId) -> Result<(), TxError> {
    ratings::table
        .find(*rating_id.as_uuid())
        .select(ratings::id)
        .for_update()
        .first::<Uuid>(conn)
        .await
        .optional()?
        .map(|_| ())
        .ok_or_else(|| {
            TxError::Rejected(RatingRepositoryError::rating_not_found(rating_id.to_string()))
        })
}

/// Recount the voter set and store it on the rating row.
async fn store_recount(conn: &mut AsyncPgConnection, rating_id: Uuid) -> Result<u32, TxError> {
    let count: i64 = rating_helpful_votes::table
        .filter(rating_helpful_votes::rating_id.eq(rating_id))
        .count()
        .get_result(conn)
        .await?;
    let helpful_count = i32::try_from(count).unwrap_or(i32::MAX);
    diesel::update(ratings::table.find(rating_id))
        .set(ratings::helpful_count.eq(helpful_count))
        .execute(conn)
        .await?;
    Ok(u32::try_from(helpful_count).unwrap_or(0))
}

#[async_trait]
impl RatingRepository for DieselRatingRepository {
    async fn find_rating_by_id(
        &self,
        rating_id: &RatingId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RatingRow> = ratings::table
            .find(*rating_id.as_uuid())
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(with_voters(&mut conn, rows).await?.into_iter().next())
    }

    async fn find_rating_by_user_and_cafe(
        &self,
        user_id: &UserId,
        cafe_id: &CafeId,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RatingRow> = ratings::table
            .filter(ratings::user_id.eq(*user_id.as_uuid()))
            .filter(ratings::cafe_id.eq(*cafe_id.as_uuid()))
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(with_voters(&mut conn, rows).await?.into_iter().next())
    }

    async fn find_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
    ) -> Result<Vec<Rating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RatingRow> = ratings::table
            .filter(ratings::cafe_id.eq(*cafe_id.as_uuid()))
            .order_by(ratings::id.asc())
            .select(RatingRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_voters(&mut conn, rows).await
    }

    async fn list_ratings_by_cafe(
        &self,
        cafe_id: &CafeId,
        sort: ReviewSort,
        offset: u64,
        limit: u32,
    ) -> Result<RatingMatches, RatingRepositoryError> {
        let offset_i64 = offset_for_db(offset).map_err(RatingRepositoryError::query)?;
        let limit_i64 = i64::from(limit);
        let cafe_uuid = *cafe_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (total, rows) = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    let total: i64 = ratings::table
                        .filter(ratings::cafe_id.eq(cafe_uuid))
                        .count()
                        .get_result(conn)
                        .await?;
                    let rows: Vec<RatingRow> = ordered(cafe_uuid, sort)
                        .offset(offset_i64)
                        .limit(limit_i64)
                        .select(RatingRow::as_select())
                        .load(conn)
                        .await?;
                    Ok::<_, DieselError>((total, rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        let total_count = count_from_db(total, "rating count").map_err(RatingRepositoryError::query)?;
        debug!(%cafe_id, ?sort, total_count, offset, limit, "rating window loaded");
        Ok(RatingMatches {
            ratings: with_voters(&mut conn, rows).await?,
            total_count,
        })
    }

    async fn insert_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        let context = WriteContext {
            user_id: rating.user_id(),
            cafe_id: Some(rating.cafe_id()),
            rating_id: Some(rating.id()),
        };
        let new_row = new_rating_row(rating);
        let votes: Vec<NewHelpfulVoteRow> = rating
            .helpful_voters()
            .iter()
            .map(|voter| NewHelpfulVoteRow {
                rating_id: new_row.id,
                user_id: *voter.as_uuid(),
            })
            .collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(ratings::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                if !votes.is_empty() {
                    diesel::insert_into(rating_helpful_votes::table)
                        .values(&votes)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, DieselError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_write_error(err, context))
    }

    async fn update_rating(&self, rating: &Rating) -> Result<(), RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(ratings::table.find(*rating.id().as_uuid()))
            .set(&rating_revision(rating))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(RatingRepositoryError::rating_not_found(
                rating.id().to_string(),
            ));
        }
        Ok(())
    }

    async fn delete_rating(&self, rating_id: &RatingId) -> Result<bool, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(ratings::table.find(*rating_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn recompute_cafe_aggregates(
        &self,
        cafe_id: &CafeId,
        recompute: AggregateRecompute,
    ) -> Result<CafeRatingAggregates, RatingRepositoryError> {
        let cafe_id = *cafe_id;
        let cafe_uuid = *cafe_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let aggregates = conn
            .transaction(|conn| {
                async move {
                    let locked: Option<Uuid> = cafes::table
                        .find(cafe_uuid)
                        .select(cafes::id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    if locked.is_none() {
                        return Err(TxError::Rejected(RatingRepositoryError::cafe_not_found(
                            cafe_id.to_string(),
                        )));
                    }
                    let raw: Vec<i16> = ratings::table
                        .filter(ratings::cafe_id.eq(cafe_uuid))
                        .select(ratings::score)
                        .load(conn)
                        .await?;
                    let scores = raw
                        .into_iter()
                        .map(RatingScore::new)
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|err| {
                            TxError::Rejected(RatingRepositoryError::query(err.to_string()))
                        })?;
                    let aggregates = recompute(&scores);
                    let rating_count = i32::try_from(aggregates.rating_count()).map_err(|_| {
                        TxError::Rejected(RatingRepositoryError::query("rating count overflow"))
                    })?;
                    diesel::update(cafes::table.find(cafe_uuid))
                        .set((
                            cafes::average_rating.eq(aggregates.average_rating()),
                            cafes::rating_count.eq(rating_count),
                        ))
                        .execute(conn)
                        .await?;
                    Ok::<_, TxError>(aggregates)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err: TxError| match err {
                TxError::Database(error) => map_diesel_error(error),
                TxError::Rejected(error) => error,
            })?;
        debug!(%cafe_id, rating_count = aggregates.rating_count(), "stored cafe aggregates");
        Ok(aggregates)
    }

    async fn add_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        let context = WriteContext {
            user_id,
            cafe_id: None,
            rating_id: Some(*rating_id),
        };
        let rating_id = *rating_id;
        let vote = NewHelpfulVoteRow {
            rating_id: *rating_id.as_uuid(),
            user_id: *user_id.as_uuid(),
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                lock_rating(conn, rating_id).await?;
                let inserted = diesel::insert_into(rating_helpful_votes::table)
                    .values(&vote)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                let helpful_count = store_recount(conn, vote.rating_id).await?;
                Ok::<_, TxError>(HelpfulVoteChange {
                    helpful_count,
                    changed: inserted > 0,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|err: TxError| err.into_port_error(context))
    }

    async fn remove_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<HelpfulVoteChange, RatingRepositoryError> {
        let context = WriteContext {
            user_id,
            cafe_id: None,
            rating_id: Some(*rating_id),
        };
        let rating_id = *rating_id;
        let key = (*rating_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                lock_rating(conn, rating_id).await?;
                let deleted = diesel::delete(rating_helpful_votes::table.find(key))
                    .execute(conn)
                    .await?;
                let helpful_count = store_recount(conn, key.0).await?;
                Ok::<_, TxError>(HelpfulVoteChange {
                    helpful_count,
                    changed: deleted > 0,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(|err: TxError| err.into_port_error(context))
    }

    async fn has_helpful_vote(
        &self,
        rating_id: &RatingId,
        user_id: &UserId,
    ) -> Result<bool, RatingRepositoryError> {
        let key = (*rating_id.as_uuid(), *user_id.as_uuid());
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rating_exists: bool = diesel::select(exists(ratings::table.find(key.0)))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if !rating_exists {
            return Err(RatingRepositoryError::rating_not_found(
                rating_id.to_string(),
            ));
        }
        diesel::select(exists(rating_helpful_votes::table.find(key)))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
