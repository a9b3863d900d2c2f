//! PostgreSQL-backed cafe read adapter.
//!
//! Search compiles each [`Criterion`] into a clause on a boxed query:
//! substring criteria become escaped `ILIKE` patterns and every required
//! amenity adds one `id IN (subselect)` clause, giving AND semantics. The
//! count and the window run in one read-only repeatable-read transaction so
//! `total_count` and the page agree.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{CafeMatches, CafeRepository, CafeRepositoryError};
use crate::domain::{
    Amenity, Budget, Cafe, CafeDraft, CafeId, CafeQuery, CafeRatingAggregates, Contact,
    Coordinates, Criterion, DayOfWeek, Location, MenuCategory, MenuItem, MenuItemDraft,
    MenuItemId, OperatingHours, SortMode, UserId,
};

use super::diesel_helpers::{
    contains_pattern, count_from_db, is_connection_error, map_diesel_error_message,
    map_pool_error_message, offset_for_db,
};
use super::models::{CafeAmenityRow, CafeRow, MenuItemRow, OperatingHoursRow};
use super::pool::{DbPool, PoolError};
use super::schema::{cafe_amenities, cafe_operating_hours, cafes, menu_items};

/// Diesel-backed implementation of the cafe read port.
#[derive(Clone)]
pub struct DieselCafeRepository {
    pool: DbPool,
}

impl DieselCafeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CafeRepositoryError {
    CafeRepositoryError::connection(map_pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> CafeRepositoryError {
    let message = map_diesel_error_message(&error, "cafe read");
    if is_connection_error(&error) {
        CafeRepositoryError::connection(message)
    } else {
        CafeRepositoryError::query(message)
    }
}

type BoxedCafeQuery = cafes::BoxedQuery<'static, Pg>;

fn filtered(query: &CafeQuery) -> BoxedCafeQuery {
    query
        .predicate
        .criteria()
        .iter()
        .fold(cafes::table.into_boxed(), |sql, criterion| match criterion {
            Criterion::Active => sql.filter(cafes::is_active.eq(true)),
            Criterion::CityContains(needle) => {
                sql.filter(cafes::city.ilike(contains_pattern(needle)))
            }
            Criterion::StateContains(needle) => {
                sql.filter(cafes::state.ilike(contains_pattern(needle)))
            }
            Criterion::MinBudgetAtLeast(min) => sql.filter(cafes::min_budget.ge(*min)),
            Criterion::MaxBudgetAtMost(max) => sql.filter(cafes::max_budget.le(*max)),
            Criterion::TermMatches(needle) => {
                let pattern = contains_pattern(needle);
                sql.filter(
                    cafes::name
                        .ilike(pattern.clone())
                        .or(cafes::description.ilike(pattern.clone()))
                        .or(cafes::city.ilike(pattern)),
                )
            }
            Criterion::HasAmenity(amenity) => sql.filter(
                cafes::id.eq_any(
                    cafe_amenities::table
                        .filter(cafe_amenities::amenity.eq(amenity.as_str()))
                        .select(cafe_amenities::cafe_id),
                ),
            ),
            Criterion::WithinBox(area) => {
                let centre = area.centre();
                let (lat, lng) = (centre.latitude(), centre.longitude());
                sql.filter(cafes::latitude.between(
                    lat - area.latitude_range(),
                    lat + area.latitude_range(),
                ))
                .filter(cafes::longitude.between(
                    lng - area.longitude_range(),
                    lng + area.longitude_range(),
                ))
            }
        })
}

fn ordered(sql: BoxedCafeQuery, sort: SortMode) -> BoxedCafeQuery {
    match sort {
        SortMode::TopRated => sql.order_by((
            cafes::average_rating.desc(),
            cafes::rating_count.desc(),
            cafes::id.asc(),
        )),
        SortMode::Newest => sql.order_by((cafes::created_at.desc(), cafes::id.desc())),
        SortMode::Default => sql.order_by(cafes::id.asc()),
        SortMode::BudgetLowest => sql.order_by((cafes::min_budget.asc(), cafes::id.asc())),
        SortMode::BudgetHighest => sql.order_by((cafes::max_budget.desc(), cafes::id.asc())),
    }
}

/// Cafe rows plus every child row for them.
struct CafeRows {
    cafes: Vec<CafeRow>,
    menu: Vec<MenuItemRow>,
    amenities: Vec<CafeAmenityRow>,
    hours: Vec<OperatingHoursRow>,
}

async fn load_children(
    conn: &mut AsyncPgConnection,
    cafes: Vec<CafeRow>,
) -> QueryResult<CafeRows> {
    let ids: Vec<Uuid> = cafes.iter().map(|row| row.id).collect();
    if ids.is_empty() {
        return Ok(CafeRows {
            cafes,
            menu: Vec::new(),
            amenities: Vec::new(),
            hours: Vec::new(),
        });
    }
    let menu = menu_items::table
        .filter(menu_items::cafe_id.eq_any(&ids))
        .order_by((menu_items::cafe_id, menu_items::position))
        .select(MenuItemRow::as_select())
        .load(conn)
        .await?;
    let amenities = cafe_amenities::table
        .filter(cafe_amenities::cafe_id.eq_any(&ids))
        .select(CafeAmenityRow::as_select())
        .load(conn)
        .await?;
    let hours = cafe_operating_hours::table
        .filter(cafe_operating_hours::cafe_id.eq_any(&ids))
        .select(OperatingHoursRow::as_select())
        .load(conn)
        .await?;
    Ok(CafeRows {
        cafes,
        menu,
        amenities,
        hours,
    })
}

// ---------------------------------------------------------------------------
// Row-to-domain converters
// ---------------------------------------------------------------------------

fn row_to_menu_item(row: MenuItemRow) -> Result<MenuItem, String> {
    let category = MenuCategory::from_str(&row.category).map_err(|err| err.to_string())?;
    MenuItem::new(MenuItemDraft {
        id: MenuItemId::from_uuid(row.id),
        name: row.name,
        description: row.description,
        price: row.price,
        category,
        image: row.image,
    })
    .map_err(|err| err.to_string())
}

fn row_to_hours(row: &OperatingHoursRow) -> Result<(DayOfWeek, OperatingHours), String> {
    let day = DayOfWeek::from_str(&row.day_of_week).map_err(|err| err.to_string())?;
    let hours = OperatingHours::from_parts(day, row.open_time, row.close_time, row.is_closed)
        .map_err(|err| err.to_string())?;
    Ok((day, hours))
}

#[derive(Default)]
struct CafeChildren {
    menu: Vec<MenuItem>,
    amenities: BTreeSet<Amenity>,
    hours: BTreeMap<DayOfWeek, OperatingHours>,
}

fn row_to_cafe(row: CafeRow, children: CafeChildren) -> Result<Cafe, String> {
    let rating_count = u32::try_from(row.rating_count)
        .map_err(|_| format!("negative rating_count in database: {}", row.rating_count))?;
    let coordinates =
        Coordinates::new(row.latitude, row.longitude).map_err(|err| err.to_string())?;
    let budget = Budget::new(row.min_budget, row.max_budget).map_err(|err| err.to_string())?;
    Cafe::new(CafeDraft {
        id: CafeId::from_uuid(row.id),
        name: row.name,
        description: row.description,
        owner_id: UserId::from_uuid(row.owner_id),
        images: row.images,
        location: Location {
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            coordinates,
        },
        contact: Contact {
            phone: row.phone,
            email: row.email,
            website: row.website,
        },
        menu: children.menu,
        amenities: children.amenities,
        operating_hours: children.hours,
        budget,
        rating_aggregates: CafeRatingAggregates::new(row.average_rating, rating_count),
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| err.to_string())
}

fn assemble(rows: CafeRows) -> Result<Vec<Cafe>, CafeRepositoryError> {
    let CafeRows {
        cafes,
        menu,
        amenities,
        hours,
    } = rows;
    let mut children: HashMap<Uuid, CafeChildren> = HashMap::new();
    for row in menu {
        let cafe_id = row.cafe_id;
        let item = row_to_menu_item(row).map_err(CafeRepositoryError::query)?;
        children.entry(cafe_id).or_default().menu.push(item);
    }
    for row in amenities {
        let amenity = Amenity::from_str(&row.amenity)
            .map_err(|err| CafeRepositoryError::query(err.to_string()))?;
        children.entry(row.cafe_id).or_default().amenities.insert(amenity);
    }
    for row in &hours {
        let (day, entry) = row_to_hours(row).map_err(CafeRepositoryError::query)?;
        children.entry(row.cafe_id).or_default().hours.insert(day, entry);
    }
    cafes
        .into_iter()
        .map(|row| {
            let own = children.remove(&row.id).unwrap_or_default();
            row_to_cafe(row, own).map_err(CafeRepositoryError::query)
        })
        .collect()
}

#[async_trait]
impl CafeRepository for DieselCafeRepository {
    async fn find_cafe_by_id(&self, cafe_id: &CafeId) -> Result<Option<Cafe>, CafeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *cafe_id.as_uuid();
        let rows = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    let found: Vec<CafeRow> = cafes::table
                        .find(id)
                        .select(CafeRow::as_select())
                        .load(conn)
                        .await?;
                    load_children(conn, found).await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble(rows)?.into_iter().next())
    }

    async fn find_cafes(
        &self,
        query: &CafeQuery,
        offset: u64,
        limit: u32,
    ) -> Result<CafeMatches, CafeRepositoryError> {
        let offset_i64 = offset_for_db(offset).map_err(CafeRepositoryError::query)?;
        let limit_i64 = i64::from(limit);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (total, rows) = conn
            .build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| {
                async move {
                    let total: i64 = filtered(query).count().get_result(conn).await?;
                    let window: Vec<CafeRow> = ordered(filtered(query), query.sort)
                        .offset(offset_i64)
                        .limit(limit_i64)
                        .select(CafeRow::as_select())
                        .load(conn)
                        .await?;
                    let rows = load_children(conn, window).await?;
                    Ok::<_, diesel::result::Error>((total, rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let total_count = count_from_db(total, "cafe count").map_err(CafeRepositoryError::query)?;
        debug!(total_count, offset, limit, sort = ?query.sort, "cafe search window loaded");
        Ok(CafeMatches {
            cafes: assemble(rows)?,
            total_count,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion and query-shape checks; no database required.
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use diesel::debug_query;
    use rstest::rstest;
    use rust_decimal::Decimal;

    use crate::domain::{CafeSearchRequest, NearbyArea};

    fn cafe_row() -> CafeRow {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid timestamp");
        CafeRow {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Bean There".to_owned(),
            description: "Pour-overs".to_owned(),
            images: vec!["front.jpg".to_owned()],
            address: "1 Main St".to_owned(),
            city: "Austin".to_owned(),
            state: "TX".to_owned(),
            zip_code: "78701".to_owned(),
            latitude: 30.27,
            longitude: -97.74,
            phone: "555-0100".to_owned(),
            email: "hello@example.com".to_owned(),
            website: None,
            min_budget: Decimal::new(500, 2),
            max_budget: Decimal::new(2000, 2),
            average_rating: Decimal::new(45, 1),
            rating_count: 4,
            is_active: true,
            created_at,
            updated_at: created_at,
        }
    }

    fn sql_for(request: &CafeSearchRequest) -> String {
        let query = request.compile().expect("request compiles");
        debug_query::<Pg, _>(&ordered(filtered(&query), query.sort)).to_string()
    }

    #[rstest]
    fn rows_assemble_into_cafes_with_children() {
        let row = cafe_row();
        let cafe_id = row.id;
        let rows = CafeRows {
            cafes: vec![row],
            menu: vec![MenuItemRow {
                id: Uuid::new_v4(),
                cafe_id,
                name: "Flat white".to_owned(),
                description: None,
                price: Decimal::new(450, 2),
                category: "BEVERAGE".to_owned(),
                image: None,
            }],
            amenities: vec![CafeAmenityRow {
                cafe_id,
                amenity: "WIFI".to_owned(),
            }],
            hours: vec![OperatingHoursRow {
                cafe_id,
                day_of_week: "MONDAY".to_owned(),
                open_time: NaiveTime::from_hms_opt(7, 0, 0),
                close_time: NaiveTime::from_hms_opt(18, 0, 0),
                is_closed: false,
            }],
        };

        let cafes = assemble(rows).expect("rows convert");
        let cafe = <[_]>::first(&cafes).expect("one cafe");
        assert_eq!(cafe.menu().len(), 1);
        assert!(cafe.amenities().contains(&Amenity::Wifi));
        assert!(cafe.operating_hours().contains_key(&DayOfWeek::Monday));
        assert_eq!(cafe.rating_aggregates().average_rating(), Decimal::new(450, 2));
    }

    #[rstest]
    fn unknown_amenity_is_a_query_error() {
        let row = cafe_row();
        let rows = CafeRows {
            amenities: vec![CafeAmenityRow {
                cafe_id: row.id,
                amenity: "HOT_TUB".to_owned(),
            }],
            cafes: vec![row],
            menu: Vec::new(),
            hours: Vec::new(),
        };
        let err = assemble(rows).expect_err("unknown amenity");
        assert!(matches!(err, CafeRepositoryError::Query { .. }));
    }

    #[rstest]
    fn inverted_budget_row_is_rejected() {
        let mut row = cafe_row();
        row.min_budget = Decimal::new(3000, 2);
        let rows = CafeRows {
            cafes: vec![row],
            menu: Vec::new(),
            amenities: Vec::new(),
            hours: Vec::new(),
        };
        assert!(assemble(rows).is_err());
    }

    #[rstest]
    fn each_amenity_adds_its_own_subselect() {
        let request = CafeSearchRequest {
            amenities: [Amenity::Wifi, Amenity::Parking].into_iter().collect(),
            ..CafeSearchRequest::default()
        };
        let sql = sql_for(&request);
        assert_eq!(sql.matches("\"cafe_amenities\".\"amenity\" = ").count(), 2);
    }

    #[rstest]
    fn substring_filters_use_escaped_ilike() {
        let request = CafeSearchRequest {
            city: Some("aus_tin".to_owned()),
            ..CafeSearchRequest::default()
        };
        let sql = sql_for(&request);
        assert!(sql.contains("ILIKE"), "{sql}");
        assert!(sql.contains("%aus\\\\_tin%") || sql.contains("%aus\\_tin%"), "{sql}");
    }

    #[rstest]
    fn bounding_box_becomes_two_ranges() {
        let request = CafeSearchRequest {
            near: Some(NearbyArea {
                latitude: 30.0,
                longitude: -97.0,
                latitude_range: 0.5,
                longitude_range: 0.5,
            }),
            ..CafeSearchRequest::default()
        };
        let sql = sql_for(&request);
        assert_eq!(sql.matches("BETWEEN").count(), 2, "{sql}");
    }
}
