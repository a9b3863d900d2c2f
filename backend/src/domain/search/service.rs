//! Search orchestrator: validated, paginated cafe searches.

use std::sync::Arc;

use pagination::{DEFAULT_MAX_PAGE_SIZE, Page, PageRequest};
use tracing::debug;

use crate::domain::ports::CafeRepository;
use crate::domain::store_errors::map_cafe_store_error;
use crate::domain::{Cafe, CafeId, Error};

use super::filter::{CafeSearchRequest, NearbyArea, SortMode};

/// Cafe search service.
///
/// Stateless apart from the page size ceiling; clones share the store.
#[derive(Clone)]
pub struct CafeSearchService<C> {
    cafes: Arc<C>,
    max_page_size: u32,
}

impl<C> CafeSearchService<C> {
    /// Create a service with the default page size ceiling.
    pub fn new(cafes: Arc<C>) -> Self {
        Self {
            cafes,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Override the page size ceiling.
    #[must_use]
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    /// Largest page size this service accepts.
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size
    }
}

/// Validate paging input, mapping failures to `invalid_pagination`.
pub(crate) fn page_request(
    page: i64,
    page_size: i64,
    max_page_size: u32,
) -> Result<PageRequest, Error> {
    PageRequest::with_max_page_size(page, page_size, max_page_size)
        .map_err(|err| Error::invalid_pagination(err.to_string()))
}

impl<C> CafeSearchService<C>
where
    C: CafeRepository,
{
    /// Run a filtered search and return one page of matches.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` with reason `invalid_pagination` for a bad page or
    ///   page size; the store is not called.
    /// - `InvalidRequest` when the filter does not compile.
    /// - `ServiceUnavailable` when the store fails.
    pub async fn search(
        &self,
        request: &CafeSearchRequest,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Cafe>, Error> {
        let paging = page_request(page, page_size, self.max_page_size)?;
        let query = request.compile()?;
        debug!(
            criteria = query.predicate.criteria().len(),
            sort = ?query.sort,
            page = paging.page(),
            page_size = paging.page_size(),
            "searching cafes"
        );
        let matches = self
            .cafes
            .find_cafes(&query, paging.offset(), paging.limit())
            .await
            .map_err(map_cafe_store_error)?;
        Ok(Page::from_window(matches.cafes, paging, matches.total_count))
    }

    /// Active cafes ordered by average rating.
    ///
    /// # Errors
    ///
    /// See [`CafeSearchService::search`].
    pub async fn top_rated(&self, page: i64, page_size: i64) -> Result<Page<Cafe>, Error> {
        let request = CafeSearchRequest {
            sort: SortMode::TopRated,
            ..CafeSearchRequest::default()
        };
        self.search(&request, page, page_size).await
    }

    /// Active cafes, most recently listed first.
    ///
    /// # Errors
    ///
    /// See [`CafeSearchService::search`].
    pub async fn newest(&self, page: i64, page_size: i64) -> Result<Page<Cafe>, Error> {
        let request = CafeSearchRequest {
            sort: SortMode::Newest,
            ..CafeSearchRequest::default()
        };
        self.search(&request, page, page_size).await
    }

    /// Active cafes within `radius` degrees of a point on both axes.
    ///
    /// # Errors
    ///
    /// See [`CafeSearchService::search`]; an invalid centre or radius is an
    /// `InvalidRequest`.
    pub async fn near(
        &self,
        latitude: f64,
        longitude: f64,
        radius: f64,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Cafe>, Error> {
        let request = CafeSearchRequest {
            near: Some(NearbyArea {
                latitude,
                longitude,
                latitude_range: radius,
                longitude_range: radius,
            }),
            ..CafeSearchRequest::default()
        };
        self.search(&request, page, page_size).await
    }

    /// Fetch one cafe by id, active or not.
    ///
    /// # Errors
    ///
    /// `NotFound` with reason `cafe_not_found`, or `ServiceUnavailable`.
    pub async fn find_cafe(&self, cafe_id: &CafeId) -> Result<Cafe, Error> {
        debug!(%cafe_id, "fetching cafe");
        self.cafes
            .find_cafe_by_id(cafe_id)
            .await
            .map_err(map_cafe_store_error)?
            .ok_or_else(|| Error::cafe_not_found(cafe_id.to_string()))
    }
}
