//! Page-number pagination primitives shared by backend read paths.
//!
//! A [`PageRequest`] is the validated form of the `page`/`page_size` pair a
//! caller supplies. Pages are zero-based. A [`Page`] is the envelope returned
//! to callers: the window of items plus the total match count so clients can
//! render pagination controls without a second query.
//!
//! # Examples
//!
//! ```
//! use pagination::{Page, PageRequest};
//!
//! let request = PageRequest::new(1, 10).expect("valid paging");
//! assert_eq!(request.offset(), 10);
//!
//! let page = Page::from_window(vec!["k"; 5], request, 15);
//! assert!(!page.has_more());
//! assert_eq!(page.total_pages(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Largest page size accepted by [`PageRequest::new`].
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Errors raised while validating paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// Page size was zero or negative.
    #[error("page size must be positive, got {page_size}")]
    NonPositivePageSize {
        /// Rejected page size.
        page_size: i64,
    },
    /// Page size exceeded the configured ceiling.
    #[error("page size {page_size} exceeds the maximum of {max}")]
    PageSizeTooLarge {
        /// Rejected page size.
        page_size: i64,
        /// Configured ceiling.
        max: u32,
    },
    /// Page number was negative or not representable.
    #[error("page must be between 0 and {max}, got {page}", max = u32::MAX)]
    InvalidPage {
        /// Rejected page number.
        page: i64,
    },
}

/// Validated zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate a page request against [`DEFAULT_MAX_PAGE_SIZE`].
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError`] when `page_size <= 0`, when `page_size`
    /// exceeds the ceiling, or when `page` is negative.
    pub fn new(page: i64, page_size: i64) -> Result<Self, PaginationError> {
        Self::with_max_page_size(page, page_size, DEFAULT_MAX_PAGE_SIZE)
    }

    /// Validate a page request against an explicit page size ceiling.
    ///
    /// # Errors
    ///
    /// See [`PageRequest::new`].
    pub fn with_max_page_size(
        page: i64,
        page_size: i64,
        max_page_size: u32,
    ) -> Result<Self, PaginationError> {
        if page_size <= 0 {
            return Err(PaginationError::NonPositivePageSize { page_size });
        }
        let size = u32::try_from(page_size)
            .ok()
            .filter(|size| *size <= max_page_size)
            .ok_or(PaginationError::PageSizeTooLarge {
                page_size,
                max: max_page_size,
            })?;
        let page_number = u32::try_from(page).map_err(|_| PaginationError::InvalidPage { page })?;

        Ok(Self {
            page: page_number,
            page_size: size,
        })
    }

    /// Zero-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on the page.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of items skipped before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }

    /// Alias for [`PageRequest::page_size`] in query-building code.
    pub fn limit(&self) -> u32 {
        self.page_size
    }
}

/// A window of results plus the metadata needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    page: u32,
    page_size: u32,
    total_count: u64,
    total_pages: u64,
    has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from the items fetched for `request` and the total number
    /// of matches across all pages.
    ///
    /// Items beyond the requested page size are dropped so the envelope never
    /// exceeds the bound the caller asked for.
    pub fn from_window(mut items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        let limit = usize::try_from(request.page_size()).unwrap_or(usize::MAX);
        items.truncate(limit);

        let seen = request
            .offset()
            .saturating_add(u64::try_from(items.len()).unwrap_or(u64::MAX));
        Self {
            page: request.page(),
            page_size: request.page_size(),
            total_count,
            total_pages: total_count.div_ceil(u64::from(request.page_size())),
            has_more: seen < total_count,
            items,
        }
    }

    /// An empty first page.
    pub fn empty(request: PageRequest) -> Self {
        Self::from_window(Vec::new(), request, 0)
    }

    /// Items on this page.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consume the page, returning its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Zero-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Requested page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Total matches across every page.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Number of pages needed to show every match.
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    /// Whether pages after this one hold further matches.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Transform the items while keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}
