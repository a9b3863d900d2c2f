//! Cafe search: the filter compiler and the paginating orchestrator.

mod filter;
mod service;

pub use filter::{
    BoundingBox, CafePredicate, CafeQuery, CafeSearchRequest, Criterion, NearbyArea, SortMode,
};
pub use service::CafeSearchService;
pub(crate) use service::page_request;
