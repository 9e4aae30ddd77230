//! DealBridge search crate
//!
//! Buyer-facing discovery over published proposals: filtered queries,
//! relevance-scored full-text search, pagination and capability-aware
//! result projection.

pub mod engine;
pub mod filters;
pub mod pagination;
pub mod projection;

pub use engine::{ScoredResult, SearchEngine, SearchResults};
pub use filters::{visibility_baseline, SearchFilters};
pub use pagination::{PageInfo, PageWindow, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use projection::{project, revenue_bucket, ProposalView, TeaserView};
