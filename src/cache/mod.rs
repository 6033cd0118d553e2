//! Paginated in-memory cache for listed entities.
//!
//! This module provides an entity-agnostic page cache that:
//! - Keeps fetched pages keyed by page number with a fixed 60 s TTL
//! - Applies search, status, and sort criteria over the full backend result
//! - Clears every page when the criteria change
//! - Records fetch failures per page without discarding older data

mod clock;
mod filters;
mod page;
mod store;
mod traits;

pub use filters::{ListFilters, SortOrder, SortSpec};
pub use store::PageCache;
pub use traits::{compare_text, Listable};
