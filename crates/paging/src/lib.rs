//! Cursor pagination for cycle-sync.
//!
//! A [`PageCollector`] repeatedly calls a caller-supplied page-fetch function,
//! threading the `end_cursor` of each page into the next call, until the API
//! reports there are no more pages. Items are returned in fetch order, either
//! all at once ([`PageCollector::collect_all`]) or incrementally
//! ([`PageCollector::into_stream`]).
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The collector knows nothing about GraphQL or HTTP:
//! it sequences calls to whatever fetch function the adapter supplies and maps
//! the adapter's [`domain::ExecutionError`] into [`domain::PaginationError`].

mod collector;
mod options;

pub use collector::{collect_all_pages, CollectorState, PageCollector};
pub use options::{CollectorOptions, DEFAULT_MAX_PAGES};
