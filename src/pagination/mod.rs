//! Pagination module
//!
//! Supports: `@iot.nextLink` following, `$skip`/`$top`, single page
//!
//! # Overview
//!
//! SensorThings services page large collections. JSON pages carry an
//! absolute `@iot.nextLink` while more entities remain; CSV pages carry
//! nothing, so they are paged explicitly with `$skip`/`$top`. Each strategy
//! turns a page summary into the next request, or reports the collection as
//! exhausted.

mod strategies;
mod types;

pub use strategies::{NextLinkPaginator, SinglePagePaginator, SkipTopPaginator};
pub use types::{NextPage, PageSummary, PaginationState, Paginator};

#[cfg(test)]
mod tests;
