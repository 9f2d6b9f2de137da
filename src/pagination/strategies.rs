//! Pagination strategy implementations
//!
//! Each strategy handles one way a SensorThings service can be paged.

use super::types::{NextPage, PageSummary, PaginationState, Paginator};
use crate::types::{OptionStringExt, QueryParams};

// ============================================================================
// Next Link Pagination
// ============================================================================

/// Follows the `@iot.nextLink` URL the server puts in each JSON page.
///
/// The link is a complete URL; it is requested as-is with no extra parameters.
#[derive(Debug, Clone, Default)]
pub struct NextLinkPaginator;

impl NextLinkPaginator {
    /// Create a new next link paginator
    pub fn new() -> Self {
        Self
    }
}

impl Paginator for NextLinkPaginator {
    fn initial_params(&self, _state: &PaginationState) -> QueryParams {
        Vec::new()
    }

    fn process_page(&self, page: &PageSummary, state: &mut PaginationState) -> NextPage {
        state.record_page(page);

        match page.next_link.clone().none_if_empty() {
            Some(link) => NextPage::with_url(link),
            None => {
                state.mark_done();
                NextPage::Done
            }
        }
    }
}

// ============================================================================
// Skip/Top Pagination
// ============================================================================

/// `$skip`/`$top` pagination for bodies that carry no next link (CSV).
///
/// Requests `$top` entities per page and advances `$skip` by the number of
/// rows received. A short or empty page ends the collection.
#[derive(Debug, Clone)]
pub struct SkipTopPaginator {
    /// Number of entities requested per page
    pub top: u32,
}

impl SkipTopPaginator {
    /// Create a new skip/top paginator
    pub fn new(top: u32) -> Self {
        Self { top: top.max(1) }
    }

    fn params(&self, skip: u64) -> QueryParams {
        vec![
            ("$top".to_string(), self.top.to_string()),
            ("$skip".to_string(), skip.to_string()),
        ]
    }
}

impl Default for SkipTopPaginator {
    fn default() -> Self {
        // FROST-Server's default page size
        Self::new(100)
    }
}

impl Paginator for SkipTopPaginator {
    fn initial_params(&self, state: &PaginationState) -> QueryParams {
        self.params(state.skip)
    }

    fn process_page(&self, page: &PageSummary, state: &mut PaginationState) -> NextPage {
        state.record_page(page);

        if page.records < self.top as usize {
            state.mark_done();
            return NextPage::Done;
        }

        state.add_skip(page.records as u64);
        NextPage::with_params(self.params(state.skip))
    }
}

// ============================================================================
// Single Page
// ============================================================================

/// No pagination - only the first page the server returns
#[derive(Debug, Clone, Default)]
pub struct SinglePagePaginator;

impl Paginator for SinglePagePaginator {
    fn initial_params(&self, _state: &PaginationState) -> QueryParams {
        Vec::new()
    }

    fn process_page(&self, page: &PageSummary, state: &mut PaginationState) -> NextPage {
        state.record_page(page);
        state.mark_done();
        NextPage::Done
    }
}
