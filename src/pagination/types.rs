//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::types::QueryParams;

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available
    Continue {
        /// Query parameters to add to the base query
        query_params: QueryParams,
        /// Complete URL to request instead of the base URL.
        ///
        /// A next link already embeds every parameter the server needs, so
        /// when this is set the base query is not sent again.
        url: Option<String>,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params(params: QueryParams) -> Self {
        Self::Continue {
            query_params: params,
            url: None,
        }
    }

    /// Create a continuation that follows a complete URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Continue {
            query_params: Vec::new(),
            url: Some(url.into()),
        }
    }

    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// What the fetcher learned from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    /// Next-page link reported by the server, if any
    pub next_link: Option<String>,
    /// Number of entities or rows in the page
    pub records: usize,
    /// Body size in bytes
    pub bytes: usize,
}

impl PageSummary {
    /// Summary of a page with `records` entries and no next link
    pub fn new(records: usize) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Attach the server's next-page link
    #[must_use]
    pub fn with_next_link(mut self, link: Option<String>) -> Self {
        self.next_link = link;
        self
    }

    /// Attach the body size
    #[must_use]
    pub fn with_bytes(mut self, bytes: usize) -> Self {
        self.bytes = bytes;
        self
    }
}

/// Tracks pagination state during iteration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Current `$skip` value (for skip/top pagination)
    pub skip: u64,
    /// Total records fetched so far
    pub total_fetched: u64,
    /// Total body bytes downloaded so far
    pub bytes: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page
    pub fn record_page(&mut self, page: &PageSummary) {
        self.pages += 1;
        self.total_fetched += page.records as u64;
        self.bytes += page.bytes as u64;
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// Advance `$skip`
    pub fn add_skip(&mut self, amount: u64) {
        self.skip += amount;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Extra query parameters for the first request
    fn initial_params(&self, state: &PaginationState) -> QueryParams;

    /// Process a fetched page and determine if there's a next page
    fn process_page(&self, page: &PageSummary, state: &mut PaginationState) -> NextPage;
}
