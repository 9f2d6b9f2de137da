//! Engine types
//!
//! Fetch configuration, outcomes, and statistics.

use crate::decode::CsvTable;
use crate::pagination::PaginationState;
use crate::types::Entity;
use serde::Serialize;

/// Configuration for one fetch
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Stop following pages once at least this many entities were fetched.
    ///
    /// The last page is kept whole, so the result may exceed the ceiling.
    pub ceiling: Option<usize>,
    /// `$top` used when paging CSV with `$skip`/`$top`
    pub csv_page_size: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ceiling: None,
            csv_page_size: 100,
        }
    }
}

impl FetchConfig {
    /// Create a new fetch config (no ceiling)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entity ceiling
    #[must_use]
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Set the CSV page size
    #[must_use]
    pub fn with_csv_page_size(mut self, size: u32) -> Self {
        self.csv_page_size = size;
        self
    }

    /// Whether `fetched` entities satisfy the ceiling
    pub fn ceiling_reached(&self, fetched: u64) -> bool {
        self.ceiling.is_some_and(|c| fetched >= c as u64)
    }
}

/// Statistics from fetching
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    /// Requests issued
    pub pages: u32,
    /// Entities or rows received
    pub records: u64,
    /// Body bytes downloaded
    pub bytes: u64,
}

impl FetchStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in another fetch
    pub fn add(&mut self, other: FetchStats) {
        self.pages += other.pages;
        self.records += other.records;
        self.bytes += other.bytes;
    }

    /// Downloaded size in kilobytes, rounded up
    pub fn kilobytes(&self) -> u64 {
        self.bytes.div_ceil(1000)
    }
}

impl From<&PaginationState> for FetchStats {
    fn from(state: &PaginationState) -> Self {
        Self {
            pages: state.pages,
            records: state.total_fetched,
            bytes: state.bytes,
        }
    }
}

/// Entities accumulated across the pages of a JSON collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Entities in request order
    pub entities: Vec<Entity>,
    /// `@iot.count` from the first page, when the server computed it
    pub total_count: Option<u64>,
    /// Statistics for this fetch
    pub stats: FetchStats,
}

impl FetchOutcome {
    /// Number of accumulated entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether nothing was fetched
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Rows accumulated across the pages of a CSV collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvOutcome {
    /// Header plus all rows in request order
    pub table: CsvTable,
    /// Statistics for this fetch
    pub stats: FetchStats,
}
