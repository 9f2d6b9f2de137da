// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # sta-explorer
//!
//! Query and inspect OGC SensorThings API services.
//!
//! ## Features
//!
//! - **Paginated fetching**: follows `@iot.nextLink` up to a ceiling, pages CSV with `$skip`/`$top`
//! - **Query construction**: `$expand`, `$filter`, `$orderby`, `$select`, `$resultFormat`
//! - **Filters**: time windows, `geo.intersects` over WKT, literal comparisons
//! - **Entity access**: typed path lookups, GeoJSON points, duplicate timestamp detection
//! - **Polite HTTP**: timeouts, retry with backoff, optional rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sta_explorer::engine::{CollectionFetcher, FetchConfig};
//! use sta_explorer::http::HttpClient;
//! use sta_explorer::query::{Filter, QueryBuilder, PHENOMENON_TIME};
//! use sta_explorer::types::SortOrder;
//!
//! #[tokio::main]
//! async fn main() -> sta_explorer::Result<()> {
//!     let mut fetcher = CollectionFetcher::new(HttpClient::new()?);
//!
//!     let query = QueryBuilder::new()
//!         .order_by(PHENOMENON_TIME, SortOrder::Asc)
//!         .filter(Filter::time_range(
//!             PHENOMENON_TIME,
//!             Some("2020-09-14T19:00:00.000Z"),
//!             Some("2020-09-14T21:00:00.000Z"),
//!         )?)
//!         .build();
//!
//!     let outcome = fetcher
//!         .fetch_collection(
//!             "https://arctic-sta.gswlab.ca/FROST-Server/v1.0/Datastreams(46)/Observations",
//!             &query,
//!             &FetchConfig::new().with_ceiling(500),
//!         )
//!         .await?;
//!
//!     println!("{} Observations", outcome.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          CLI / Explorer                         │
//! │  things  observations  features  bandwidth  stations  phenomena │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Query   │  Engine   │   Paginate    │  Decode   │   Entity    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ $filter  │ Ceiling   │ Next link     │ JSON page │ Field paths │
//! │ $expand  │ Stats     │ $skip/$top    │ CSV       │ GeoJSON     │
//! │ $orderby │           │ Single page   │           │ Duplicates  │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//!                                │
//!                    HTTP (Transport, retry, rate limit)
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP transport with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Response decoders (JSON, CSV)
pub mod decode;

/// Paginated collection fetcher
pub mod engine;

/// Schema-less entity access
pub mod entity;

/// `$filter` and query option construction
pub mod query;

/// Service and HTTP configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ExplorerConfig;
pub use engine::{CollectionFetcher, FetchConfig, FetchOutcome};
pub use entity::EntityExt;
pub use http::{HttpClient, Transport};
pub use query::{Filter, QueryBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
