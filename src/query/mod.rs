//! Query construction
//!
//! Builds `$filter` expressions (time windows, spatial intersection,
//! literal comparisons) and the ordered `$`-option query string accepted by
//! SensorThings services.

mod builder;
mod filter;

pub use builder::QueryBuilder;
pub use filter::{quote, validate_timestamp, validate_wkt, Filter, PHENOMENON_TIME};
