//! Entity field extraction
//!
//! SensorThings entities are read without a client-side schema. This module
//! provides path access that fails with a typed error naming the field and
//! the entity, GeoJSON point reading, and time series helpers.

mod geo;
mod path;
mod series;

pub use geo::{geometry_at, read_geometry, GeoPoint, Geometry};
pub use path::EntityExt;
pub use series::{dedup_by_timestamp, find_duplicate_timestamps, samples, DuplicateTimestamp, Sample};
