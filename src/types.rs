//! Common types used throughout sta-explorer
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single SensorThings entity (Thing, Location, Datastream, Observation, ...).
///
/// Entities are schema-less on the client: fields are read by name and may be absent.
pub type Entity = JsonObject;

/// Ordered query parameters (name, value)
pub type QueryParams = Vec<(String, String)>;

// ============================================================================
// Well-known response fields
// ============================================================================

/// Total number of entities matching the request
pub const IOT_COUNT: &str = "@iot.count";

/// Absolute URL of the next page of a collection
pub const IOT_NEXT_LINK: &str = "@iot.nextLink";

/// Server-assigned entity identifier
pub const IOT_ID: &str = "@iot.id";

/// Suffix of fields holding the URL of a related collection
pub const NAVIGATION_LINK_SUFFIX: &str = "@iot.navigationLink";

// ============================================================================
// Entity Sets
// ============================================================================

/// Collections exposed at the root of a SensorThings service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntitySet {
    Things,
    Locations,
    HistoricalLocations,
    Datastreams,
    Sensors,
    Observations,
    ObservedProperties,
    FeaturesOfInterest,
}

impl EntitySet {
    /// Path segment of this collection
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitySet::Things => "Things",
            EntitySet::Locations => "Locations",
            EntitySet::HistoricalLocations => "HistoricalLocations",
            EntitySet::Datastreams => "Datastreams",
            EntitySet::Sensors => "Sensors",
            EntitySet::Observations => "Observations",
            EntitySet::ObservedProperties => "ObservedProperties",
            EntitySet::FeaturesOfInterest => "FeaturesOfInterest",
        }
    }

    /// URL of a single entity in this collection, e.g. `.../Datastreams(46)`
    pub fn entity_url(&self, service_url: &str, id: &str) -> String {
        format!("{}/{}({id})", service_url.trim_end_matches('/'), self.as_str())
    }

    /// URL of this collection at the service root
    pub fn collection_url(&self, service_url: &str) -> String {
        format!("{}/{}", service_url.trim_end_matches('/'), self.as_str())
    }
}

impl fmt::Display for EntitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Sort direction for `$orderby`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
