//! Reports printed by the CLI subcommands
//!
//! Each report is built from fetched entities, printed with `Display` for
//! `--format pretty` and serialized for `--format json`.

use crate::engine::FetchStats;
use crate::entity::{read_geometry, DuplicateTimestamp, EntityExt, GeoPoint, Geometry, Sample};
use crate::error::Result;
use crate::types::{Entity, JsonValue, IOT_ID};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Things / Stations
// ============================================================================

/// A Thing with the position of its first Location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThingSummary {
    pub id: Option<JsonValue>,
    pub name: String,
    pub description: String,
    pub location: Option<GeoPoint>,
    /// GeoJSON type of a Location that is not a point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_geometry: Option<String>,
}

impl ThingSummary {
    /// Summarize `thing`, with the GeoJSON `location` of its first Location when known
    pub fn new(thing: &Entity, location: Option<&JsonValue>) -> Result<Self> {
        let geometry = location
            .map(|value| read_geometry(value, "location"))
            .transpose()?;

        let (location, unhandled_geometry) = match geometry {
            Some(Geometry::Point(point)) => (Some(point), None),
            Some(Geometry::Unhandled(kind)) => (None, Some(kind)),
            None => (None, None),
        };

        Ok(Self {
            id: thing.get(IOT_ID).cloned(),
            name: thing.str_field("name")?.to_string(),
            description: optional_str(thing, "description"),
            location,
            unhandled_geometry,
        })
    }
}

/// Things listing (also used for the spatial station search)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThingsReport {
    /// `@iot.count` reported by the server
    pub server_count: Option<u64>,
    pub things: Vec<ThingSummary>,
    pub stats: FetchStats,
}

impl fmt::Display for ThingsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(count) = self.server_count {
            writeln!(f, "Server has {count} Things.")?;
        }
        writeln!(f, "Found {} entities:", self.things.len())?;

        for thing in &self.things {
            writeln!(f, "Thing: {}", thing.name)?;
            writeln!(f, "{}", thing.description)?;
            match (&thing.location, &thing.unhandled_geometry) {
                (Some(point), _) => writeln!(f, "Located at: {point}")?,
                (None, Some(kind)) => writeln!(f, "Warning: unhandled GeoJSON type: {kind}")?,
                (None, None) => writeln!(f, "No Location")?,
            }
            writeln!(f)?;
        }

        write!(f, "{}", RequestLine(&self.stats))
    }
}

// ============================================================================
// Observations
// ============================================================================

/// Observations of one Datastream as `(phenomenonTime, result)` samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationsReport {
    pub datastream: String,
    /// `@iot.count` reported with the first page
    pub total_count: Option<u64>,
    /// Observations received, before any deduplication
    pub downloaded: usize,
    pub duplicates: Vec<DuplicateTimestamp>,
    pub deduplicated: bool,
    pub samples: Vec<Sample>,
    pub stats: FetchStats,
}

impl fmt::Display for ObservationsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total_count {
            Some(total) => writeln!(
                f,
                "Found {} Observations of {total} matching.",
                self.downloaded
            )?,
            None => writeln!(f, "Downloaded {} Observations in total.", self.downloaded)?,
        }

        if !self.duplicates.is_empty() {
            writeln!(
                f,
                "Warning: {} phenomenonTime values are shared by more than one Observation:",
                self.duplicates.len()
            )?;
            for duplicate in &self.duplicates {
                writeln!(
                    f,
                    "  {} ({} Observations)",
                    duplicate.timestamp,
                    duplicate.indices.len()
                )?;
            }
            if self.deduplicated {
                writeln!(f, "Kept the first of each, {} remain.", self.samples.len())?;
            }
        }

        for sample in &self.samples {
            writeln!(f, "{}, {}", sample.time, display_value(&sample.result))?;
        }

        write!(f, "{}", RequestLine(&self.stats))
    }
}

// ============================================================================
// Features of Interest
// ============================================================================

/// One Observation with the position of its Feature of Interest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub time: String,
    pub result: JsonValue,
    pub location: Option<GeoPoint>,
    /// GeoJSON type of a feature that is not a point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhandled_geometry: Option<String>,
}

impl FeatureRow {
    /// Read an Observation carrying an expanded `FeatureOfInterest`
    pub fn new(observation: &Entity) -> Result<Self> {
        let feature = observation.field("FeatureOfInterest/feature")?;
        let (location, unhandled_geometry) =
            match read_geometry(feature, "FeatureOfInterest/feature")? {
                Geometry::Point(point) => (Some(point), None),
                Geometry::Unhandled(kind) => (None, Some(kind)),
            };

        Ok(Self {
            time: observation.str_field("phenomenonTime")?.to_string(),
            result: observation.field("result")?.clone(),
            location,
            unhandled_geometry,
        })
    }
}

/// Latest Observations with their positions, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturesReport {
    pub total_count: Option<u64>,
    pub unit: String,
    pub rows: Vec<FeatureRow>,
    pub stats: FetchStats,
}

impl fmt::Display for FeaturesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.total_count {
            Some(total) => writeln!(
                f,
                "Downloaded {} Observations of the {total} matching Observations.",
                self.rows.len()
            )?,
            None => writeln!(f, "Downloaded {} Observations.", self.rows.len())?,
        }

        for row in &self.rows {
            if let Some(kind) = &row.unhandled_geometry {
                writeln!(f, "Warning: unhandled GeoJSON type: {kind}")?;
            }
            write!(f, "{}, {} {}", row.time, display_value(&row.result), self.unit)?;
            if let Some(point) = &row.location {
                write!(f, ", {point}")?;
            }
            writeln!(f)?;
        }

        write!(f, "{}", RequestLine(&self.stats))
    }
}

// ============================================================================
// Bandwidth
// ============================================================================

/// Size of one way of downloading the same Observations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub label: String,
    pub observations: usize,
    pub pages: u32,
    pub bytes: u64,
    pub kilobytes: u64,
}

impl TransferSummary {
    pub fn new(label: impl Into<String>, observations: usize, stats: &FetchStats) -> Self {
        Self {
            label: label.into(),
            observations,
            pages: stats.pages,
            bytes: stats.bytes,
            kilobytes: stats.kilobytes(),
        }
    }
}

/// Download sizes of full JSON, `$select` JSON and CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandwidthReport {
    pub transfers: Vec<TransferSummary>,
}

impl fmt::Display for BandwidthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.transfers {
            writeln!(
                f,
                "{}: downloaded {} Observations in total, {} kilobytes ({} requests).",
                t.label, t.observations, t.kilobytes, t.pages
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Phenomena
// ============================================================================

/// An Observed Property candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySummary {
    pub id: Option<JsonValue>,
    pub name: String,
    pub description: String,
    pub definition: String,
}

impl PropertySummary {
    pub fn new(property: &Entity) -> Result<Self> {
        Ok(Self {
            id: property.get(IOT_ID).cloned(),
            name: property.str_field("name")?.to_string(),
            description: optional_str(property, "description"),
            definition: optional_str(property, "definition"),
        })
    }
}

/// A Datastream matched by the spatial search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastreamSummary {
    pub id: Option<JsonValue>,
    pub name: String,
    pub description: String,
}

impl DatastreamSummary {
    pub fn new(datastream: &Entity) -> Result<Self> {
        Ok(Self {
            id: datastream.get(IOT_ID).cloned(),
            name: datastream.str_field("name")?.to_string(),
            description: optional_str(datastream, "description"),
        })
    }
}

/// Observed Properties by name, then Datastreams of one of them in an area
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhenomenaReport {
    pub observed_properties: Vec<PropertySummary>,
    /// URL of the Observed Property whose Datastreams were searched
    pub selected: Option<String>,
    pub datastreams: Vec<DatastreamSummary>,
    pub stats: FetchStats,
}

impl fmt::Display for PhenomenaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Found {} Observed Properties:",
            self.observed_properties.len()
        )?;
        for op in &self.observed_properties {
            writeln!(f, "Observed Property: {}", op.name)?;
            writeln!(f, "\t{}", op.description)?;
            writeln!(f, "\t{}", op.definition)?;
            writeln!(f)?;
        }

        match &self.selected {
            Some(url) => {
                writeln!(f, "Searching Datastreams of {url}")?;
                writeln!(f, "Found {} Datastreams", self.datastreams.len())?;
                for ds in &self.datastreams {
                    writeln!(f, "Datastream: {}", ds.name)?;
                    writeln!(f, "\t{}", ds.description)?;
                    writeln!(f)?;
                }
            }
            None => writeln!(f, "No Observed Property to search Datastreams for.")?,
        }

        write!(f, "{}", RequestLine(&self.stats))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Trailing request/size line of pretty reports
struct RequestLine<'a>(&'a FetchStats);

impl fmt::Display for RequestLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "({} requests, {} kilobytes)",
            self.0.pages,
            self.0.kilobytes()
        )
    }
}

fn optional_str(entity: &Entity, field: &str) -> String {
    entity
        .get(field)
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Strings print bare; everything else as JSON
fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
