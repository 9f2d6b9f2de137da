//! GeoJSON geometry reading
//!
//! Locations and Features of Interest carry GeoJSON. Only points are turned
//! into coordinates; any other geometry is reported back to the caller
//! rather than failing the run.

use super::path::EntityExt;
use crate::error::{Error, Result};
use crate::types::{Entity, JsonValue};
use serde::Serialize;
use std::fmt;

/// A WGS84 position read from GeoJSON `[longitude, latitude]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}˚ N, {}˚ E", self.latitude, self.longitude)
    }
}

/// Outcome of reading a geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// A GeoJSON `Point`
    Point(GeoPoint),
    /// Any other geometry type, by its GeoJSON `type`
    Unhandled(String),
}

impl Geometry {
    /// The point, if this is one
    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            Geometry::Point(p) => Some(*p),
            Geometry::Unhandled(_) => None,
        }
    }
}

/// Read the GeoJSON geometry found at `path` in `entity`.
///
/// A GeoJSON `Feature` is unwrapped to its `geometry`.
pub fn geometry_at(entity: &Entity, path: &str) -> Result<Geometry> {
    let value = entity.field(path)?;
    read_geometry(value, path)
}

/// Read a GeoJSON geometry value; `path` is only used in error messages
pub fn read_geometry(value: &JsonValue, path: &str) -> Result<Geometry> {
    let geometry_type = value
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::field_type(format!("{path}/type"), "a GeoJSON type string"))?;

    match geometry_type {
        "Point" => {
            let coordinates = value
                .get("coordinates")
                .and_then(JsonValue::as_array)
                .ok_or_else(|| {
                    Error::field_type(format!("{path}/coordinates"), "a coordinate array")
                })?;
            point_from_coordinates(coordinates, path).map(Geometry::Point)
        }
        "Feature" => {
            let geometry = value.get("geometry").ok_or_else(|| {
                Error::field_type(format!("{path}/geometry"), "a GeoJSON geometry")
            })?;
            read_geometry(geometry, &format!("{path}/geometry"))
        }
        other => Ok(Geometry::Unhandled(other.to_string())),
    }
}

fn point_from_coordinates(coordinates: &[JsonValue], path: &str) -> Result<GeoPoint> {
    match coordinates {
        [lon, lat, ..] => match (lon.as_f64(), lat.as_f64()) {
            (Some(longitude), Some(latitude)) => Ok(GeoPoint {
                longitude,
                latitude,
            }),
            _ => Err(Error::field_type(
                format!("{path}/coordinates"),
                "numeric [longitude, latitude]",
            )),
        },
        _ => Err(Error::field_type(
            format!("{path}/coordinates"),
            "at least two coordinates",
        )),
    }
}
