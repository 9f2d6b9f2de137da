//! Path access into schema-less entities
//!
//! Paths are `/`-separated, matching how SensorThings itself names nested
//! fields (`Locations/location`). A numeric segment indexes into an array,
//! so `Locations/0/location/coordinates` reads the coordinates of the first
//! expanded Location.

use crate::error::{Error, Result};
use crate::types::{Entity, JsonObject, JsonValue, IOT_ID, NAVIGATION_LINK_SUFFIX};

/// Typed field access on an [`Entity`]
pub trait EntityExt {
    /// Value at `path`, or a `FieldMissing` error naming the first absent segment
    fn field(&self, path: &str) -> Result<&JsonValue>;

    /// Value at `path` if every segment exists
    fn field_opt(&self, path: &str) -> Option<&JsonValue> {
        self.field(path).ok()
    }

    /// String at `path`
    fn str_field(&self, path: &str) -> Result<&str> {
        self.field(path)?
            .as_str()
            .ok_or_else(|| Error::field_type(path, "a string"))
    }

    /// Number at `path`
    fn f64_field(&self, path: &str) -> Result<f64> {
        self.field(path)?
            .as_f64()
            .ok_or_else(|| Error::field_type(path, "a number"))
    }

    /// Array at `path`
    fn array_field(&self, path: &str) -> Result<&Vec<JsonValue>> {
        self.field(path)?
            .as_array()
            .ok_or_else(|| Error::field_type(path, "an array"))
    }

    /// Object at `path`
    fn object_field(&self, path: &str) -> Result<&JsonObject> {
        self.field(path)?
            .as_object()
            .ok_or_else(|| Error::field_type(path, "an object"))
    }

    /// URL of a related collection, e.g. `navigation_link("Locations")`
    fn navigation_link(&self, relation: &str) -> Result<&str> {
        self.str_field(&format!("{relation}{NAVIGATION_LINK_SUFFIX}"))
    }

    /// Short human description used in error messages
    fn describe(&self) -> String;
}

impl EntityExt for Entity {
    fn field(&self, path: &str) -> Result<&JsonValue> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        let first = segments
            .next()
            .ok_or_else(|| Error::field_missing(path, "", self.describe()))?;
        let mut current = self
            .get(first)
            .ok_or_else(|| Error::field_missing(path, first, self.describe()))?;

        for segment in segments {
            let next = match current {
                JsonValue::Object(map) => map.get(segment),
                JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| Error::field_missing(path, segment, self.describe()))?;
        }

        Ok(current)
    }

    fn describe(&self) -> String {
        let id = self.get(IOT_ID).map(|id| match id {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        });
        let name = self.get("name").and_then(JsonValue::as_str);

        match (id, name) {
            (Some(id), Some(name)) => format!("entity {id} '{name}'"),
            (Some(id), None) => format!("entity {id}"),
            (None, Some(name)) => format!("entity '{name}'"),
            (None, None) => "entity without @iot.id".to_string(),
        }
    }
}
