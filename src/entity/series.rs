//! Observation time series helpers
//!
//! Several Observations may share one `phenomenonTime` on servers that do
//! not merge them. Duplicates are reported to the caller and only removed
//! on request.

use super::path::EntityExt;
use crate::error::Result;
use crate::types::{Entity, JsonValue};
use serde::Serialize;
use std::collections::HashMap;

/// A timestamp carried by more than one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateTimestamp {
    /// The shared timestamp
    pub timestamp: String,
    /// Positions of the entities carrying it, ascending
    pub indices: Vec<usize>,
}

/// One `(time, result)` sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub time: String,
    pub result: JsonValue,
}

/// Project entities into `(time_field, result_field)` samples, in order
pub fn samples(entities: &[Entity], time_field: &str, result_field: &str) -> Result<Vec<Sample>> {
    entities
        .iter()
        .map(|entity| {
            Ok(Sample {
                time: entity.str_field(time_field)?.to_string(),
                result: entity.field(result_field)?.clone(),
            })
        })
        .collect()
}

/// Every value of `field` that appears on more than one entity, in first-seen order.
///
/// Entities without a string `field` are ignored.
pub fn find_duplicate_timestamps(entities: &[Entity], field: &str) -> Vec<DuplicateTimestamp> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();

    for (i, entity) in entities.iter().enumerate() {
        let Some(ts) = entity.get(field).and_then(JsonValue::as_str) else {
            continue;
        };
        let seen = positions.entry(ts).or_default();
        if seen.is_empty() {
            order.push(ts);
        }
        seen.push(i);
    }

    order
        .into_iter()
        .filter_map(|ts| {
            let indices = positions.remove(ts)?;
            (indices.len() > 1).then(|| DuplicateTimestamp {
                timestamp: ts.to_string(),
                indices,
            })
        })
        .collect()
}

/// Keep the first entity for each value of `field`; entities without it are kept
pub fn dedup_by_timestamp(entities: Vec<Entity>, field: &str) -> Vec<Entity> {
    let mut seen = std::collections::HashSet::new();
    entities
        .into_iter()
        .filter(|entity| match entity.get(field).and_then(JsonValue::as_str) {
            Some(ts) => seen.insert(ts.to_string()),
            None => true,
        })
        .collect()
}
