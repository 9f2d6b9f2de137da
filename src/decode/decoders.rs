//! Decoder implementations
//!
//! Each decoder handles one response format a SensorThings service emits.

use super::types::{CollectionPage, CsvTable, PageDecoder};
use crate::error::{Error, Result};
use crate::pagination::PageSummary;
use crate::types::{Entity, JsonValue, IOT_COUNT, IOT_NEXT_LINK};

// ============================================================================
// JSON Decoder
// ============================================================================

/// Decodes `{ "@iot.count", "value": [...], "@iot.nextLink" }` pages
#[derive(Debug, Clone, Default)]
pub struct JsonCollectionDecoder;

impl JsonCollectionDecoder {
    /// Create a new JSON collection decoder
    pub fn new() -> Self {
        Self
    }
}

impl PageDecoder for JsonCollectionDecoder {
    type Page = CollectionPage;

    fn decode(&self, url: &str, body: &[u8]) -> Result<CollectionPage> {
        let mut object = decode_entity(url, body)?;

        let value = match object.remove("value") {
            Some(JsonValue::Array(items)) => items,
            Some(other) => {
                return Err(Error::protocol(
                    url,
                    format!("'value' is {}, expected an array", type_name(&other)),
                ))
            }
            None => return Err(Error::protocol(url, "response has no 'value' array")),
        };

        let value = value
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                JsonValue::Object(entity) => Ok(entity),
                other => Err(Error::protocol(
                    url,
                    format!("value[{i}] is {}, expected an entity", type_name(&other)),
                )),
            })
            .collect::<Result<Vec<Entity>>>()?;

        Ok(CollectionPage {
            count: object.get(IOT_COUNT).and_then(JsonValue::as_u64),
            value,
            next_link: object
                .get(IOT_NEXT_LINK)
                .and_then(JsonValue::as_str)
                .map(String::from),
        })
    }

    fn summarize(&self, page: &CollectionPage) -> PageSummary {
        PageSummary::new(page.value.len()).with_next_link(page.next_link.clone())
    }
}

/// Decode a body holding a single JSON object (an entity or a collection page)
pub fn decode_entity(url: &str, body: &[u8]) -> Result<Entity> {
    let value: JsonValue = serde_json::from_slice(body)
        .map_err(|e| Error::protocol(url, format!("invalid JSON: {e}")))?;

    match value {
        JsonValue::Object(object) => Ok(object),
        other => Err(Error::protocol(
            url,
            format!("body is {}, expected a JSON object", type_name(&other)),
        )),
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

// ============================================================================
// CSV Decoder
// ============================================================================

/// Decodes `$resultFormat=CSV` bodies with a conformant CSV reader
#[derive(Debug, Clone, Default)]
pub struct CsvDecoder {
    /// Columns the header row must list, in order (the `$select` fields)
    expected_columns: Option<Vec<String>>,
}

impl CsvDecoder {
    /// Create a new CSV decoder that accepts any header row
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the header row to match the `$select` column order
    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_columns: Some(columns.into_iter().map(Into::into).collect()),
        }
    }
}

impl PageDecoder for CsvDecoder {
    type Page = CsvTable;

    fn decode(&self, url: &str, body: &[u8]) -> Result<CsvTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::csv(format!("{url}: header row: {e}")))?
            .iter()
            .map(String::from)
            .collect();

        if headers.is_empty() {
            return Ok(CsvTable::default());
        }

        if let Some(expected) = &self.expected_columns {
            if &headers != expected {
                return Err(Error::protocol(
                    url,
                    format!(
                        "CSV columns [{}] do not match selected fields [{}]",
                        headers.join(","),
                        expected.join(",")
                    ),
                ));
            }
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::csv(format!("{url}: {e}")))?;
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(CsvTable { headers, rows })
    }

    fn summarize(&self, page: &CsvTable) -> PageSummary {
        PageSummary::new(page.len())
    }
}
