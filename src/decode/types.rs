//! Decoder types and traits
//!
//! Defines the decoded page shapes and the decoder abstraction.

use crate::error::{Error, Result};
use crate::pagination::PageSummary;
use crate::types::{Entity, JsonValue};

/// One page of a JSON collection response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionPage {
    /// `@iot.count`, when the server computed it
    pub count: Option<u64>,
    /// Entities in server order
    pub value: Vec<Entity>,
    /// `@iot.nextLink`, present while more entities remain
    pub next_link: Option<String>,
}

impl CollectionPage {
    /// Whether the server reported more entities beyond this page
    pub fn has_more(&self) -> bool {
        self.next_link.is_some()
    }
}

/// A CSV body: header row plus data rows in header order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    /// Column names from the header row
    pub headers: Vec<String>,
    /// Data rows, each with one cell per header
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Append the rows of another page.
    ///
    /// The first non-empty header row wins; every later page must repeat it.
    pub fn append(&mut self, url: &str, other: CsvTable) -> Result<()> {
        if self.headers.is_empty() {
            self.headers = other.headers;
        } else if !other.headers.is_empty() && other.headers != self.headers {
            return Err(Error::protocol(
                url,
                format!(
                    "CSV header changed between pages: [{}] then [{}]",
                    self.headers.join(","),
                    other.headers.join(",")
                ),
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Convert rows into entities keyed by header
    pub fn to_entities(&self) -> Vec<Entity> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| (header.clone(), parse_csv_value(cell)))
                    .collect()
            })
            .collect()
    }
}

/// Parse a CSV cell into a JSON value
pub(crate) fn parse_csv_value(value: &str) -> JsonValue {
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return JsonValue::Null;
    }

    if let Ok(n) = value.parse::<i64>() {
        return JsonValue::Number(n.into());
    }

    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return JsonValue::Number(num);
        }
    }

    match value {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        _ => JsonValue::String(value.to_string()),
    }
}

/// Trait for decoding one response body into a page
pub trait PageDecoder: Send + Sync {
    /// Decoded page type
    type Page;

    /// Decode the body fetched from `url`
    fn decode(&self, url: &str, body: &[u8]) -> Result<Self::Page>;

    /// Pagination-relevant facts about a decoded page
    fn summarize(&self, page: &Self::Page) -> PageSummary;
}
