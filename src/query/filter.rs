//! `$filter` expression construction
//!
//! Only string construction happens here; the server parses the filter
//! language. Literals are validated up front so a malformed timestamp or
//! polygon is reported locally instead of as an opaque HTTP 400.

use crate::error::{Error, Result};
use chrono::DateTime;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// The timestamp field Observations are usually filtered on
pub const PHENOMENON_TIME: &str = "phenomenonTime";

/// A `$filter` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter(String);

impl Filter {
    /// Use a hand-written expression as-is
    pub fn raw(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    /// Inclusive time window on `field`.
    ///
    /// Either bound may be omitted, but not both.
    pub fn time_range(field: &str, start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let lower = start
            .map(|ts| validate_timestamp(ts).map(|ts| format!("{field} ge {ts}")))
            .transpose()?;
        let upper = end
            .map(|ts| validate_timestamp(ts).map(|ts| format!("{field} le {ts}")))
            .transpose()?;

        match (lower, upper) {
            (Some(lower), Some(upper)) => Ok(Self(format!("{lower} and {upper}"))),
            (Some(bound), None) | (None, Some(bound)) => Ok(Self(bound)),
            (None, None) => Err(Error::config(
                "a time range needs a start, an end, or both",
            )),
        }
    }

    /// `geo.intersects(<field>, geography'<wkt>')`
    pub fn geo_intersects(field: &str, wkt: &str) -> Result<Self> {
        let wkt = validate_wkt(wkt)?;
        Ok(Self(format!("geo.intersects({field}, geography'{wkt}')")))
    }

    /// `<field> eq '<value>'`, with embedded single quotes doubled
    pub fn eq_str(field: &str, value: &str) -> Self {
        Self(format!("{field} eq {}", quote(value)))
    }

    /// `<field> ne <number>`, e.g. to drop a NODATA sentinel
    pub fn ne_num(field: &str, value: f64) -> Self {
        Self(format!("{field} ne {value}"))
    }

    /// Conjunction of two expressions
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        Self(format!("{} and {}", self.0, other.0))
    }

    /// The expression text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.0
    }
}

/// Single-quote a string literal for the filter language
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Check an ISO 8601 timestamp the server will accept and return it unchanged.
///
/// Offsets must be `Z` or `±HH:MM`; the compact `±HHMM` form is rejected
/// because servers silently fail to match it.
pub fn validate_timestamp(value: &str) -> Result<&str> {
    static COMPACT_OFFSET: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[+-]\d{4}$").unwrap());

    if COMPACT_OFFSET.is_match(value) {
        return Err(Error::invalid_timestamp(
            value,
            "offset must be written ±HH:MM (e.g. -06:00), not ±HHMM",
        ));
    }

    DateTime::parse_from_rfc3339(value)
        .map_err(|e| Error::invalid_timestamp(value, e.to_string()))?;
    Ok(value)
}

/// Sanity-check a Well-Known Text geometry literal and return it trimmed
pub fn validate_wkt(wkt: &str) -> Result<&str> {
    static WKT_TAG: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)^(POINT|LINESTRING|POLYGON|MULTIPOINT|MULTILINESTRING|MULTIPOLYGON|GEOMETRYCOLLECTION)(\s+(Z|M|ZM))?\s*\(",
        )
        .unwrap()
    });

    let wkt = wkt.trim();
    if !WKT_TAG.is_match(wkt) {
        return Err(Error::invalid_geometry(format!(
            "'{wkt}' does not start with a WKT geometry type"
        )));
    }
    if wkt.contains('\'') {
        return Err(Error::invalid_geometry("WKT must not contain quotes"));
    }

    let mut depth = 0i32;
    for c in wkt.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::invalid_geometry("unbalanced parentheses"));
                }
            }
            _ => {}
        }
    }
    if depth != 0 || !wkt.ends_with(')') {
        return Err(Error::invalid_geometry("unbalanced parentheses"));
    }

    Ok(wkt)
}
