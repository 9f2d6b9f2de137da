//! Query parameter builder
//!
//! Collects the server-defined `$` options in the order they are added.

use super::filter::Filter;
use crate::types::{QueryParams, SortOrder};

/// Builds the ordered query string of a SensorThings request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    params: QueryParams,
}

impl QueryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// `$expand`: embed related collections, e.g. `Locations`
    #[must_use]
    pub fn expand(self, relations: &str) -> Self {
        self.push("$expand", relations)
    }

    /// `$filter`
    #[must_use]
    pub fn filter(self, filter: Filter) -> Self {
        self.push("$filter", filter)
    }

    /// `$orderby`: `<field> asc|desc`
    #[must_use]
    pub fn order_by(self, field: &str, order: SortOrder) -> Self {
        self.push("$orderby", format!("{field} {order}"))
    }

    /// `$select`: comma-separated allow-list of fields
    #[must_use]
    pub fn select<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        self.push("$select", fields.join(","))
    }

    /// `$resultFormat=CSV`
    #[must_use]
    pub fn result_format_csv(self) -> Self {
        self.push("$resultFormat", "CSV")
    }

    /// `$top`: page size
    #[must_use]
    pub fn top(self, top: u32) -> Self {
        self.push("$top", top.to_string())
    }

    /// `$skip`: entities to skip
    #[must_use]
    pub fn skip(self, skip: u64) -> Self {
        self.push("$skip", skip.to_string())
    }

    /// `$count`: ask the server to compute `@iot.count`
    #[must_use]
    pub fn count(self, count: bool) -> Self {
        self.push("$count", count.to_string())
    }

    /// Value of a parameter, if set
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The accumulated parameters
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Consume the builder
    pub fn build(self) -> QueryParams {
        self.params
    }
}
