//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::cli::report::{
    BandwidthReport, DatastreamSummary, FeatureRow, FeaturesReport, ObservationsReport,
    PhenomenaReport, PropertySummary, ThingSummary, ThingsReport, TransferSummary,
};
use crate::config::{ConfigOverrides, ExplorerConfig};
use crate::engine::{CollectionFetcher, FetchConfig};
use crate::entity::{dedup_by_timestamp, find_duplicate_timestamps, samples, EntityExt};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Transport};
use crate::query::{quote, Filter, QueryBuilder, PHENOMENON_TIME};
use crate::types::{EntitySet, JsonValue, SortOrder, IOT_ID};
use serde::Serialize;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Fields kept by `$select` when minimizing Observation downloads
const SAMPLE_FIELDS: [&str; 2] = [PHENOMENON_TIME, "result"];

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Resolve configuration: CLI flag > environment > file > defaults
    pub fn config(&self) -> Result<ExplorerConfig> {
        let overrides = ConfigOverrides {
            service_url: self.cli.url.clone(),
            timeout_secs: self.cli.timeout,
            max_retries: self.cli.retries,
            requests_per_second: self.cli.rate_limit,
        };
        ExplorerConfig::resolve(self.cli.config.as_deref(), &overrides)
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.config()?;
        info!("Using SensorThings service at {}", config.service_url);

        let client = HttpClient::with_config(config.http_client_config())?;
        debug!(
            "HTTP timeout {:?}, {} retries, rate limited: {}",
            client.config().timeout,
            client.config().max_retries,
            client.has_rate_limiter()
        );
        let mut explorer = Explorer::new(client, config.service_url);

        match &self.cli.command {
            Commands::Things { expand } => {
                let report = explorer.things(*expand).await?;
                self.emit(&report)
            }
            Commands::Observations {
                datastream,
                limit,
                order,
                start,
                end,
                single_page,
                dedup,
            } => {
                let query = ObservationQuery {
                    datastream: datastream.clone(),
                    limit: *limit,
                    order: *order,
                    start: start.clone(),
                    end: end.clone(),
                    single_page: *single_page,
                    dedup: *dedup,
                };
                let report = explorer.observations(&query).await?;
                self.emit(&report)
            }
            Commands::Features { datastream, unit } => {
                let report = explorer.features(datastream, unit).await?;
                self.emit(&report)
            }
            Commands::Bandwidth { datastream, limit } => {
                let report = explorer.bandwidth(datastream, *limit).await?;
                self.emit(&report)
            }
            Commands::Stations { polygon } => {
                let report = explorer.stations(polygon).await?;
                self.emit(&report)
            }
            Commands::Phenomena {
                name,
                property,
                polygon,
            } => {
                let report = explorer
                    .phenomena(name, property.as_deref(), polygon)
                    .await?;
                self.emit(&report)
            }
        }
    }

    /// Print a report to stdout in the selected format
    fn emit<R: Serialize + Display>(&self, report: &R) -> Result<()> {
        match self.cli.format {
            OutputFormat::Pretty => print!("{report}"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        }
        Ok(())
    }
}

// ============================================================================
// Explorer
// ============================================================================

/// Options of the Observations download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationQuery {
    /// Datastream id or URL
    pub datastream: String,
    /// Follow pages until at least this many Observations arrived
    pub limit: usize,
    pub order: SortOrder,
    pub start: Option<String>,
    pub end: Option<String>,
    pub single_page: bool,
    pub dedup: bool,
}

impl ObservationQuery {
    /// All Observations of `datastream` in ascending time, up to 500
    pub fn new(datastream: impl Into<String>) -> Self {
        Self {
            datastream: datastream.into(),
            limit: 500,
            order: SortOrder::Asc,
            start: None,
            end: None,
            single_page: false,
            dedup: false,
        }
    }
}

/// Runs each subcommand's requests against one service
pub struct Explorer<T> {
    fetcher: CollectionFetcher<T>,
    service_url: String,
}

impl<T: Transport> Explorer<T> {
    /// Create an explorer for the service rooted at `service_url`
    pub fn new(transport: T, service_url: impl Into<String>) -> Self {
        Self {
            fetcher: CollectionFetcher::new(transport),
            service_url: service_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Service root in use
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// URL of an entity given either its id or its full URL
    pub fn entity_url(&self, set: EntitySet, id_or_url: &str) -> Result<String> {
        let value = id_or_url.trim();
        if value.is_empty() {
            return Err(Error::config(format!("{set} id cannot be empty")));
        }

        if value.starts_with("http://") || value.starts_with("https://") {
            url::Url::parse(value)?;
            return Ok(value.trim_end_matches('/').to_string());
        }

        let id = if value.parse::<i64>().is_ok() {
            value.to_string()
        } else {
            quote(value)
        };
        Ok(set.entity_url(&self.service_url, &id))
    }

    /// List Things with the position of their first Location.
    ///
    /// Without `expand` each Thing costs one more request for its Locations;
    /// with it the Locations are embedded in the Things page.
    pub async fn things(&mut self, expand: bool) -> Result<ThingsReport> {
        self.fetcher.reset_stats();
        let url = EntitySet::Things.collection_url(&self.service_url);

        let (server_count, things) = if expand {
            let query = QueryBuilder::new().expand("Locations").build();
            let page = self.fetcher.fetch_first_page(&url, &query).await?;
            let summaries = page
                .entities
                .iter()
                .map(|thing| ThingSummary::new(thing, thing.field_opt("Locations/0/location")))
                .collect::<Result<Vec<_>>>()?;
            (page.total_count, summaries)
        } else {
            let page = self.fetcher.fetch_first_page(&url, &[]).await?;
            let mut summaries = Vec::with_capacity(page.len());
            for thing in &page.entities {
                let link = thing.navigation_link("Locations")?;
                let locations = self.fetcher.fetch_first_page(link, &[]).await?;
                let location = locations.entities.first().and_then(|l| l.get("location"));
                summaries.push(ThingSummary::new(thing, location)?);
            }
            (page.total_count, summaries)
        };

        Ok(ThingsReport {
            server_count,
            things,
            stats: *self.fetcher.stats(),
        })
    }

    /// Download Observations of a Datastream as time series samples
    pub async fn observations(&mut self, query: &ObservationQuery) -> Result<ObservationsReport> {
        self.fetcher.reset_stats();
        let datastream = self.entity_url(EntitySet::Datastreams, &query.datastream)?;
        let url = format!("{datastream}/Observations");

        let mut params = QueryBuilder::new().order_by(PHENOMENON_TIME, query.order);
        if query.start.is_some() || query.end.is_some() {
            let window = Filter::time_range(
                PHENOMENON_TIME,
                query.start.as_deref(),
                query.end.as_deref(),
            )?;
            params = params.filter(window).count(true);
        }
        let params = params.build();

        let outcome = if query.single_page {
            self.fetcher.fetch_first_page(&url, &params).await?
        } else {
            let config = FetchConfig::new().with_ceiling(query.limit);
            self.fetcher.fetch_collection(&url, &params, &config).await?
        };

        let downloaded = outcome.len();
        let duplicates = find_duplicate_timestamps(&outcome.entities, PHENOMENON_TIME);
        if !duplicates.is_empty() {
            warn!(
                "{} phenomenonTime values appear on more than one Observation of {}",
                duplicates.len(),
                datastream
            );
        }

        let entities = if query.dedup {
            dedup_by_timestamp(outcome.entities, PHENOMENON_TIME)
        } else {
            outcome.entities
        };

        Ok(ObservationsReport {
            datastream,
            total_count: outcome.total_count,
            downloaded,
            duplicates,
            deduplicated: query.dedup,
            samples: samples(&entities, PHENOMENON_TIME, "result")?,
            stats: *self.fetcher.stats(),
        })
    }

    /// Latest page of Observations with their Feature of Interest, oldest first
    pub async fn features(&mut self, datastream: &str, unit: &str) -> Result<FeaturesReport> {
        self.fetcher.reset_stats();
        let datastream = self.entity_url(EntitySet::Datastreams, datastream)?;
        let url = format!("{datastream}/Observations");

        let params = QueryBuilder::new()
            .order_by(PHENOMENON_TIME, SortOrder::Desc)
            .expand("FeatureOfInterest")
            .build();
        let mut outcome = self.fetcher.fetch_first_page(&url, &params).await?;
        outcome.entities.reverse();

        let rows = outcome
            .entities
            .iter()
            .map(FeatureRow::new)
            .collect::<Result<Vec<_>>>()?;

        for row in &rows {
            if let Some(kind) = &row.unhandled_geometry {
                warn!("Unhandled GeoJSON type {} for Observation at {}", kind, row.time);
            }
        }

        Ok(FeaturesReport {
            total_count: outcome.total_count,
            unit: unit.to_string(),
            rows,
            stats: *self.fetcher.stats(),
        })
    }

    /// Download the same Observations as full JSON, `$select` JSON and CSV
    pub async fn bandwidth(&mut self, datastream: &str, limit: usize) -> Result<BandwidthReport> {
        self.fetcher.reset_stats();
        let datastream = self.entity_url(EntitySet::Datastreams, datastream)?;
        let url = format!("{datastream}/Observations");
        let config = FetchConfig::new().with_ceiling(limit);
        let ordered = QueryBuilder::new().order_by(PHENOMENON_TIME, SortOrder::Desc);

        let full = self
            .fetcher
            .fetch_collection(&url, &ordered.clone().build(), &config)
            .await?;

        let selected = ordered.clone().select(SAMPLE_FIELDS);
        let minimal = self
            .fetcher
            .fetch_collection(&url, &selected.clone().build(), &config)
            .await?;

        let columns: Vec<String> = SAMPLE_FIELDS.iter().map(ToString::to_string).collect();
        let csv = self
            .fetcher
            .fetch_csv(
                &url,
                &selected.result_format_csv().build(),
                Some(&columns),
                &config,
            )
            .await?;

        debug!(
            "Bandwidth totals: {} / {} / {} bytes",
            full.stats.bytes, minimal.stats.bytes, csv.stats.bytes
        );

        Ok(BandwidthReport {
            transfers: vec![
                TransferSummary::new("JSON", full.len(), &full.stats),
                TransferSummary::new("JSON $select", minimal.len(), &minimal.stats),
                TransferSummary::new("CSV", csv.table.len(), &csv.stats),
            ],
        })
    }

    /// Things whose Location intersects `wkt`
    pub async fn stations(&mut self, wkt: &str) -> Result<ThingsReport> {
        self.fetcher.reset_stats();
        let params = QueryBuilder::new()
            .expand("Locations")
            .filter(Filter::geo_intersects("Locations/location", wkt)?)
            .build();
        let url = EntitySet::Things.collection_url(&self.service_url);

        let outcome = self
            .fetcher
            .fetch_collection(&url, &params, &FetchConfig::new())
            .await?;

        let things = outcome
            .entities
            .iter()
            .map(|thing| ThingSummary::new(thing, thing.field_opt("Locations/0/location")))
            .collect::<Result<Vec<_>>>()?;

        Ok(ThingsReport {
            server_count: outcome.total_count,
            things,
            stats: *self.fetcher.stats(),
        })
    }

    /// Observed Properties named `name`, then the Datastreams of one of them
    /// whose observed area intersects `wkt`.
    ///
    /// `property` selects the Observed Property; otherwise the first match is used.
    pub async fn phenomena(
        &mut self,
        name: &str,
        property: Option<&str>,
        wkt: &str,
    ) -> Result<PhenomenaReport> {
        self.fetcher.reset_stats();
        let area = Filter::geo_intersects("observedArea", wkt)?;

        let url = EntitySet::ObservedProperties.collection_url(&self.service_url);
        let params = QueryBuilder::new()
            .filter(Filter::eq_str("name", name))
            .build();
        let found = self
            .fetcher
            .fetch_collection(&url, &params, &FetchConfig::new())
            .await?;

        let observed_properties = found
            .entities
            .iter()
            .map(PropertySummary::new)
            .collect::<Result<Vec<_>>>()?;

        let selected = match property {
            Some(property) => Some(self.entity_url(EntitySet::ObservedProperties, property)?),
            None => found
                .entities
                .first()
                .and_then(|op| op.get(IOT_ID))
                .and_then(id_segment)
                .map(|id| {
                    EntitySet::ObservedProperties.entity_url(&self.service_url, &id)
                }),
        };

        let datastreams = match &selected {
            Some(op_url) => {
                let params = QueryBuilder::new().filter(area).build();
                let outcome = self
                    .fetcher
                    .fetch_collection(
                        &format!("{op_url}/Datastreams"),
                        &params,
                        &FetchConfig::new(),
                    )
                    .await?;
                outcome
                    .entities
                    .iter()
                    .map(DatastreamSummary::new)
                    .collect::<Result<Vec<_>>>()?
            }
            None => {
                warn!("No Observed Property named '{}'", name);
                Vec::new()
            }
        };

        Ok(PhenomenaReport {
            observed_properties,
            selected,
            datastreams,
            stats: *self.fetcher.stats(),
        })
    }
}

/// Key segment for an `@iot.id`: numbers bare, strings quoted
fn id_segment(id: &JsonValue) -> Option<String> {
    match id {
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::String(s) => Some(quote(s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RawResponse;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn get(&self, url: &str, _query: &[(String, String)]) -> Result<RawResponse> {
            panic!("no request expected, got {url}")
        }
    }

    fn explorer() -> Explorer<Unreachable> {
        Explorer::new(Unreachable, "https://sta.example.com/v1.0/")
    }

    #[test]
    fn test_entity_url_from_id() {
        let explorer = explorer();
        assert_eq!(explorer.service_url(), "https://sta.example.com/v1.0");
        assert_eq!(
            explorer.entity_url(EntitySet::Datastreams, "46").unwrap(),
            "https://sta.example.com/v1.0/Datastreams(46)"
        );
        assert_eq!(
            explorer
                .entity_url(EntitySet::ObservedProperties, "air-temp")
                .unwrap(),
            "https://sta.example.com/v1.0/ObservedProperties('air-temp')"
        );
    }

    #[test]
    fn test_entity_url_passthrough() {
        let explorer = explorer();
        assert_eq!(
            explorer
                .entity_url(
                    EntitySet::Datastreams,
                    "https://other.example.com/v1.1/Datastreams(7)/"
                )
                .unwrap(),
            "https://other.example.com/v1.1/Datastreams(7)"
        );
        assert!(explorer.entity_url(EntitySet::Datastreams, "  ").is_err());
    }

    #[test]
    fn test_id_segment() {
        assert_eq!(id_segment(&json!(1)), Some("1".to_string()));
        assert_eq!(id_segment(&json!("a'b")), Some("'a''b'".to_string()));
        assert_eq!(id_segment(&json!(null)), None);
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_before_any_request() {
        let mut explorer = explorer();

        let err = explorer.stations("BOX (1 2, 3 4)").await.unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));

        let err = explorer
            .phenomena("Air Temperature", None, "POLYGON ((1 2)")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));

        let mut query = ObservationQuery::new("46");
        query.start = Some("2020-09-14T13:00:00.000-0600".to_string());
        let err = explorer.observations(&query).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
    }
}
