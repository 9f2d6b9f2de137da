//! CLI module
//!
//! Command-line interface over a SensorThings service.
//!
//! # Commands
//!
//! - `things` - List Things and their Locations
//! - `observations` - Download a Datastream's Observations
//! - `features` - Observations with their Feature of Interest position
//! - `bandwidth` - Compare JSON, `$select` and CSV download sizes
//! - `stations` - Things inside a WKT geometry
//! - `phenomena` - Observed Properties by name and their Datastreams in an area

mod commands;
mod report;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use report::{
    BandwidthReport, DatastreamSummary, FeatureRow, FeaturesReport, ObservationsReport,
    PhenomenaReport, PropertySummary, ThingSummary, ThingsReport, TransferSummary,
};
pub use runner::{Explorer, ObservationQuery, Runner};
