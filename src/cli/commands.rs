//! CLI commands and argument parsing

use crate::types::SortOrder;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Query and inspect OGC SensorThings API services
#[derive(Parser, Debug)]
#[command(name = "sta-explorer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service root, e.g. https://host/FROST-Server/v1.0
    #[arg(short, long, global = true, env = "STA_URL")]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum retries per request
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Client-side rate limit in requests per second
    #[arg(long, global = true)]
    pub rate_limit: Option<u32>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List Things and where they are
    Things {
        /// Embed Locations in the Things request instead of one request per Thing
        #[arg(long)]
        expand: bool,
    },

    /// Download the Observations of a Datastream
    Observations {
        /// Datastream id or URL
        #[arg(short, long)]
        datastream: String,

        /// Keep following pages until at least this many Observations arrived
        #[arg(short, long, default_value = "500")]
        limit: usize,

        /// Order by phenomenonTime
        #[arg(long, value_enum, default_value = "asc")]
        order: SortOrder,

        /// Earliest phenomenonTime (RFC 3339, e.g. 2020-09-14T19:00:00.000Z)
        #[arg(long)]
        start: Option<String>,

        /// Latest phenomenonTime (RFC 3339)
        #[arg(long)]
        end: Option<String>,

        /// Only fetch the first page
        #[arg(long)]
        single_page: bool,

        /// Drop Observations whose phenomenonTime was already seen
        #[arg(long)]
        dedup: bool,
    },

    /// Latest Observations with their Feature of Interest position
    Features {
        /// Datastream id or URL
        #[arg(short, long)]
        datastream: String,

        /// Unit printed after each result
        #[arg(long, default_value = "˚C")]
        unit: String,
    },

    /// Compare download size of full JSON, `$select` JSON and CSV
    Bandwidth {
        /// Datastream id or URL
        #[arg(short, long)]
        datastream: String,

        /// Keep following pages until at least this many Observations arrived
        #[arg(short, long, default_value = "500")]
        limit: usize,
    },

    /// Things whose Location intersects a WKT geometry
    Stations {
        /// WKT geometry, e.g. "POLYGON ((-106 68, -106 70, -105 70, -105 68, -106 68))"
        #[arg(short, long)]
        polygon: String,
    },

    /// Find an Observed Property by name and its Datastreams inside a WKT geometry
    Phenomena {
        /// Observed Property name
        #[arg(short, long, default_value = "Air Temperature")]
        name: String,

        /// Observed Property id or URL (defaults to the first match)
        #[arg(long)]
        property: Option<String>,

        /// WKT geometry matched against each Datastream's observedArea
        #[arg(short, long)]
        polygon: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Pretty,
    /// One JSON document
    Json,
}
