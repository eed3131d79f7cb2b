//! Command-line interface definitions.
//!
//! Uses clap derive API for argument parsing.

use clap::{Parser, Subcommand};

use crate::client::FeedSource;
use crate::output::Format;

/// Terminal earthquake dashboard with local tremor detection.
#[derive(Parser, Debug)]
#[command(name = "quakefeel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    pub quiet: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show recent earthquakes (one-shot fetch and exit)
    Tail(TailArgs),

    /// Stream earthquakes in real-time
    Live(LiveArgs),

    /// Enrich the feed with proximity to a coordinate
    Enrich(EnrichArgs),

    /// Run the tremor-detection monitor
    Monitor(MonitorArgs),
}

/// Arguments for the `tail` command.
#[derive(Parser, Debug)]
pub struct TailArgs {
    /// Feed source to fetch
    #[arg(long, default_value = "all_hour", value_parser = parse_feed_source)]
    pub feed: FeedSource,

    /// Keep only events whose place matches this country/region name
    #[arg(long)]
    pub country: Option<String>,

    /// Maximum number of events to show
    #[arg(long, short = 'n', default_value = "50")]
    pub limit: usize,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `live` command.
#[derive(Parser, Debug)]
pub struct LiveArgs {
    /// Feed source to stream
    #[arg(long, default_value = "all_hour", value_parser = parse_feed_source)]
    pub feed: FeedSource,

    /// Keep only events whose place matches this country/region name
    #[arg(long)]
    pub country: Option<String>,

    /// Poll interval in seconds (minimum 30)
    #[arg(long, default_value = "60")]
    pub poll_interval: u64,

    /// Output format
    #[arg(long, short = 'f', default_value = "human", value_parser = parse_format)]
    pub format: Format,
}

/// Arguments for the `enrich` command.
#[derive(Parser, Debug)]
pub struct EnrichArgs {
    /// Feed source to enrich
    #[arg(long, default_value = "all_hour", value_parser = parse_feed_source)]
    pub feed: FeedSource,

    /// Enrichment service endpoint URL
    #[arg(long)]
    pub endpoint: String,

    /// Explicit latitude (requires --lon)
    #[arg(long, requires = "lon", conflicts_with = "country")]
    pub lat: Option<f64>,

    /// Explicit longitude (requires --lat)
    #[arg(long, requires = "lat", conflicts_with = "country")]
    pub lon: Option<f64>,

    /// Use a country centroid as the coordinate
    #[arg(long)]
    pub country: Option<String>,
}

/// Arguments for the `monitor` command.
#[derive(Parser, Debug)]
pub struct MonitorArgs {
    /// Number of sampling ticks to run (0 = run until interrupted)
    #[arg(long, default_value = "30")]
    pub ticks: u64,

    /// Deterministic simulation seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Parse a feed source from string.
fn parse_feed_source(s: &str) -> Result<FeedSource, String> {
    s.parse()
}

/// Parse an output format from string.
fn parse_format(s: &str) -> Result<Format, String> {
    s.parse()
}
