//! QuakeFeel - terminal earthquake dashboard with local tremor detection.
//!
//! Polls USGS summary feeds, presents a sorted and classified event
//! list, runs a simulated-or-real motion-sensor monitor, and optionally
//! enriches the feed with proximity data from a hosted service.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod dedup;
mod enrich;
mod errors;
mod locate;
mod models;
mod monitor;
mod output;
mod presenter;
mod settings;

use cli::{Cli, Command};
use client::{FeedClient, FeedState};
use enrich::{EnrichmentClient, EnrichmentState};
use locate::{CoordinateSource, CountryCentroid, FixedPosition};
use monitor::{MotionMonitor, SimulationOnly};
use settings::Settings;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Tail(args) => cmd_tail(&args),
        Command::Live(args) => cmd_live(&args),
        Command::Enrich(args) => cmd_enrich(&args),
        Command::Monitor(args) => cmd_monitor(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `tail` command - one-shot fetch of the selected feed.
fn cmd_tail(args: &cli::TailArgs) -> Result<()> {
    let mut settings = Settings::new();
    settings.set_feed_source(args.feed);

    let client = FeedClient::new().context("failed to create feed client")?;
    let snapshot = client
        .fetch(settings.feed_source())
        .context("failed to fetch earthquake feed")?;

    let mut presented = presenter::present(&snapshot, args.country.as_deref());
    presented.truncate(args.limit);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.format == output::Format::Human {
        writeln!(
            handle,
            "\x1b[2m{} | {} events\x1b[0m",
            settings.feed_source().label(),
            snapshot.event_count
        )?;
    }
    output::write_events(&mut handle, &presented, args.format, Utc::now())?;

    Ok(())
}

/// Execute the `live` command - poll the feed and stream new events.
fn cmd_live(args: &cli::LiveArgs) -> Result<()> {
    // Validate poll interval
    let poll_interval = args.poll_interval.max(30);
    if poll_interval != args.poll_interval {
        tracing::warn!("poll interval clamped to minimum of 30 seconds");
    }

    let mut settings = Settings::new();
    settings.set_feed_source(args.feed);

    let client = FeedClient::new().context("failed to create feed client")?;
    let mut state = FeedState::new(settings.feed_source());

    // Bounded deduplication ring so repeated polls only surface news
    let mut ring = dedup::SeenRing::with_default_capacity();

    tracing::info!(
        "streaming earthquakes from {} feed (poll every {}s)",
        state.selected().as_str(),
        poll_interval
    );

    loop {
        let ticket = state.ticket();
        let result = client.fetch(ticket.source());
        state.complete(ticket, result);

        if let Some(e) = state.error() {
            tracing::warn!("fetch failed, will retry: {e}");
        } else if let Some(snapshot) = state.snapshot() {
            let presented = presenter::present(snapshot, args.country.as_deref());
            let fresh: Vec<_> = presented
                .into_iter()
                .filter(|p| ring.observe(&p.event).should_emit())
                .collect();

            if !fresh.is_empty() {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                output::write_events(&mut handle, &fresh, args.format, Utc::now())?;
                handle.flush()?;
            }

            tracing::debug!(
                "poll complete: {} new/updated (skip rate {:.1}%)",
                fresh.len(),
                ring.skip_rate() * 100.0
            );
        }

        std::thread::sleep(std::time::Duration::from_secs(poll_interval));
    }
}

/// Execute the `enrich` command - proximity enrichment for one
/// coordinate against a fresh feed snapshot.
fn cmd_enrich(args: &cli::EnrichArgs) -> Result<()> {
    // Resolve the coordinate before any network I/O so location
    // failures surface on their own error channel.
    let point = match (&args.country, args.lat, args.lon) {
        (Some(country), _, _) => CountryCentroid::new(country).resolve(),
        (None, Some(lat), Some(lon)) => FixedPosition::new(lat, lon).resolve(),
        _ => anyhow::bail!("provide either --country or both --lat and --lon"),
    }
    .context("failed to resolve coordinate")?;

    let client = FeedClient::new().context("failed to create feed client")?;
    let snapshot = client
        .fetch(args.feed)
        .context("failed to fetch earthquake feed")?;

    let enricher =
        EnrichmentClient::new(&args.endpoint).context("failed to create enrichment client")?;

    let mut state = EnrichmentState::new();
    let ticket = state.begin();
    let result = enricher
        .enrich(point, &snapshot)
        .context("enrichment request failed")?;
    state.complete(ticket, result);

    if let Some(result) = state.result() {
        let mut sorted = result.events.clone();
        enrich::sort_by_proximity(&mut sorted);

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        output::write_enrichment(&mut handle, result, &sorted)?;
    }

    Ok(())
}

/// Execute the `monitor` command - drive the tremor-detection state
/// machine on its fixed cadence.
fn cmd_monitor(args: &cli::MonitorArgs) -> Result<()> {
    let mut monitor = match args.seed {
        Some(seed) => MotionMonitor::with_rng_seed(seed),
        None => MotionMonitor::new(),
    };

    // No accelerometer stack exists in a terminal session; the probe
    // runs once and offers the simulated source.
    monitor.probe_capability(&SimulationOnly);
    monitor.start();

    if !monitor.is_monitoring() {
        anyhow::bail!("motion monitoring is unavailable on this device");
    }

    let stdout = io::stdout();
    {
        let mut handle = stdout.lock();
        writeln!(handle, "\x1b[2m{}\x1b[0m", monitor.mode().description())?;
    }

    let mut elapsed = 0u64;
    loop {
        std::thread::sleep(std::time::Duration::from_secs(
            monitor::SAMPLE_INTERVAL_SECS,
        ));
        monitor.tick();
        elapsed += 1;

        let level = monitor.intensity_level();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let filled = (level / 10.0).round() as usize;
        let bar: String = "#".repeat(filled.min(10));

        let mut handle = stdout.lock();
        writeln!(
            handle,
            "[{bar:<10}] {level:5.1}  {}",
            monitor.status_line()
        )?;
        handle.flush()?;

        if args.ticks != 0 && elapsed >= args.ticks {
            break;
        }
    }

    monitor.stop();
    Ok(())
}
