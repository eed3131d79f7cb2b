//! Output formatters for presented events and enrichment results.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::enrich::{EnrichedEvent, EnrichmentResult};
use crate::presenter::{PresentedEvent, SeverityTier};

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Severity tier colors
const RED: &str = "\x1b[91m"; // high: mag >= 4.5
const YELLOW: &str = "\x1b[93m"; // medium: mag >= 2.5
const WHITE: &str = "\x1b[97m"; // low

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Get the color code for a severity tier.
const fn tier_color(tier: SeverityTier) -> &'static str {
    match tier {
        SeverityTier::High => RED,
        SeverityTier::Medium => YELLOW,
        SeverityTier::Low => WHITE,
    }
}

/// Serialized record for JSON/NDJSON output.
#[derive(Debug, Serialize)]
struct OutputRecord<'a> {
    id: &'a str,
    time: String,
    magnitude: Option<f64>,
    severity: &'static str,
    place: &'a str,
    url: Option<&'a str>,
}

impl<'a> OutputRecord<'a> {
    fn from_presented(p: &'a PresentedEvent) -> Self {
        let time = p
            .event
            .occurred_at_ms
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map_or_else(|| "unknown".into(), |t| t.to_rfc3339());

        Self {
            id: &p.event.id,
            time,
            magnitude: p.event.magnitude,
            severity: p.tier.as_str(),
            place: p.place_label(),
            url: p.event.detail_url.as_deref(),
        }
    }
}

/// Write presented events in human-readable format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(
    writer: &mut W,
    events: &[PresentedEvent],
    now: DateTime<Utc>,
) -> io::Result<()> {
    for p in events {
        let mag_str = p
            .event
            .magnitude
            .map_or_else(|| "?".into(), |m| format!("{m:.1}"));

        let color = tier_color(p.tier);
        let tier = p.tier.as_str();
        let age = p.age_label(now);
        let place = p.place_label();

        writeln!(
            writer,
            "{color}{BOLD}M{mag_str}{RESET} │ {color}{tier:6}{RESET} │ {DIM}{age:>12}{RESET} │ {place}"
        )?;
    }
    Ok(())
}

/// Write presented events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[PresentedEvent]) -> io::Result<()> {
    let output: Vec<OutputRecord> = events.iter().map(OutputRecord::from_presented).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write presented events as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[PresentedEvent]) -> io::Result<()> {
    for p in events {
        let record = OutputRecord::from_presented(p);
        let json = serde_json::to_string(&record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write presented events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[PresentedEvent],
    format: Format,
    now: DateTime<Utc>,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events, now),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}

/// Write an enrichment result: the summary paragraph, then the
/// proximity-sorted events.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_enrichment<W: Write>(
    writer: &mut W,
    result: &EnrichmentResult,
    sorted: &[EnrichedEvent],
) -> io::Result<()> {
    if !result.summary.is_empty() {
        writeln!(writer, "{BOLD}{}{RESET}\n", result.summary)?;
    }

    for event in sorted {
        let proximity = event
            .proximity_km
            .map_or_else(|| "     ?".into(), |km| format!("{km:>6.1}"));
        let mag_str = event
            .magnitude
            .map_or_else(|| "?".into(), |m| format!("{m:.1}"));
        let label = event
            .title
            .as_deref()
            .or(event.place.as_deref())
            .unwrap_or("Unknown location");

        writeln!(writer, "{DIM}{proximity} km{RESET} │ M{mag_str} │ {label}")?;
    }
    Ok(())
}
