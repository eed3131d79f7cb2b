//! USGS earthquake feed client.
//!
//! Provides blocking HTTP access to the summary feeds and the
//! last-selection-wins bookkeeping that discards stale responses when
//! the user switches sources while a fetch is still in flight.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, instrument};

use crate::errors::FetchError;
use crate::models::{FeatureCollection, FeedSnapshot};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakefeel/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// The five selectable feed presets, distinguished by time window and
/// magnitude threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    AllHour,
    AllDay,
    Mag25Week,
    Mag45Month,
    SignificantMonth,
}

impl FeedSource {
    /// Get the URL path segment for this feed source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllHour => "all_hour",
            Self::AllDay => "all_day",
            Self::Mag25Week => "2.5_week",
            Self::Mag45Month => "4.5_month",
            Self::SignificantMonth => "significant_month",
        }
    }

    /// Human label shown in the settings surface.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllHour => "Past Hour (All)",
            Self::AllDay => "Past Day (All)",
            Self::Mag25Week => "Past 7 Days (M2.5+)",
            Self::Mag45Month => "Past 30 Days (M4.5+)",
            Self::SignificantMonth => "Significant (Past 30 Days)",
        }
    }

    /// Full feed URL for this source.
    #[must_use]
    pub fn url(self) -> String {
        format!(
            "{USGS_BASE_URL}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.as_str()
        )
    }
}

impl std::str::FromStr for FeedSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all_hour" => Ok(Self::AllHour),
            "all_day" => Ok(Self::AllDay),
            "2.5_week" => Ok(Self::Mag25Week),
            "4.5_month" => Ok(Self::Mag45Month),
            "significant_month" => Ok(Self::SignificantMonth),
            _ => Err(format!("unknown feed source: {s}")),
        }
    }
}

/// Client for USGS earthquake summary feeds.
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create a new feed client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: USGS_BASE_URL.to_string(),
        })
    }

    /// Fetch a summary GeoJSON feed and normalize it into a snapshot.
    ///
    /// Safe to re-invoke; a repeated call simply produces a snapshot
    /// that replaces the prior one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the endpoint returns a
    /// non-success status, or the body cannot be parsed.
    #[instrument(skip(self), fields(feed = source.as_str()))]
    pub fn fetch(&self, source: FeedSource) -> Result<FeedSnapshot, FetchError> {
        let url = format!(
            "{}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.base_url,
            source.as_str()
        );

        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send()?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text()?;
        let collection: FeatureCollection = serde_json::from_str(&body)?;
        collection.validate()?;

        debug!("fetched {} events", collection.features.len());
        Ok(FeedSnapshot::from_collection(&collection, &url, body))
    }
}

/// Ticket identifying one outgoing fetch: the source it was issued for
/// and the selection generation at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    source: FeedSource,
    generation: u64,
}

impl FetchTicket {
    /// Which source this fetch was issued for.
    #[must_use]
    pub const fn source(self) -> FeedSource {
        self.source
    }
}

/// Last-selection-wins snapshot store.
///
/// Fetches triggered by rapid source switching may complete out of
/// order; only the result whose ticket still matches the current
/// selection is accepted. Everything else is discarded at resolution
/// time.
#[derive(Debug)]
pub struct FeedState {
    selected: FeedSource,
    generation: u64,
    snapshot: Option<FeedSnapshot>,
    error: Option<FetchError>,
}

impl FeedState {
    /// Create a state tracking the given initial selection.
    #[must_use]
    pub fn new(initial: FeedSource) -> Self {
        Self {
            selected: initial,
            generation: 0,
            snapshot: None,
            error: None,
        }
    }

    /// The currently selected source.
    #[must_use]
    pub const fn selected(&self) -> FeedSource {
        self.selected
    }

    /// Change the selected source, invalidating any in-flight fetch.
    ///
    /// Returns `true` if the selection actually changed.
    pub fn select(&mut self, source: FeedSource) -> bool {
        if source == self.selected {
            return false;
        }
        self.selected = source;
        self.generation += 1;
        true
    }

    /// Issue a ticket for a fetch of the current selection.
    #[must_use]
    pub const fn ticket(&self) -> FetchTicket {
        FetchTicket {
            source: self.selected,
            generation: self.generation,
        }
    }

    /// Resolve a completed fetch against the current selection.
    ///
    /// A result whose ticket no longer matches the current generation
    /// is dropped without touching the stored snapshot. Returns `true`
    /// if the result was accepted.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<FeedSnapshot, FetchError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "discarding stale fetch result for {}",
                ticket.source.as_str()
            );
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(e);
            }
        }
        true
    }

    /// The most recently accepted snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&FeedSnapshot> {
        self.snapshot.as_ref()
    }

    /// The error from the last accepted fetch, cleared on success.
    #[must_use]
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }
}
