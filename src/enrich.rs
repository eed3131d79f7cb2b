//! Geo-proximity enrichment adapter.
//!
//! Forwards the user's coordinate and the raw feed body to a hosted
//! enrichment service and exposes whatever structured result comes
//! back. Distances are trusted as returned; this adapter never
//! computes geodesic distance itself.

use std::cmp::Ordering;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::EnrichmentError;
use crate::locate::GeoPoint;
use crate::models::FeedSnapshot;

/// Default request timeout in seconds.
///
/// The upstream dashboard waited indefinitely on this call; a bounded
/// timeout is the one hardening divergence we take.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent string for enrichment requests.
const USER_AGENT: &str = concat!("quakefeel/", env!("CARGO_PKG_VERSION"));

/// Request body for the enrichment service.
#[derive(Debug, Serialize)]
struct EnrichmentRequest<'a> {
    latitude: f64,
    longitude: f64,
    #[serde(rename = "earthquakeData")]
    earthquake_data: &'a str,
}

/// Raw response from the enrichment service.
///
/// `features` stays `Option` so a response that omits the array
/// entirely is distinguishable from an empty one.
#[derive(Debug, Deserialize)]
struct EnrichmentResponse {
    #[serde(default)]
    summary: Option<String>,
    features: Option<Vec<WireEnrichedEvent>>,
}

#[derive(Debug, Deserialize)]
struct WireEnrichedEvent {
    id: String,
    mag: Option<f64>,
    place: Option<String>,
    time: Option<i64>,
    title: Option<String>,
    #[serde(rename = "proximity_to_user_km")]
    proximity_km: Option<f64>,
}

/// One event as enriched by the remote service.
///
/// Correlated to [`crate::models::SeismicEvent`] only by shared `id`
/// values; this is its own identity namespace.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedEvent {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    pub occurred_at_ms: Option<i64>,
    pub title: Option<String>,
    pub proximity_km: Option<f64>,
}

impl From<WireEnrichedEvent> for EnrichedEvent {
    fn from(w: WireEnrichedEvent) -> Self {
        Self {
            id: w.id,
            magnitude: w.mag,
            place: w.place,
            occurred_at_ms: w.time,
            title: w.title,
            proximity_km: w.proximity_km,
        }
    }
}

/// Result of one enrichment request.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    pub summary: String,
    pub events: Vec<EnrichedEvent>,
}

/// Sort enriched events for display: ascending proximity, events
/// without a value after all events that have one. Stable among
/// equals.
pub fn sort_by_proximity(events: &mut [EnrichedEvent]) {
    events.sort_by(|a, b| match (a.proximity_km, b.proximity_km) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Client for the hosted enrichment service.
pub struct EnrichmentClient {
    client: Client,
    endpoint: String,
}

impl EnrichmentClient {
    /// Create a client against the given endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(endpoint: &str) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Run one enrichment request.
    ///
    /// The coordinate is already validated by construction of
    /// [`GeoPoint`]; the full serialized feed is forwarded verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, or a
    /// response lacking the features array.
    #[instrument(skip(self, snapshot), fields(endpoint = %self.endpoint))]
    pub fn enrich(
        &self,
        point: GeoPoint,
        snapshot: &FeedSnapshot,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        let body = EnrichmentRequest {
            latitude: point.latitude(),
            longitude: point.longitude(),
            earthquake_data: &snapshot.raw_body,
        };

        debug!("requesting enrichment for {} events", snapshot.events.len());

        let response = self.client.post(&self.endpoint).json(&body).send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EnrichmentResponse = response
            .json()
            .map_err(|e| EnrichmentError::MalformedResponse(e.to_string()))?;

        parse_result(parsed)
    }
}

/// Validate and normalize a decoded enrichment response.
fn parse_result(response: EnrichmentResponse) -> Result<EnrichmentResult, EnrichmentError> {
    let Some(features) = response.features else {
        return Err(EnrichmentError::MalformedResponse(
            "response has no features array".into(),
        ));
    };

    Ok(EnrichmentResult {
        summary: response.summary.unwrap_or_default(),
        events: features.into_iter().map(EnrichedEvent::from).collect(),
    })
}

/// Ticket identifying one outgoing enrichment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentTicket {
    generation: u64,
}

/// Single-flight enrichment tracking.
///
/// One result per user-initiated request: a new request clears the
/// stored result and abandons tracking of any prior in-flight call.
/// Results are replaced wholesale, never merged.
#[derive(Debug, Default)]
pub struct EnrichmentState {
    generation: u64,
    result: Option<EnrichmentResult>,
}

impl EnrichmentState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new request: clear the stored result and supersede any
    /// prior in-flight request.
    pub fn begin(&mut self) -> EnrichmentTicket {
        self.generation += 1;
        self.result = None;
        EnrichmentTicket {
            generation: self.generation,
        }
    }

    /// Resolve a completed request. Superseded results are dropped.
    /// Returns `true` if the result was accepted.
    pub fn complete(&mut self, ticket: EnrichmentTicket, result: EnrichmentResult) -> bool {
        if ticket.generation != self.generation {
            debug!("discarding superseded enrichment result");
            return false;
        }
        self.result = Some(result);
        true
    }

    /// The latest accepted result, if any.
    #[must_use]
    pub fn result(&self) -> Option<&EnrichmentResult> {
        self.result.as_ref()
    }
}
