//! Data models for USGS earthquake feed responses.
//!
//! The raw structures match the GeoJSON summary-feed format; the
//! normalized [`SeismicEvent`]/[`FeedSnapshot`] layer is what the rest
//! of the crate consumes.

use serde::{Deserialize, Serialize};

use crate::errors::FetchError;

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Feed metadata
    pub metadata: Metadata,

    /// Earthquake events
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.type_ != "FeatureCollection" {
            return Err(FetchError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    /// When this feed was generated (ms since epoch)
    pub generated: i64,

    /// Feed URL
    pub url: String,

    /// Human-readable title
    pub title: String,

    /// Number of events in response. Advisory; the `features` array is
    /// authoritative.
    pub count: usize,
}

/// A single earthquake event as delivered by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Unique event ID, stable across refetches of the same source
    pub id: String,

    /// Geographic location
    pub geometry: Geometry,

    /// Event properties
    pub properties: Properties,
}

impl Feature {
    /// Validate the event structure.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.id.is_empty() {
            return Err(FetchError::InvalidResponse("empty event ID".into()));
        }
        Ok(())
    }
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// Event properties from the USGS feed.
///
/// Numeric fields the feed may omit stay `Option` so absent values are
/// never confused with a legitimate zero.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: Option<i64>,

    /// Last update time (ms since epoch)
    pub updated: Option<i64>,

    /// Event page URL
    pub url: Option<String>,

    /// Human-readable title
    pub title: Option<String>,
}

/// One observed seismic event, normalized for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeismicEvent {
    pub id: String,
    pub magnitude: Option<f64>,
    pub place: Option<String>,
    pub occurred_at_ms: Option<i64>,
    /// Feed revision timestamp, used by the live-stream dedup ring
    pub updated_at_ms: Option<i64>,
    pub detail_url: Option<String>,
}

impl From<&Feature> for SeismicEvent {
    fn from(f: &Feature) -> Self {
        Self {
            id: f.id.clone(),
            magnitude: f.properties.mag,
            place: f.properties.place.clone(),
            occurred_at_ms: f.properties.time,
            updated_at_ms: f.properties.updated,
            detail_url: f.properties.url.clone(),
        }
    }
}

/// The result of one feed fetch.
///
/// Created atomically on successful fetch completion and replaced
/// wholesale; collections are never merged or partially updated.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    /// Events in source order (not display order)
    pub events: Vec<SeismicEvent>,

    /// Metadata event count; expected but not guaranteed to equal
    /// `events.len()`
    pub event_count: usize,

    /// Which endpoint produced this snapshot
    pub source_url: String,

    /// Raw response body, forwarded verbatim to the enrichment service
    pub raw_body: String,
}

impl FeedSnapshot {
    /// Build a snapshot from a validated feature collection.
    #[must_use]
    pub fn from_collection(collection: &FeatureCollection, source_url: &str, raw_body: String) -> Self {
        Self {
            events: collection.features.iter().map(SeismicEvent::from).collect(),
            event_count: collection.metadata.count,
            source_url: source_url.to_string(),
            raw_body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_feed() {
        let json = include_str!("../tools/sample_feed.json");
        let feed: FeatureCollection =
            serde_json::from_str(json).expect("failed to parse sample feed");

        feed.validate().expect("invalid feed");
        assert_eq!(feed.type_, "FeatureCollection");
        assert!(!feed.features.is_empty());

        for feature in &feed.features {
            feature.validate().expect("invalid feature");
            assert!(!feature.id.is_empty());
        }
    }

    #[test]
    fn test_snapshot_preserves_source_order() {
        let json = include_str!("../tools/sample_feed.json");
        let feed: FeatureCollection =
            serde_json::from_str(json).expect("failed to parse sample feed");

        let snapshot = FeedSnapshot::from_collection(&feed, "test://feed", json.to_string());
        assert_eq!(snapshot.events.len(), feed.features.len());
        for (event, feature) in snapshot.events.iter().zip(&feed.features) {
            assert_eq!(event.id, feature.id);
        }
    }

    #[test]
    fn test_absent_magnitude_stays_absent() {
        let json = r#"{
            "id": "q1",
            "geometry": { "coordinates": [140.0, 35.0, 10.0] },
            "properties": { "mag": null, "place": null, "time": null, "updated": null, "url": null, "title": null }
        }"#;
        let feature: Feature = serde_json::from_str(json).expect("failed to parse feature");
        let event = SeismicEvent::from(&feature);
        assert_eq!(event.magnitude, None);
        assert_eq!(event.occurred_at_ms, None);
        assert_eq!(event.place, None);
    }

    #[test]
    fn test_reject_wrong_collection_type() {
        let json = r#"{
            "type": "NotACollection",
            "metadata": { "generated": 0, "url": "u", "title": "t", "count": 0 },
            "features": []
        }"#;
        let feed: FeatureCollection = serde_json::from_str(json).expect("failed to parse");
        assert!(feed.validate().is_err());
    }
}
