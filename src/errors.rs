//! Error types for quakefeel.
//!
//! Uses `thiserror` for library-style error definitions. Each failure
//! domain (feed, location, enrichment, sensor) has its own enum so a
//! failure in one panel never masquerades as a failure in another.

use thiserror::Error;

/// Errors from fetching or parsing the earthquake feed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse feed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feed endpoint returned an error status
    #[error("Feed error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// Response body was not a valid feature collection
    #[error("Invalid feed response: {0}")]
    InvalidResponse(String),
}

/// Errors from resolving a user coordinate.
#[derive(Error, Debug)]
pub enum LocationError {
    /// Coordinate out of valid range
    #[error("coordinate out of range: latitude {latitude}, longitude {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },

    /// Country name not present in the centroid table
    #[error("unknown country: {0}")]
    UnknownCountry(String),

    /// Position provider denied the request
    #[error("location access denied")]
    Denied,

    /// Position provider is not available on this device
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// Position provider did not answer in time
    #[error("location request timed out")]
    TimedOut,
}

/// Errors from the remote enrichment call.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// Coordinate could not be resolved before the remote call
    #[error(transparent)]
    Location(#[from] LocationError),

    /// HTTP request failed
    #[error("enrichment request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Enrichment service returned an error status
    #[error("enrichment error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    /// Response lacked the expected structure
    #[error("malformed enrichment response: {0}")]
    MalformedResponse(String),
}

/// Errors from the hardware motion sensor.
#[derive(Error, Debug)]
pub enum SensorError {
    /// No motion sensor hardware present
    #[error("motion sensor not available")]
    Unavailable,

    /// Sensor permission was not granted
    #[error("motion sensor permission denied")]
    PermissionDenied,

    /// Sensor raised a runtime error
    #[error("motion sensor error: {0}")]
    Device(String),
}
