//! Coordinate sources for the enrichment adapter.
//!
//! The adapter only ever consumes a validated (lat, lon) pair; where it
//! comes from is pluggable behind [`CoordinateSource`]. This crate
//! ships an explicit-position source and a country-centroid lookup
//! over static reference data. A device-geolocation implementation
//! fits the same trait and error taxonomy.

use crate::errors::LocationError;

/// A validated geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Construct a point, validating ranges.
    ///
    /// # Errors
    ///
    /// Returns `LocationError::OutOfRange` if latitude is outside
    /// [-90, 90] or longitude outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::OutOfRange {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}

/// Something that can produce the user's coordinate.
pub trait CoordinateSource {
    /// Resolve a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] if the position cannot be obtained;
    /// the enrichment adapter surfaces this before any remote call.
    fn resolve(&self) -> Result<GeoPoint, LocationError>;
}

/// A coordinate supplied directly by the caller.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    latitude: f64,
    longitude: f64,
}

impl FixedPosition {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl CoordinateSource for FixedPosition {
    fn resolve(&self) -> Result<GeoPoint, LocationError> {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Static country -> centroid reference table.
const COUNTRY_CENTROIDS: &[(&str, f64, f64)] = &[
    ("australia", -25.27, 133.78),
    ("canada", 56.13, -106.35),
    ("chile", -35.68, -71.54),
    ("china", 35.86, 104.20),
    ("france", 46.23, 2.21),
    ("germany", 51.17, 10.45),
    ("greece", 39.07, 21.82),
    ("iceland", 64.96, -19.02),
    ("india", 20.59, 78.96),
    ("indonesia", -0.79, 113.92),
    ("italy", 41.87, 12.57),
    ("japan", 36.20, 138.25),
    ("mexico", 23.63, -102.55),
    ("new zealand", -40.90, 174.89),
    ("peru", -9.19, -75.02),
    ("philippines", 12.88, 121.77),
    ("turkey", 38.96, 35.24),
    ("united kingdom", 55.38, -3.44),
    ("united states", 37.09, -95.71),
];

/// Country-centroid coordinate source.
#[derive(Debug, Clone)]
pub struct CountryCentroid {
    country: String,
}

impl CountryCentroid {
    #[must_use]
    pub fn new(country: &str) -> Self {
        Self {
            country: country.to_string(),
        }
    }
}

impl CoordinateSource for CountryCentroid {
    fn resolve(&self) -> Result<GeoPoint, LocationError> {
        let needle = self.country.trim().to_lowercase();
        COUNTRY_CENTROIDS
            .iter()
            .find(|(name, _, _)| *name == needle)
            .map(|&(_, lat, lon)| GeoPoint::new(lat, lon))
            .transpose()?
            .ok_or_else(|| LocationError::UnknownCountry(self.country.clone()))
    }
}
