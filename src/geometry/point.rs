use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

/// Geographic point in degrees.
///
/// Always finite and within range; the only way to build one is
/// [`GeoPoint::new`] (or deserialization, which goes through it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

/// Unvalidated lat/lng pair as it arrives from storage or a query string
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ZoneError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ZoneError::shape(format!(
                "coordinate is not finite: ({}, {})",
                lat, lng
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ZoneError::shape(format!("latitude out of range: {}", lat)));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ZoneError::shape(format!("longitude out of range: {}", lng)));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Planar coordinate with x = longitude, y = latitude
    pub fn to_coord(self) -> geo::Coord<f64> {
        geo::Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ZoneError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lng)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}
