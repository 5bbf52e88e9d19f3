//! Great-circle distance and local metric projection.

use geo::Coord;

use super::GeoPoint;

/// Mean Earth radius used for every distance in the crate
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lng = (b.lng() - a.lng()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h slightly above 1 for antipodal points
    let h = h.min(1.0);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Inclusive: a point exactly on the circle counts as inside
pub fn point_in_circle(p: &GeoPoint, center: &GeoPoint, radius_meters: f64) -> bool {
    haversine_distance(p, center) <= radius_meters
}

/// Equirectangular projection around an origin, in meters.
///
/// Good enough for city-scale areas and edge distances; distortion grows
/// with distance from the origin and near the poles.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LocalProjection {
    origin_lat: f64,
    origin_lng: f64,
    cos_lat: f64,
}

impl LocalProjection {
    pub(crate) fn new(origin_lat: f64, origin_lng: f64) -> Self {
        Self {
            origin_lat,
            origin_lng,
            cos_lat: origin_lat.to_radians().cos(),
        }
    }

    /// Project around the mean of the given points
    pub(crate) fn centered_on(points: &[GeoPoint]) -> Self {
        let n = points.len().max(1) as f64;
        let lat = points.iter().map(|p| p.lat()).sum::<f64>() / n;
        let lng = points.iter().map(|p| p.lng()).sum::<f64>() / n;
        Self::new(lat, lng)
    }

    pub(crate) fn project(&self, p: &GeoPoint) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS_METERS * (p.lng() - self.origin_lng).to_radians() * self.cos_lat,
            y: EARTH_RADIUS_METERS * (p.lat() - self.origin_lat).to_radians(),
        }
    }
}
