//! Polygon rings and the planar point-in-polygon test.
//!
//! Longitude/latitude are treated as planar x/y. This holds for city-scale
//! zones and breaks down near the poles or across the antimeridian.

use geo::{
    Area, BoundingRect, Centroid, Closest, ClosestPoint, Coord, LineString, Point, Polygon, Rect,
};
use hashbrown::HashSet;
use serde::Serialize;

use super::distance::LocalProjection;
use super::GeoPoint;
use crate::error::ZoneError;

/// Max distance (degrees) at which a point counts as lying on an edge
const EDGE_EPSILON: f64 = 1e-9;

/// Collinearity tolerance on the cross product (degrees squared)
const COLLINEAR_EPSILON: f64 = 1e-12;

/// Closed polygon ring of at least three distinct, non-collinear points.
///
/// The closing edge is implicit; a repeated first point at the end of the
/// input is dropped on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    points: Vec<GeoPoint>,
    #[serde(skip)]
    bbox: Rect<f64>,
}

impl Ring {
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, ZoneError> {
        // Drop consecutive duplicates and the explicit closing point
        let mut points = points;
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let distinct: HashSet<(u64, u64)> = points
            .iter()
            .map(|p| (p.lat().to_bits(), p.lng().to_bits()))
            .collect();
        if distinct.len() < 3 {
            return Err(ZoneError::shape(format!(
                "ring needs at least 3 distinct points, got {}",
                distinct.len()
            )));
        }

        if is_collinear(&points) {
            return Err(ZoneError::shape("ring points are collinear"));
        }

        let bbox = to_polygon(&points)
            .bounding_rect()
            .ok_or_else(|| ZoneError::shape("ring has no extent"))?;

        Ok(Self { points, bbox })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// Bounding box in lng/lat
    pub fn bbox(&self) -> Rect<f64> {
        self.bbox
    }

    /// Ring as a geo polygon in lng/lat space
    pub fn to_polygon(&self) -> Polygon<f64> {
        to_polygon(&self.points)
    }

    /// Planar centroid in lng/lat space
    pub fn centroid(&self) -> Option<GeoPoint> {
        let c = self.to_polygon().centroid()?;
        GeoPoint::new(c.y(), c.x()).ok()
    }
}

fn to_polygon(points: &[GeoPoint]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points.iter().map(|p| p.to_coord()).collect();
    Polygon::new(LineString::new(coords), vec![])
}

fn is_collinear(points: &[GeoPoint]) -> bool {
    let origin = points[0].to_coord();
    // First point that differs from the origin fixes the direction
    let Some(dir) = points
        .iter()
        .map(|p| p.to_coord() - origin)
        .find(|d| d.x != 0.0 || d.y != 0.0)
    else {
        return true;
    };

    points.iter().all(|p| {
        let d = p.to_coord() - origin;
        (dir.x * d.y - dir.y * d.x).abs() <= COLLINEAR_EPSILON
    })
}

/// Even-odd ray casting. Points on an edge or vertex are inside.
pub fn point_in_polygon(p: &GeoPoint, ring: &Ring) -> bool {
    let bbox = ring.bbox();
    let (x, y) = (p.lng(), p.lat());
    if x < bbox.min().x - EDGE_EPSILON
        || x > bbox.max().x + EDGE_EPSILON
        || y < bbox.min().y - EDGE_EPSILON
        || y > bbox.max().y + EDGE_EPSILON
    {
        return false;
    }

    let pts = ring.points();
    let mut inside = false;
    let mut j = pts.len() - 1;

    for i in 0..pts.len() {
        let a = pts[i].to_coord();
        let b = pts[j].to_coord();

        if on_segment(x, y, a, b) {
            return true;
        }

        if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }

    inside
}

fn on_segment(x: f64, y: f64, a: Coord<f64>, b: Coord<f64>) -> bool {
    if x < a.x.min(b.x) - EDGE_EPSILON
        || x > a.x.max(b.x) + EDGE_EPSILON
        || y < a.y.min(b.y) - EDGE_EPSILON
        || y > a.y.max(b.y) + EDGE_EPSILON
    {
        return false;
    }

    let len = (b.x - a.x).hypot(b.y - a.y);
    if len == 0.0 {
        return (x - a.x).hypot(y - a.y) <= EDGE_EPSILON;
    }

    let cross = (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x);
    cross.abs() / len <= EDGE_EPSILON
}

/// Planar area in square meters.
///
/// Shoelace over an equirectangular projection centred on the ring. Only
/// used to rank overlapping zones, so the approximation is fine.
pub fn polygon_area(ring: &Ring) -> f64 {
    let proj = LocalProjection::centered_on(ring.points());
    let coords: Vec<Coord<f64>> = ring.points().iter().map(|p| proj.project(p)).collect();
    Polygon::new(LineString::new(coords), vec![]).unsigned_area()
}

/// Distance from `p` to the nearest ring edge in meters, always >= 0
pub fn distance_to_ring(p: &GeoPoint, ring: &Ring) -> f64 {
    let proj = LocalProjection::new(p.lat(), p.lng());
    let mut coords: Vec<Coord<f64>> = ring.points().iter().map(|q| proj.project(q)).collect();
    coords.push(coords[0]);
    let exterior = LineString::new(coords);
    let origin = Point::new(0.0, 0.0);

    match exterior.closest_point(&origin) {
        Closest::Intersection(_) => 0.0,
        Closest::SinglePoint(c) => c.x().hypot(c.y()),
        Closest::Indeterminate => exterior
            .coords()
            .map(|c| c.x.hypot(c.y))
            .fold(f64::INFINITY, f64::min),
    }
}
