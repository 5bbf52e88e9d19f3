use serde::Serialize;

use super::distance::{haversine_distance, point_in_circle};
use super::polygon::{distance_to_ring, point_in_polygon, polygon_area};
use super::{circle_area, GeoPoint, Ring};
use crate::error::ZoneError;

/// Circle on the sphere, radius in meters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    center: GeoPoint,
    radius_meters: f64,
}

impl Circle {
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, ZoneError> {
        if !radius_meters.is_finite() || radius_meters <= 0.0 {
            return Err(ZoneError::shape(format!(
                "circle radius must be positive, got {}",
                radius_meters
            )));
        }
        Ok(Self {
            center,
            radius_meters,
        })
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }
}

/// Zone geometry: either a circle or a single polygon ring
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Circle(Circle),
    Polygon { ring: Ring },
}

impl Shape {
    pub fn circle(center: GeoPoint, radius_meters: f64) -> Result<Self, ZoneError> {
        Circle::new(center, radius_meters).map(Shape::Circle)
    }

    pub fn polygon(points: Vec<GeoPoint>) -> Result<Self, ZoneError> {
        Ring::new(points).map(|ring| Shape::Polygon { ring })
    }

    /// Boundary-inclusive containment
    pub fn contains(&self, p: &GeoPoint) -> bool {
        match self {
            Shape::Circle(c) => point_in_circle(p, &c.center, c.radius_meters),
            Shape::Polygon { ring } => point_in_polygon(p, ring),
        }
    }

    /// Area in square meters
    pub fn area(&self) -> f64 {
        match self {
            Shape::Circle(c) => circle_area(c.radius_meters),
            Shape::Polygon { ring } => polygon_area(ring),
        }
    }

    /// Signed distance to the boundary in meters: positive inside,
    /// negative outside
    pub fn distance_to_edge(&self, p: &GeoPoint) -> f64 {
        match self {
            Shape::Circle(c) => c.radius_meters - haversine_distance(p, &c.center),
            Shape::Polygon { ring } => {
                let d = distance_to_ring(p, ring);
                if point_in_polygon(p, ring) {
                    d
                } else {
                    -d
                }
            }
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self, Shape::Circle(_))
    }
}
