//! Geometry kernel: points, circles, polygon rings and the containment
//! predicates zone resolution is built on.
//!
//! Shapes are validated when they are constructed; the predicates never fail
//! on a shape that exists.

mod distance;
mod point;
mod polygon;
mod shape;

pub use distance::{haversine_distance, point_in_circle, EARTH_RADIUS_METERS};
pub use point::{GeoPoint, RawPoint};
pub use polygon::{distance_to_ring, point_in_polygon, polygon_area, Ring};
pub use shape::{Circle, Shape};

/// Area of a circle in square meters
pub fn circle_area(radius_meters: f64) -> f64 {
    std::f64::consts::PI * radius_meters * radius_meters
}
