//! Zone entities as seen by the resolver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::geometry::{GeoPoint, Shape};

/// What a zone is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    /// Area a store delivers to
    ServiceArea,
    /// Courier pickup radius around a center, tiered by package count
    CourierZone,
    /// Exclusion area: nothing inside is servable
    CustomerBlockArea,
}

impl ZoneKind {
    pub fn all() -> &'static [ZoneKind] {
        &[
            ZoneKind::ServiceArea,
            ZoneKind::CourierZone,
            ZoneKind::CustomerBlockArea,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::ServiceArea => "service_area",
            ZoneKind::CourierZone => "courier_zone",
            ZoneKind::CustomerBlockArea => "customer_block_area",
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ZoneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneKind::all()
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown zone kind: {}", s))
    }
}

/// Editing lifecycle of a zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    /// Draft; shape may be empty or partial
    Editing,
    /// Committed by the owner
    #[default]
    Saved,
}

/// The two pickup radii of a courier zone, both around the same center.
///
/// `multi_package_radius >= single_package_radius` is expected but not
/// enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierRadii {
    pub center: GeoPoint,
    pub single_package_radius: f64,
    pub multi_package_radius: f64,
}

impl CourierRadii {
    pub fn new(center: GeoPoint, single: f64, multi: f64) -> Result<Self, ZoneError> {
        for (label, radius) in [("single", single), ("multi", multi)] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ZoneError::shape(format!(
                    "{} package radius must be positive, got {}",
                    label, radius
                )));
            }
        }
        Ok(Self {
            center,
            single_package_radius: single,
            multi_package_radius: multi,
        })
    }

    /// Multi-package radius smaller than single-package radius
    pub fn is_inverted(&self) -> bool {
        self.multi_package_radius < self.single_package_radius
    }

    /// Largest radius; any eligible point lies within it
    pub fn outer_radius(&self) -> f64 {
        self.single_package_radius.max(self.multi_package_radius)
    }
}

/// A validated zone.
///
/// Zones are shared as `Arc<Zone>` inside a snapshot and never mutated in
/// place; edits arrive as a new snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub owner_ref: String,
    pub kind: ZoneKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Never empty
    pub shapes: Vec<Shape>,
    /// Set for courier zones only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courier: Option<CourierRadii>,
    /// Explicit priority, higher wins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub active: bool,
    pub deleted: bool,
    pub status: ZoneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl Zone {
    /// Saved, active zone with the given shapes.
    ///
    /// Fails if `shapes` is empty.
    pub fn new(
        id: impl Into<String>,
        owner_ref: impl Into<String>,
        kind: ZoneKind,
        shapes: Vec<Shape>,
    ) -> Result<Self, ZoneError> {
        let id = id.into();
        if shapes.is_empty() {
            return Err(ZoneError::record(&id, "zone has no shape"));
        }
        Ok(Self {
            id,
            owner_ref: owner_ref.into(),
            kind,
            name: None,
            color: None,
            shapes,
            courier: None,
            priority: None,
            active: true,
            deleted: false,
            status: ZoneStatus::Saved,
            created_at: None,
            updated_at: None,
            version: 1,
        })
    }

    /// Courier zone covering the outer of its two radii
    pub fn courier(
        id: impl Into<String>,
        owner_ref: impl Into<String>,
        radii: CourierRadii,
    ) -> Result<Self, ZoneError> {
        let envelope = Shape::circle(radii.center, radii.outer_radius())?;
        let mut zone = Self::new(id, owner_ref, ZoneKind::CourierZone, vec![envelope])?;
        zone.courier = Some(radii);
        Ok(zone)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Takes part in resolution: saved, active and not soft-deleted
    pub fn is_resolvable(&self) -> bool {
        self.active && !self.deleted && self.status == ZoneStatus::Saved
    }

    /// A point is covered if any of the zone's shapes contains it
    pub fn contains(&self, p: &GeoPoint) -> bool {
        self.shapes.iter().any(|s| s.contains(p))
    }

    /// Total shape area in square meters (overlaps between shapes are not
    /// subtracted)
    pub fn area(&self) -> f64 {
        self.shapes.iter().map(|s| s.area()).sum()
    }

    /// Signed distance to the nearest zone edge: positive inside any shape,
    /// negative when outside all of them
    pub fn distance_to_edge(&self, p: &GeoPoint) -> f64 {
        self.shapes
            .iter()
            .map(|s| s.distance_to_edge(p))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Service area built from both circles and polygons
    pub fn has_mixed_shapes(&self) -> bool {
        self.shapes.iter().any(|s| s.is_circle()) && self.shapes.iter().any(|s| !s.is_circle())
    }
}
