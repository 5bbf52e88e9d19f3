//! Zone documents as stored by the external persistence layer.
//!
//! Records are loosely typed: every geometric field is optional and nothing
//! is validated until the record is converted into a [`Zone`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::zone::{CourierRadii, Zone, ZoneKind, ZoneStatus};
use crate::error::ZoneError;
use crate::geometry::{GeoPoint, RawPoint, Shape};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleRecord {
    pub center: Option<RawPoint>,
    /// Radius in meters
    pub radius: Option<f64>,
}

/// Raw zone document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneRecord {
    pub id: String,
    pub owner_ref: String,
    pub kind: Option<ZoneKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub circles: Vec<CircleRecord>,
    /// Each entry is one ring, closing point optional
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub polygons: Vec<Vec<RawPoint>>,
    /// Courier zone center
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<RawPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_package_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_package_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ZoneStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl ZoneRecord {
    /// Draft documents are still being edited and may hold partial shapes
    pub fn is_draft(&self) -> bool {
        self.status == Some(ZoneStatus::Editing)
    }

    fn shapes(&self) -> Result<Vec<Shape>, ZoneError> {
        let mut shapes = Vec::with_capacity(self.circles.len() + self.polygons.len());

        for circle in &self.circles {
            let center = circle
                .center
                .ok_or_else(|| ZoneError::shape("circle without center"))?;
            let radius = circle
                .radius
                .ok_or_else(|| ZoneError::shape("circle without radius"))?;
            shapes.push(Shape::circle(GeoPoint::try_from(center)?, radius)?);
        }

        for ring in &self.polygons {
            let points = ring
                .iter()
                .map(|p| GeoPoint::try_from(*p))
                .collect::<Result<Vec<_>, _>>()?;
            shapes.push(Shape::polygon(points)?);
        }

        Ok(shapes)
    }

    fn courier_radii(&self) -> Result<CourierRadii, ZoneError> {
        let center = self
            .center
            .ok_or_else(|| ZoneError::record(&self.id, "courier zone without center"))?;
        let single = self
            .single_package_radius
            .ok_or_else(|| ZoneError::record(&self.id, "missing singlePackageRadius"))?;
        let multi = self
            .multi_package_radius
            .ok_or_else(|| ZoneError::record(&self.id, "missing multiPackageRadius"))?;
        CourierRadii::new(GeoPoint::try_from(center)?, single, multi)
    }
}

impl TryFrom<ZoneRecord> for Zone {
    type Error = ZoneError;

    fn try_from(record: ZoneRecord) -> Result<Self, Self::Error> {
        if record.id.is_empty() {
            return Err(ZoneError::record("<unnamed>", "missing id"));
        }
        let kind = record
            .kind
            .ok_or_else(|| ZoneError::record(&record.id, "missing kind"))?;

        let mut zone = match kind {
            ZoneKind::CourierZone => {
                Zone::courier(record.id.clone(), record.owner_ref.clone(), record.courier_radii()?)?
            }
            _ => Zone::new(record.id.clone(), record.owner_ref.clone(), kind, record.shapes()?)?,
        };

        zone.name = record.name;
        zone.color = record.color;
        zone.priority = record.priority;
        zone.active = record.active.unwrap_or(true);
        zone.deleted = record.deleted;
        zone.status = record.status.unwrap_or_default();
        zone.created_at = record.created_at;
        zone.updated_at = record.updated_at;
        zone.version = record.version;

        Ok(zone)
    }
}
