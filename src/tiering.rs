//! Courier zone tiering by package count, and distance-based fee inputs.

use serde::{Deserialize, Serialize};

use crate::geometry::{haversine_distance, GeoPoint};
use crate::models::CourierRadii;

/// Which of the two courier radii applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageTier {
    Single,
    Multi,
}

impl PackageTier {
    pub fn for_package_count(package_count: u32) -> Self {
        if package_count <= 1 {
            PackageTier::Single
        } else {
            PackageTier::Multi
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResult {
    pub eligible: bool,
    pub tier: PackageTier,
    /// Great-circle distance from the zone center
    pub distance_meters: f64,
    /// Radius the tier was checked against
    pub radius_meters: f64,
}

/// Check `point` against the radius selected by `package_count`.
///
/// The configured radius is applied literally, even when the multi-package
/// radius is smaller than the single-package one.
pub fn tier(point: &GeoPoint, radii: &CourierRadii, package_count: u32) -> TierResult {
    let tier = PackageTier::for_package_count(package_count);
    let radius_meters = match tier {
        PackageTier::Single => radii.single_package_radius,
        PackageTier::Multi => radii.multi_package_radius,
    };
    let distance_meters = haversine_distance(point, &radii.center);

    TierResult {
        eligible: distance_meters <= radius_meters,
        tier,
        distance_meters,
        radius_meters,
    }
}

/// Distance-based delivery fee
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FeeSchedule {
    pub base_fee: f64,
    /// Charged per km beyond `included_meters`
    pub per_km: f64,
    #[serde(default)]
    pub included_meters: f64,
}

impl FeeSchedule {
    /// Fee for an eligible tier result, rounded to cents; `None` if ineligible
    pub fn quote(&self, result: &TierResult) -> Option<f64> {
        if !result.eligible {
            return None;
        }
        let billable_km = (result.distance_meters - self.included_meters).max(0.0) / 1000.0;
        let fee = self.base_fee + self.per_km * billable_km;
        Some((fee * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    /// Point `meters` due north of `center`
    fn north_of(center: GeoPoint, meters: f64) -> GeoPoint {
        pt(center.lat() + meters / 111_194.93, center.lng())
    }

    #[test]
    fn test_tier_selection() {
        assert_eq!(PackageTier::for_package_count(0), PackageTier::Single);
        assert_eq!(PackageTier::for_package_count(1), PackageTier::Single);
        assert_eq!(PackageTier::for_package_count(2), PackageTier::Multi);
        assert_eq!(PackageTier::for_package_count(40), PackageTier::Multi);
    }

    #[test]
    fn test_two_km_point() {
        let center = pt(41.0082, 28.9784);
        let radii = CourierRadii::new(center, 1000.0, 3000.0).unwrap();
        let point = north_of(center, 2000.0);

        let single = tier(&point, &radii, 1);
        assert!(!single.eligible);
        assert_eq!(single.tier, PackageTier::Single);
        assert_eq!(single.radius_meters, 1000.0);

        let multi = tier(&point, &radii, 2);
        assert!(multi.eligible);
        assert_eq!(multi.tier, PackageTier::Multi);
        assert!((multi.distance_meters - 2000.0).abs() < 0.01);
    }

    #[test]
    fn test_inverted_radii_applied_literally() {
        let center = pt(41.0, 29.0);
        let radii = CourierRadii::new(center, 3000.0, 1000.0).unwrap();
        let point = north_of(center, 2000.0);

        assert!(tier(&point, &radii, 1).eligible);
        assert!(!tier(&point, &radii, 3).eligible);
    }

    #[test]
    fn test_fee_quote() {
        let center = pt(41.0, 29.0);
        let radii = CourierRadii::new(center, 1000.0, 5000.0).unwrap();
        let schedule = FeeSchedule {
            base_fee: 20.0,
            per_km: 4.0,
            included_meters: 1000.0,
        };

        let near = tier(&center, &radii, 1);
        assert_eq!(schedule.quote(&near), Some(20.0));

        let three_km = tier(&north_of(center, 3000.0), &radii, 2);
        assert_eq!(schedule.quote(&three_km), Some(28.0));

        let ineligible = tier(&north_of(center, 3000.0), &radii, 1);
        assert_eq!(schedule.quote(&ineligible), None);
    }
}
