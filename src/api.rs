//! Resolution API: the read-only entry points the rest of the application
//! calls.
//!
//! The free functions work on a single [`ZoneSnapshot`]; [`ResolutionService`]
//! fetches the current snapshot from a [`ZoneStore`] first. Zone edits made
//! in the external store become visible once the store's TTL expires, so two
//! calls a few seconds apart may legitimately see different zones.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use crate::geometry::GeoPoint;
use crate::models::{Zone, ZoneKind};
use crate::resolver::{covering_zones, resolve, ResolutionResult};
use crate::store::{ZoneSnapshot, ZoneStore};
use crate::tiering::{tier, FeeSchedule, TierResult};

/// Courier zone chosen for a point and package count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierZoneMatch {
    pub zone: Arc<Zone>,
    pub tier: TierResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<f64>,
}

/// Resolve a point against one store's service areas plus every block area
pub fn check_serviceability(
    snapshot: &ZoneSnapshot,
    store_id: &str,
    point: &GeoPoint,
) -> ResolutionResult {
    let zones: Vec<Arc<Zone>> = snapshot
        .zones()
        .iter()
        .filter(|z| match z.kind {
            ZoneKind::ServiceArea => z.owner_ref == store_id,
            ZoneKind::CustomerBlockArea => true,
            ZoneKind::CourierZone => false,
        })
        .cloned()
        .collect();

    resolve(point, &zones, ZoneKind::ServiceArea)
}

/// Can `store_id` deliver to `point`?
pub fn is_serviceable(snapshot: &ZoneSnapshot, store_id: &str, point: &GeoPoint) -> bool {
    check_serviceability(snapshot, store_id, point).servable
}

/// First courier zone, in precedence order, whose tier radius covers the
/// point. Blocked points get `None`.
///
/// Only eligible matches are returned, so `tier.eligible` is always `true`
/// on the result.
pub fn find_courier_zone(
    snapshot: &ZoneSnapshot,
    point: &GeoPoint,
    package_count: u32,
) -> Option<CourierZoneMatch> {
    let result = resolve(point, snapshot.zones(), ZoneKind::CourierZone);
    if result.is_blocked() {
        return None;
    }

    result.matches.into_iter().find_map(|zone| {
        let radii = zone.courier.as_ref()?;
        let tier = tier(point, radii, package_count);
        tier.eligible.then(|| CourierZoneMatch {
            zone: Arc::clone(&zone),
            tier,
            fee: None,
        })
    })
}

/// Every zone covering `point`, optionally limited to one kind
pub fn list_covering_zones(
    snapshot: &ZoneSnapshot,
    point: &GeoPoint,
    kind: Option<ZoneKind>,
) -> Vec<Arc<Zone>> {
    covering_zones(point, snapshot.zones(), kind)
}

/// Signed distance in meters from `point` to the edge of zone `zone_id`
/// (positive inside). Unknown ids give `None`.
pub fn distance_to_edge(snapshot: &ZoneSnapshot, zone_id: &str, point: &GeoPoint) -> Option<f64> {
    snapshot
        .get(zone_id)
        .ok()
        .map(|zone| zone.distance_to_edge(point))
}

/// The resolution API bound to a zone store
pub struct ResolutionService {
    store: Arc<ZoneStore>,
    fees: Option<FeeSchedule>,
}

impl ResolutionService {
    pub fn new(store: Arc<ZoneStore>) -> Self {
        Self { store, fees: None }
    }

    /// Attach a fee schedule used to price courier matches
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = Some(fees);
        self
    }

    pub fn store(&self) -> &ZoneStore {
        &self.store
    }

    pub fn snapshot(&self) -> Result<Arc<ZoneSnapshot>> {
        self.store.snapshot()
    }

    pub fn is_serviceable(&self, store_id: &str, point: &GeoPoint) -> Result<bool> {
        let snapshot = self.snapshot()?;
        Ok(is_serviceable(&snapshot, store_id, point))
    }

    pub fn check_serviceability(&self, store_id: &str, point: &GeoPoint) -> Result<ResolutionResult> {
        let snapshot = self.snapshot()?;
        Ok(check_serviceability(&snapshot, store_id, point))
    }

    pub fn find_courier_zone(
        &self,
        point: &GeoPoint,
        package_count: u32,
    ) -> Result<Option<CourierZoneMatch>> {
        let snapshot = self.snapshot()?;
        let found = find_courier_zone(&snapshot, point, package_count);
        Ok(found.map(|mut m| {
            m.fee = self.fees.as_ref().and_then(|f| f.quote(&m.tier));
            m
        }))
    }

    pub fn list_covering_zones(
        &self,
        point: &GeoPoint,
        kind: Option<ZoneKind>,
    ) -> Result<Vec<Arc<Zone>>> {
        let snapshot = self.snapshot()?;
        Ok(list_covering_zones(&snapshot, point, kind))
    }

    pub fn distance_to_edge(&self, zone_id: &str, point: &GeoPoint) -> Result<Option<f64>> {
        let snapshot = self.snapshot()?;
        Ok(distance_to_edge(&snapshot, zone_id, point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RawPoint, Shape};
    use crate::models::{CircleRecord, CourierRadii, ZoneRecord};
    use crate::store::{MemorySource, ZoneSource};
    use std::time::Duration;

    fn pt(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn circle(id: &str, owner: &str, kind: ZoneKind, center: GeoPoint, radius: f64) -> Zone {
        let shape = Shape::circle(center, radius).unwrap();
        Zone::new(id, owner, kind, vec![shape]).unwrap()
    }

    fn istanbul() -> GeoPoint {
        pt(41.0082, 28.9784)
    }

    #[test]
    fn test_store_circle_scenario() {
        let snapshot = ZoneSnapshot::from_zones(vec![circle(
            "sa",
            "store-1",
            ZoneKind::ServiceArea,
            istanbul(),
            5000.0,
        )]);

        assert!(is_serviceable(&snapshot, "store-1", &pt(41.02, 28.98)));
        assert!(!is_serviceable(&snapshot, "store-1", &pt(41.20, 28.98)));
    }

    #[test]
    fn test_serviceability_is_owner_scoped() {
        let snapshot = ZoneSnapshot::from_zones(vec![circle(
            "sa",
            "store-1",
            ZoneKind::ServiceArea,
            istanbul(),
            5000.0,
        )]);
        assert!(!is_serviceable(&snapshot, "store-2", &istanbul()));
    }

    #[test]
    fn test_block_area_beats_service_area() {
        let p = istanbul();
        let snapshot = ZoneSnapshot::from_zones(vec![
            circle("sa", "store-1", ZoneKind::ServiceArea, p, 5000.0),
            // Block areas are global, whoever owns them
            circle("block", "platform", ZoneKind::CustomerBlockArea, p, 300.0),
        ]);

        assert!(!is_serviceable(&snapshot, "store-1", &p));
        let result = check_serviceability(&snapshot, "store-1", &p);
        assert_eq!(result.blocked_by[0].id, "block");
        assert_eq!(result.matches[0].id, "sa");
    }

    #[test]
    fn test_empty_snapshot_not_serviceable() {
        let snapshot = ZoneSnapshot::from_zones(vec![]);
        assert!(!is_serviceable(&snapshot, "store-1", &istanbul()));
        assert!(find_courier_zone(&snapshot, &istanbul(), 1).is_none());
        assert!(list_covering_zones(&snapshot, &istanbul(), None).is_empty());
    }

    #[test]
    fn test_find_courier_zone_by_package_count() {
        let center = istanbul();
        let radii = CourierRadii::new(center, 1000.0, 3000.0).unwrap();
        let snapshot =
            ZoneSnapshot::from_zones(vec![Zone::courier("cz", "platform", radii).unwrap()]);
        let point = pt(center.lat() + 2000.0 / 111_194.93, center.lng());

        assert!(find_courier_zone(&snapshot, &point, 1).is_none());
        let found = find_courier_zone(&snapshot, &point, 2).unwrap();
        assert_eq!(found.zone.id, "cz");
        assert!(found.tier.eligible);
    }

    #[test]
    fn test_find_courier_zone_skips_ineligible_winner() {
        let center = istanbul();
        let point = pt(center.lat() + 2000.0 / 111_194.93, center.lng());

        // Smaller envelope wins precedence but its single radius misses the point
        let tight = CourierRadii::new(center, 1000.0, 2500.0).unwrap();
        let wide = CourierRadii::new(center, 4000.0, 6000.0).unwrap();
        let snapshot = ZoneSnapshot::from_zones(vec![
            Zone::courier("wide", "platform", wide).unwrap(),
            Zone::courier("tight", "platform", tight).unwrap(),
        ]);

        assert_eq!(find_courier_zone(&snapshot, &point, 1).unwrap().zone.id, "wide");
        assert_eq!(find_courier_zone(&snapshot, &point, 2).unwrap().zone.id, "tight");
    }

    #[test]
    fn test_find_courier_zone_blocked() {
        let center = istanbul();
        let radii = CourierRadii::new(center, 1000.0, 3000.0).unwrap();
        let snapshot = ZoneSnapshot::from_zones(vec![
            Zone::courier("cz", "platform", radii).unwrap(),
            circle("block", "platform", ZoneKind::CustomerBlockArea, center, 100.0),
        ]);
        assert!(find_courier_zone(&snapshot, &center, 1).is_none());
    }

    #[test]
    fn test_list_covering_zones_returns_all() {
        let p = istanbul();
        let snapshot = ZoneSnapshot::from_zones(vec![
            circle("a", "store-1", ZoneKind::ServiceArea, p, 5000.0),
            circle("b", "store-2", ZoneKind::ServiceArea, p, 1000.0),
            circle("block", "platform", ZoneKind::CustomerBlockArea, p, 100.0),
        ]);

        let ids: Vec<String> = list_covering_zones(&snapshot, &p, None)
            .iter()
            .map(|z| z.id.clone())
            .collect();
        assert_eq!(ids, vec!["b", "a", "block"]);

        let service = list_covering_zones(&snapshot, &p, Some(ZoneKind::ServiceArea));
        assert_eq!(service.len(), 2);
    }

    #[test]
    fn test_distance_to_edge_unknown_zone() {
        let snapshot = ZoneSnapshot::from_zones(vec![circle(
            "sa",
            "store-1",
            ZoneKind::ServiceArea,
            istanbul(),
            5000.0,
        )]);

        assert!(distance_to_edge(&snapshot, "missing", &istanbul()).is_none());
        let d = distance_to_edge(&snapshot, "sa", &istanbul()).unwrap();
        assert!((d - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_service_reads_through_store() {
        let source = Arc::new(MemorySource::new(vec![ZoneRecord {
            id: "sa".into(),
            owner_ref: "store-1".into(),
            kind: Some(ZoneKind::ServiceArea),
            circles: vec![CircleRecord {
                center: Some(RawPoint {
                    lat: 41.0082,
                    lng: 28.9784,
                }),
                radius: Some(5000.0),
            }],
            ..Default::default()
        }]));
        let store = Arc::new(ZoneStore::new(Arc::clone(&source), Duration::ZERO));
        let service = ResolutionService::new(store);

        assert!(service.is_serviceable("store-1", &pt(41.02, 28.98)).unwrap());

        // Soft delete in the source; the next snapshot no longer sees the zone
        let mut deleted = source.fetch(None, None).unwrap();
        deleted[0].deleted = true;
        source.replace(deleted);

        assert!(!service.is_serviceable("store-1", &pt(41.02, 28.98)).unwrap());
        assert_eq!(service.distance_to_edge("sa", &istanbul()).unwrap(), None);
    }

    #[test]
    fn test_service_matches_snapshot_functions() {
        let source = MemorySource::new(vec![
            ZoneRecord {
                id: "sa".into(),
                owner_ref: "store-1".into(),
                kind: Some(ZoneKind::ServiceArea),
                circles: vec![CircleRecord {
                    center: Some(RawPoint {
                        lat: 41.0082,
                        lng: 28.9784,
                    }),
                    radius: Some(5000.0),
                }],
                ..Default::default()
            },
            ZoneRecord {
                id: "cz".into(),
                owner_ref: "platform".into(),
                kind: Some(ZoneKind::CourierZone),
                center: Some(RawPoint {
                    lat: 41.0082,
                    lng: 28.9784,
                }),
                single_package_radius: Some(1000.0),
                multi_package_radius: Some(3000.0),
                ..Default::default()
            },
        ]);
        let store = Arc::new(ZoneStore::new(source, Duration::from_secs(60)));
        let service = ResolutionService::new(Arc::clone(&store));
        let snapshot = store.snapshot().unwrap();
        let point = pt(41.01, 28.98);

        let result = service.check_serviceability("store-1", &point).unwrap();
        assert!(result.servable);
        assert_eq!(result.winner_id(), Some("sa"));
        assert_eq!(
            service.is_serviceable("store-1", &point).unwrap(),
            is_serviceable(&snapshot, "store-1", &point)
        );

        let covering = service.list_covering_zones(&point, None).unwrap();
        let ids: Vec<&str> = covering.iter().map(|z| z.id.as_str()).collect();
        assert_eq!(ids, vec!["sa", "cz"]);

        let found = service.find_courier_zone(&point, 1).unwrap().unwrap();
        assert_eq!(found.zone.id, "cz");
        assert!(found.tier.eligible);
        assert_eq!(found.fee, None);

        assert_eq!(
            service.distance_to_edge("sa", &point).unwrap(),
            distance_to_edge(&snapshot, "sa", &point)
        );
    }

    #[test]
    fn test_service_prices_courier_match() {
        let center = istanbul();
        let source = MemorySource::new(vec![ZoneRecord {
            id: "cz".into(),
            owner_ref: "platform".into(),
            kind: Some(ZoneKind::CourierZone),
            center: Some(RawPoint {
                lat: center.lat(),
                lng: center.lng(),
            }),
            single_package_radius: Some(1000.0),
            multi_package_radius: Some(3000.0),
            ..Default::default()
        }]);
        let store = Arc::new(ZoneStore::new(source, Duration::from_secs(60)));
        let service = ResolutionService::new(store).with_fees(FeeSchedule {
            base_fee: 15.0,
            per_km: 5.0,
            included_meters: 0.0,
        });

        let found = service.find_courier_zone(&center, 1).unwrap().unwrap();
        assert_eq!(found.fee, Some(15.0));
    }
}
