//! Zone resolution: which zones cover a point, and which one wins.

use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::geometry::GeoPoint;
use crate::models::{Zone, ZoneKind};

/// Outcome of resolving one point against a zone set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// A zone of the requested kind covers the point and no block area does
    pub servable: bool,
    /// Highest-precedence match; `None` when nothing matched or the point is
    /// blocked
    pub winner: Option<Arc<Zone>>,
    /// Every match of the requested kind, highest precedence first
    pub matches: Vec<Arc<Zone>>,
    /// Block areas containing the point
    pub blocked_by: Vec<Arc<Zone>>,
}

impl ResolutionResult {
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.winner.as_deref().map(|z| z.id.as_str())
    }
}

/// Resolve `point` against `zones` for the requested `kind`.
///
/// Only saved, active, non-deleted zones take part. Block areas are always
/// evaluated and take absolute precedence: a blocked point is never
/// servable and has no winner, although `matches` still lists what covered
/// it. Pure over its inputs; the same point and zone set always yield the
/// same winner.
pub fn resolve(point: &GeoPoint, zones: &[Arc<Zone>], kind: ZoneKind) -> ResolutionResult {
    let blocked_by = order_by_precedence(covering(point, zones, ZoneKind::CustomerBlockArea));

    if kind == ZoneKind::CustomerBlockArea {
        debug!(
            "Resolve {} for block areas: {} matches",
            point,
            blocked_by.len()
        );
        return ResolutionResult {
            servable: blocked_by.is_empty(),
            winner: blocked_by.first().cloned(),
            matches: blocked_by.clone(),
            blocked_by,
        };
    }

    let matches = order_by_precedence(covering(point, zones, kind));
    let winner = if blocked_by.is_empty() {
        matches.first().cloned()
    } else {
        None
    };

    debug!(
        "Resolve {} for {}: {} matches, {} blocking, winner {:?}",
        point,
        kind,
        matches.len(),
        blocked_by.len(),
        winner.as_deref().map(|z| z.id.as_str())
    );

    ResolutionResult {
        servable: winner.is_some(),
        winner,
        matches,
        blocked_by,
    }
}

/// Every resolvable zone covering `point`, without collapsing to a winner.
///
/// With `kind == None` all kinds are returned, grouped by kind and ordered
/// by precedence within each kind.
pub fn covering_zones(
    point: &GeoPoint,
    zones: &[Arc<Zone>],
    kind: Option<ZoneKind>,
) -> Vec<Arc<Zone>> {
    let kinds: &[ZoneKind] = match &kind {
        Some(k) => std::slice::from_ref(k),
        None => ZoneKind::all(),
    };

    kinds
        .iter()
        .flat_map(|k| order_by_precedence(covering(point, zones, *k)))
        .collect()
}

fn covering(point: &GeoPoint, zones: &[Arc<Zone>], kind: ZoneKind) -> Vec<Arc<Zone>> {
    zones
        .iter()
        .filter(|z| z.kind == kind && z.is_resolvable())
        .filter(|z| z.contains(point))
        .cloned()
        .collect()
}

/// Sort zones so the most specific comes first.
///
/// Order: explicit priority (higher first, prioritized zones before
/// unprioritized ones), then smaller area, then earlier creation (unknown
/// creation time last), then id.
pub fn order_by_precedence(zones: Vec<Arc<Zone>>) -> Vec<Arc<Zone>> {
    let mut ranked: Vec<(f64, Arc<Zone>)> = zones.into_iter().map(|z| (z.area(), z)).collect();
    ranked.sort_by(|(area_a, a), (area_b, b)| compare_precedence(a, *area_a, b, *area_b));
    ranked.into_iter().map(|(_, z)| z).collect()
}

fn compare_precedence(a: &Zone, area_a: f64, b: &Zone, area_b: f64) -> Ordering {
    let by_priority = match (a.priority, b.priority) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    let by_created = match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_priority
        .then_with(|| area_a.total_cmp(&area_b))
        .then(by_created)
        .then_with(|| a.id.cmp(&b.id))
}
