//! Immutable, validated view of all zones at one point in time.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Diagnostic, ZoneError};
use crate::models::{Zone, ZoneKind, ZoneRecord};

/// Validated zone set plus the diagnostics produced while building it
#[derive(Debug)]
pub struct ZoneSnapshot {
    zones: Vec<Arc<Zone>>,
    by_id: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
    loaded_at: DateTime<Utc>,
}

impl ZoneSnapshot {
    /// Validate raw records into a snapshot.
    ///
    /// Drafts and soft-deleted records are skipped. Records that fail
    /// validation are excluded and reported as diagnostics; they never fail
    /// the whole load.
    pub fn build(records: Vec<ZoneRecord>) -> Self {
        let total = records.len();
        let (live, skipped): (Vec<ZoneRecord>, Vec<ZoneRecord>) = records
            .into_iter()
            .partition(|r| !r.is_draft() && !r.deleted);

        if !skipped.is_empty() {
            debug!(
                "Skipping {} draft or deleted zone records",
                skipped.len()
            );
        }

        let converted: Vec<(String, Result<Zone, ZoneError>)> = live
            .into_par_iter()
            .map(|r| (r.id.clone(), Zone::try_from(r)))
            .collect();

        let mut zones = Vec::with_capacity(converted.len());
        let mut diagnostics = Vec::new();

        for (id, result) in converted {
            match result {
                Ok(zone) => zones.push(zone),
                Err(e) => {
                    warn!("Rejected zone {}: {}", id, e);
                    diagnostics.push(Diagnostic::rejected(&id, &e));
                }
            }
        }

        let snapshot = Self::assemble(zones, diagnostics);
        info!(
            "Loaded zone snapshot: {} of {} records usable, {} diagnostics",
            snapshot.len(),
            total,
            snapshot.diagnostics.len()
        );
        snapshot
    }

    /// Snapshot over already-validated zones
    pub fn from_zones(zones: Vec<Zone>) -> Self {
        Self::assemble(zones, Vec::new())
    }

    fn assemble(zones: Vec<Zone>, mut diagnostics: Vec<Diagnostic>) -> Self {
        let mut kept: Vec<Arc<Zone>> = Vec::with_capacity(zones.len());
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(zones.len());

        // Duplicate ids: the higher version wins, later records win ties
        for zone in zones {
            let existing = by_id.get(&zone.id).copied();
            match existing {
                Some(idx) => {
                    diagnostics.push(Diagnostic::ambiguous(
                        &zone.id,
                        format!(
                            "duplicate zone id (versions {} and {})",
                            kept[idx].version, zone.version
                        ),
                    ));
                    if zone.version >= kept[idx].version {
                        kept[idx] = Arc::new(zone);
                    }
                }
                None => {
                    by_id.insert(zone.id.clone(), kept.len());
                    kept.push(Arc::new(zone));
                }
            }
        }

        diagnostics.extend(configuration_warnings(&kept));
        for diag in diagnostics.iter().filter(|d| !d.is_rejection()) {
            warn!("Zone {}: {}", diag.zone_id, diag.message);
        }

        Self {
            zones: kept,
            by_id,
            diagnostics,
            loaded_at: Utc::now(),
        }
    }

    pub fn zones(&self) -> &[Arc<Zone>] {
        &self.zones
    }

    /// Look up a zone by id
    pub fn get(&self, id: &str) -> Result<&Arc<Zone>, ZoneError> {
        self.by_id
            .get(id)
            .map(|&idx| &self.zones[idx])
            .ok_or_else(|| ZoneError::ZoneNotFound { id: id.to_string() })
    }

    /// Zones matching the optional owner and kind filters
    pub fn filtered(&self, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> Vec<Arc<Zone>> {
        self.zones
            .iter()
            .filter(|z| owner_ref.map_or(true, |o| z.owner_ref == o))
            .filter(|z| kind.map_or(true, |k| z.kind == k))
            .cloned()
            .collect()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Non-fatal configuration problems worth surfacing to operators
fn configuration_warnings(zones: &[Arc<Zone>]) -> Vec<Diagnostic> {
    let mut warnings = Vec::new();

    for zone in zones {
        if let Some(radii) = &zone.courier {
            if radii.is_inverted() {
                warnings.push(Diagnostic::ambiguous(
                    &zone.id,
                    format!(
                        "multiPackageRadius {} is smaller than singlePackageRadius {}",
                        radii.multi_package_radius, radii.single_package_radius
                    ),
                ));
            }
        }
    }

    // Stores mixing circle and polygon service areas: (has circle, has polygon, first zone)
    let mut per_store: HashMap<&str, (bool, bool, &str)> = HashMap::new();
    for zone in zones.iter().filter(|z| z.kind == ZoneKind::ServiceArea) {
        let entry = per_store
            .entry(zone.owner_ref.as_str())
            .or_insert((false, false, zone.id.as_str()));
        entry.0 |= zone.shapes.iter().any(|s| s.is_circle());
        entry.1 |= zone.shapes.iter().any(|s| !s.is_circle());
    }

    let mut mixed: Vec<(&str, &str)> = per_store
        .into_iter()
        .filter(|(_, (circle, polygon, _))| *circle && *polygon)
        .map(|(owner, (_, _, first))| (owner, first))
        .collect();
    mixed.sort_unstable();

    for (owner, first) in mixed {
        warnings.push(Diagnostic::ambiguous(
            first,
            format!(
                "store {} has both circle and polygon service areas",
                owner
            ),
        ));
    }

    warnings
}
