//! Error taxonomy and load-time diagnostics.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while building or looking up zones.
///
/// Resolution itself never returns these: a point that matches nothing is
/// an ordinary [`crate::resolver::ResolutionResult`], not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    /// Malformed ring, circle or coordinate
    #[error("invalid shape: {reason}")]
    ShapeInvalid { reason: String },

    /// Zone id absent from the snapshot (never existed, or soft-deleted)
    #[error("zone not found: {id}")]
    ZoneNotFound { id: String },

    /// Record is missing fields required for its kind
    #[error("invalid zone record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
}

impl ZoneError {
    pub fn shape(reason: impl Into<String>) -> Self {
        ZoneError::ShapeInvalid {
            reason: reason.into(),
        }
    }

    pub fn record(id: &str, reason: impl Into<String>) -> Self {
        ZoneError::InvalidRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Record was excluded from the snapshot
    Rejected,
    /// Record was kept, but its configuration is questionable
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ShapeInvalid,
    InvalidRecord,
    AmbiguousConfiguration,
}

/// A problem found while loading zone records.
///
/// Diagnostics are attached to the snapshot so admin tooling can show why a
/// zone is not taking part in resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub zone_id: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic for a record that failed conversion
    pub fn rejected(zone_id: &str, err: &ZoneError) -> Self {
        let kind = match err {
            ZoneError::ShapeInvalid { .. } => DiagnosticKind::ShapeInvalid,
            _ => DiagnosticKind::InvalidRecord,
        };
        Self {
            zone_id: zone_id.to_string(),
            severity: Severity::Rejected,
            kind,
            message: err.to_string(),
        }
    }

    pub fn ambiguous(zone_id: &str, message: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.to_string(),
            severity: Severity::Warning,
            kind: DiagnosticKind::AmbiguousConfiguration,
            message: message.into(),
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.severity == Severity::Rejected
    }
}
