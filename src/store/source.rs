//! Where zone records come from.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::models::{ZoneKind, ZoneRecord};

/// Read side of the external zone persistence layer.
///
/// Implementations may ignore the filters and return everything; the store
/// filters again after validation.
pub trait ZoneSource: Send + Sync {
    fn fetch(&self, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> Result<Vec<ZoneRecord>>;
}

fn matches_filter(record: &ZoneRecord, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> bool {
    owner_ref.map_or(true, |o| record.owner_ref == o) && kind.map_or(true, |k| record.kind == Some(k))
}

/// In-process record list, replaceable at runtime
#[derive(Default)]
pub struct MemorySource {
    records: RwLock<Vec<ZoneRecord>>,
}

impl MemorySource {
    pub fn new(records: Vec<ZoneRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Replace the stored records (visible on the next snapshot refresh)
    pub fn replace(&self, records: Vec<ZoneRecord>) {
        let mut guard = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = records;
    }
}

impl ZoneSource for MemorySource {
    fn fetch(&self, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> Result<Vec<ZoneRecord>> {
        let guard = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard
            .iter()
            .filter(|r| matches_filter(r, owner_ref, kind))
            .cloned()
            .collect())
    }
}

/// JSON array of zone records exported from the document store
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ZoneSource for JsonFileSource {
    fn fetch(&self, owner_ref: Option<&str>, kind: Option<ZoneKind>) -> Result<Vec<ZoneRecord>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read zone file {}", self.path.display()))?;
        let records: Vec<ZoneRecord> =
            serde_json::from_str(&content).context("Failed to parse zone file")?;

        debug!(
            "Read {} zone records from {}",
            records.len(),
            self.path.display()
        );

        Ok(records
            .into_iter()
            .filter(|r| matches_filter(r, owner_ref, kind))
            .collect())
    }
}
