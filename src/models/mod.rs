//! Zone data model.

pub mod record;
pub mod zone;

pub use record::{CircleRecord, ZoneRecord};
pub use zone::{CourierRadii, Zone, ZoneKind, ZoneStatus};
