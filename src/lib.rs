//! Zonal - geospatial zone resolution for delivery platforms
//!
//! Decides which service areas, courier zones and block areas cover a
//! coordinate, whether it is servable, and which courier radius tier applies.
//! Shared by the `serve` and `validate` binaries.

pub mod api;
pub mod config;
pub mod error;
pub mod geometry;
pub mod models;
pub mod resolver;
pub mod store;
pub mod tiering;

pub use api::{CourierZoneMatch, ResolutionService};
pub use error::{Diagnostic, ZoneError};
pub use geometry::{GeoPoint, Shape};
pub use models::{Zone, ZoneKind, ZoneRecord};
pub use resolver::{resolve, ResolutionResult};
