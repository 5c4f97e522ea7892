//! Deterministic synthetic-data engine for the fleet dashboard.
//!
//! Every fact shown about an event or a vehicle is a pure function of its
//! identifier string (plus an explicitly passed reference time). Independent
//! callers that ask about the same id always get identical answers without
//! sharing any state.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub mod callsign;
pub mod catalog;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod route;
pub mod seed;
pub mod serde_date;
pub mod status;

pub use callsign::{format_callsign, VehicleIdentity};
pub use catalog::{Catalog, Catalogs, EventTemplate, Location, LocationKind};
pub use event::{GeneratedEvent, Severity};
pub use id::{parse_event_id, parse_vehicle_id, EventKey, VehicleKey};
pub use lifecycle::{EventLifecycle, LifecyclePoint, RouteAlignment};
pub use route::VehicleProfile;
pub use seed::{derive_seed, range_inclusive, scalar, Seed};
pub use status::{resolve_status, OperationalStatus};

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum SynthError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("query error: {0}")]
    Query(String),
}

/// A `[lat, lng]` pair in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint(pub f64, pub f64);

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self(lat, lng)
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.0
    }

    #[must_use]
    pub const fn lng(self) -> f64 {
        self.1
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.6}, {:.6}]", self.0, self.1)
    }
}

/// Anchor coordinate for everything synthesized off-route.
pub const BASE_COORDINATE: GeoPoint = GeoPoint(19.4326, -99.1332);

/// The engine: immutable catalogs plus the pure generators that read them.
///
/// Cloning is cheap enough for per-request use, but callers usually share one
/// instance behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSynth {
    catalogs: Catalogs,
}

impl FleetSynth {
    #[must_use]
    pub fn new(catalogs: Catalogs) -> Self {
        Self { catalogs }
    }

    #[must_use]
    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    /// Load catalogs from a JSON document and build an engine around them.
    ///
    /// # Errors
    /// Returns [`SynthError::Validation`] when the document is not valid JSON
    /// or any catalog list is empty.
    pub fn from_catalog_json(json: &str) -> Result<Self, SynthError> {
        let catalogs = serde_json::from_str::<Catalogs>(json)
            .map_err(|err| SynthError::Validation(format!("invalid catalogs document: {err}")))?;
        Ok(Self::new(catalogs))
    }
}
