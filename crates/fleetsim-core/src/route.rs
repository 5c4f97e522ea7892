//! Geographic helpers and per-vehicle route synthesis.

use serde::{Deserialize, Serialize};

use crate::callsign::VehicleIdentity;
use crate::seed::{offset, Seed};
use crate::{GeoPoint, BASE_COORDINATE};

const KM_PER_DEGREE_LAT: f64 = 111.32;
const ANCHOR_SPREAD_DEG: f64 = 0.08;
const HEADING_DRIFT_DEG: f64 = 60.0;
const MIN_STEP_KM: f64 = 0.06;
const STEP_SPAN_KM: f64 = 0.12;

pub const DEFAULT_ROUTE_POINTS: usize = 120;
pub const MAX_ROUTE_POINTS: usize = 2_000;

/// Destination `distance_km` away from `origin` along `bearing_deg`
/// (0 = north, clockwise). Equirectangular approximation; fine at city scale.
#[must_use]
pub fn offset_by_km(origin: GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
    let bearing = bearing_deg.to_radians();
    let dlat = distance_km * bearing.cos() / KM_PER_DEGREE_LAT;
    let dlng = distance_km * bearing.sin() / (KM_PER_DEGREE_LAT * origin.lat().to_radians().cos());
    GeoPoint::new(origin.lat() + dlat, origin.lng() + dlng)
}

/// `origin` moved by up to `spread_deg / 2` on each axis.
#[must_use]
pub fn jitter(origin: GeoPoint, seed: Seed, lat_offset: u64, lng_offset: u64, spread_deg: f64) -> GeoPoint {
    GeoPoint::new(
        origin.lat() + (seed.draw(lat_offset) - 0.5) * spread_deg,
        origin.lng() + (seed.draw(lng_offset) - 0.5) * spread_deg,
    )
}

/// Haversine distance in kilometres.
#[must_use]
pub fn distance_km(from: GeoPoint, to: GeoPoint) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6_371.0;
    let dlat = (to.lat() - from.lat()).to_radians();
    let dlng = (to.lng() - from.lng()).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + from.lat().to_radians().cos() * to.lat().to_radians().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Bounded random walk seeded by the vehicle id: an anchor near the base
/// coordinate, then steps of 60-180 m with a drifting heading.
#[must_use]
pub fn synthesize_route(seed: Seed, points: usize) -> Vec<GeoPoint> {
    let points = points.min(MAX_ROUTE_POINTS);
    let mut route = Vec::with_capacity(points);
    let mut position = jitter(
        BASE_COORDINATE,
        seed,
        offset::ROUTE_ANCHOR_LAT,
        offset::ROUTE_ANCHOR_LNG,
        ANCHOR_SPREAD_DEG,
    );
    let mut heading = seed.draw(offset::ROUTE_HEADING) * 360.0;

    for step in 0..points as u64 {
        route.push(position);
        let turn_offset = offset::ROUTE_STEP + 2 * step;
        heading = (heading + (seed.draw(turn_offset) - 0.5) * HEADING_DRIFT_DEG).rem_euclid(360.0);
        let length = MIN_STEP_KM + seed.draw(turn_offset + 1) * STEP_SPAN_KM;
        position = offset_by_km(position, length, heading);
    }

    route
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleProfile {
    pub vehicle_id: String,
    pub identity: VehicleIdentity,
    pub route: Vec<GeoPoint>,
}

impl VehicleProfile {
    /// Identity and route for `unidad-<n>`. The route is seeded by the id
    /// string itself, so malformed ids still get a route of their own.
    #[must_use]
    pub fn synthesize(vehicle_id: &str, points: usize) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            identity: VehicleIdentity::from_id(vehicle_id),
            route: synthesize_route(Seed::of(vehicle_id), points),
        }
    }
}
