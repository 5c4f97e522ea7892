use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use fleetsim_core::route::{DEFAULT_ROUTE_POINTS, MAX_ROUTE_POINTS};
use fleetsim_core::{
    parse_event_id, resolve_status, serde_date, EventLifecycle, FleetSynth, GeneratedEvent, GeoPoint,
    OperationalStatus, Severity, VehicleIdentity, VehicleProfile,
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

pub const API_CONTRACT_VERSION: &str = "api.v1";
pub const MAX_LIST_COUNT: u32 = 1_000;
/// Reference days must leave this much room before the last representable
/// date for the longest lifecycle to fit.
pub const REFERENCE_DAY_MARGIN_DAYS: i64 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventCard {
    pub event: GeneratedEvent,
    pub status: OperationalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusView {
    pub event_id: String,
    pub status: OperationalStatus,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRequest {
    pub event_id: String,
    #[serde(default, with = "serde_date::option")]
    pub reference_date: Option<Date>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub route: Option<Vec<GeoPoint>>,
    #[serde(default)]
    pub route_points: Option<usize>,
}

impl DetailRequest {
    #[must_use]
    pub fn for_event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            reference_date: None,
            vehicle_id: None,
            route: None,
            route_points: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDetail {
    pub event: GeneratedEvent,
    pub status: OperationalStatus,
    pub vehicle: Option<VehicleIdentity>,
    pub lifecycle: EventLifecycle,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapMarker {
    pub event_id: String,
    pub status: OperationalStatus,
    pub severity: Severity,
    pub start: GeoPoint,
    pub end: GeoPoint,
    pub starts_on_route: bool,
    pub ends_on_route: bool,
    pub draw_connector: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleRequest {
    pub vehicle_id: String,
    #[serde(default)]
    pub route_points: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListEventsRequest {
    #[serde(with = "serde_date")]
    pub date: Date,
    pub count: u32,
    #[serde(default)]
    pub status: Option<OperationalStatus>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl ListEventsRequest {
    fn matches(&self, card: &EventCard) -> bool {
        if let Some(status) = self.status {
            if card.status != status {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if card.event.severity != severity {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventList {
    #[serde(with = "serde_date")]
    pub date: Date,
    pub generated: u32,
    pub matched: usize,
    pub events: Vec<EventCard>,
}

/// Render-time timing of one event. `as_of` is the caller's clock; nothing in
/// the composed lifecycle depends on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTimeline {
    pub event_id: String,
    pub status: OperationalStatus,
    pub is_open: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub planned_end_at: OffsetDateTime,
    pub planned_duration_minutes: i64,
    pub elapsed_minutes: i64,
    pub remaining_minutes: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub as_of: OffsetDateTime,
}

/// Views the dashboard surfaces read. Every view goes back to the engine on
/// each call; nothing is cached between calls.
#[derive(Debug, Clone, Default)]
pub struct FleetSimApi {
    synth: Arc<FleetSynth>,
}

impl FleetSimApi {
    #[must_use]
    pub fn new(synth: FleetSynth) -> Self {
        Self { synth: Arc::new(synth) }
    }

    /// Build the API around catalogs read from a JSON file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read or the catalogs are invalid.
    pub fn from_catalog_file(path: &Path) -> Result<Self> {
        let body = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalogs file {}", path.display()))?;
        let synth = FleetSynth::from_catalog_json(&body)
            .with_context(|| format!("failed to load catalogs from {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded catalogs");
        Ok(Self::new(synth))
    }

    /// Built-in catalogs unless `path` is given.
    ///
    /// # Errors
    /// Returns an error when `path` is given and cannot be loaded.
    pub fn from_optional_catalog_file(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_catalog_file)
    }

    #[must_use]
    pub fn synth(&self) -> &FleetSynth {
        &self.synth
    }

    #[must_use]
    pub fn event_card(&self, event_id: &str, reference_date: Date) -> EventCard {
        EventCard {
            event: self.synth.generate_event(event_id, reference_date),
            status: resolve_status(event_id),
        }
    }

    #[must_use]
    pub fn event_status(&self, event_id: &str) -> StatusView {
        let status = resolve_status(event_id);
        StatusView { event_id: event_id.to_string(), status, is_open: status.is_open() }
    }

    #[must_use]
    pub fn callsign(&self, numeric_index: u32) -> VehicleIdentity {
        VehicleIdentity::from_index(numeric_index)
    }

    /// Raw composer output for `request`, anchored at `reference_start`
    /// (moved onto `request.reference_date` when given) instead of the
    /// event's creation time.
    ///
    /// # Errors
    /// Same route conditions as [`Self::event_detail`], plus a reference day
    /// too close to the last representable date.
    pub fn lifecycle(
        &self,
        request: &DetailRequest,
        reference_start: OffsetDateTime,
    ) -> Result<EventLifecycle> {
        ensure_reference_day(request.reference_date.unwrap_or_else(|| reference_start.date()))?;
        let (_, route) = resolve_route(request)?;
        Ok(self.synth.compose_lifecycle(
            &request.event_id,
            &route,
            reference_start,
            request.reference_date,
        ))
    }

    /// Event attributes, status and lifecycle in one view. The lifecycle is
    /// anchored at the event's creation time and aligned to the requested
    /// vehicle's route or to an explicit route.
    ///
    /// # Errors
    /// Returns an error when both a vehicle and a route are given, or when the
    /// requested route length exceeds the supported maximum.
    pub fn event_detail(&self, request: &DetailRequest, now: OffsetDateTime) -> Result<EventDetail> {
        let reference_date = request.reference_date.unwrap_or_else(|| now.date());
        ensure_reference_day(parse_event_id(&request.event_id).date.unwrap_or(reference_date))?;
        let (vehicle, route) = resolve_route(request)?;
        let event = self.synth.generate_event(&request.event_id, reference_date);
        let lifecycle =
            self.synth.compose_lifecycle(&request.event_id, &route, event.created_at, None);
        tracing::debug!(
            event_id = %request.event_id,
            route_points = route.len(),
            "composed event detail"
        );

        Ok(EventDetail { status: resolve_status(&request.event_id), event, vehicle, lifecycle })
    }

    /// # Errors
    /// Same conditions as [`Self::event_detail`].
    pub fn map_marker(&self, request: &DetailRequest, now: OffsetDateTime) -> Result<MapMarker> {
        let detail = self.event_detail(request, now)?;
        let alignment = detail.lifecycle.route_alignment;
        Ok(MapMarker {
            event_id: detail.event.id,
            status: detail.status,
            severity: detail.event.severity,
            start: detail.lifecycle.start_location.position,
            end: detail.lifecycle.end_location.position,
            starts_on_route: alignment.starts_on_route,
            ends_on_route: alignment.ends_on_route,
            draw_connector: alignment.starts_on_route && alignment.ends_on_route,
        })
    }

    /// Elapsed and remaining minutes as of `now`. Open events count elapsed
    /// time from their start; closed events report their composed duration.
    ///
    /// # Errors
    /// Same conditions as [`Self::event_detail`].
    pub fn timeline(&self, request: &DetailRequest, now: OffsetDateTime) -> Result<EventTimeline> {
        let detail = self.event_detail(request, now)?;
        let started_at = detail.lifecycle.start_location.timestamp;
        let planned_end_at = detail.lifecycle.end_location.timestamp;
        let planned_duration_minutes = detail.lifecycle.duration().whole_minutes();
        let is_open = detail.status.is_open();

        let (elapsed_minutes, remaining_minutes) = if is_open {
            let elapsed = (now - started_at).whole_minutes().max(0);
            let remaining = (planned_end_at - now).whole_minutes().max(0);
            (elapsed, Some(remaining))
        } else {
            (planned_duration_minutes, None)
        };

        Ok(EventTimeline {
            event_id: detail.event.id,
            status: detail.status,
            is_open,
            started_at,
            planned_end_at,
            planned_duration_minutes,
            elapsed_minutes,
            remaining_minutes,
            as_of: now,
        })
    }

    /// # Errors
    /// Returns an error when the requested route length exceeds the maximum.
    pub fn vehicle(&self, request: &VehicleRequest) -> Result<VehicleProfile> {
        let points = route_points(request.route_points)?;
        Ok(VehicleProfile::synthesize(&request.vehicle_id, points))
    }

    /// Cards for `<date>-event-0 .. <date>-event-<count - 1>`, optionally
    /// narrowed by status and severity.
    ///
    /// # Errors
    /// Returns an error when `count` exceeds [`MAX_LIST_COUNT`].
    pub fn list_events(&self, request: &ListEventsRequest) -> Result<EventList> {
        if request.count > MAX_LIST_COUNT {
            return Err(anyhow!("count MUST be <= {MAX_LIST_COUNT}, got {}", request.count));
        }

        let events = (0..request.count)
            .map(|number| {
                self.event_card(&fleetsim_core::id::event_id(Some(request.date), number), request.date)
            })
            .filter(|card| request.matches(card))
            .collect::<Vec<_>>();

        Ok(EventList {
            date: request.date,
            generated: request.count,
            matched: events.len(),
            events,
        })
    }
}

fn route_points(requested: Option<usize>) -> Result<usize> {
    let points = requested.unwrap_or(DEFAULT_ROUTE_POINTS);
    if points > MAX_ROUTE_POINTS {
        return Err(anyhow!("route_points MUST be <= {MAX_ROUTE_POINTS}, got {points}"));
    }
    Ok(points)
}

fn ensure_reference_day(day: Date) -> Result<()> {
    if day.checked_add(Duration::days(REFERENCE_DAY_MARGIN_DAYS)).is_none() {
        return Err(anyhow!(
            "reference day {day} MUST be at least {REFERENCE_DAY_MARGIN_DAYS} days before {}",
            Date::MAX
        ));
    }
    Ok(())
}

fn resolve_route(request: &DetailRequest) -> Result<(Option<VehicleIdentity>, Vec<GeoPoint>)> {
    match (&request.vehicle_id, &request.route) {
        (Some(_), Some(_)) => Err(anyhow!("provide either vehicle_id or route, not both")),
        (Some(vehicle_id), None) => {
            let profile = VehicleProfile::synthesize(vehicle_id, route_points(request.route_points)?);
            Ok((Some(profile.identity), profile.route))
        }
        (None, Some(route)) => Ok((None, route.clone())),
        (None, None) => Ok((None, Vec::new())),
    }
}
