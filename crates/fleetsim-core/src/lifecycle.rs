//! Route-alignment composer: the start/end record of one event.
//!
//! Branch selection is driven by offset draws on the event seed, so the same
//! `(id, route, reference_start, reference_date)` always yields the same
//! record. Nothing here reads the wall clock; elapsed time is the caller's job.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::catalog::Location;
use crate::route::{jitter, offset_by_km};
use crate::seed::{offset, Seed};
use crate::{FleetSynth, GeoPoint, BASE_COORDINATE};

const MINUTES_PER_ROUTE_POINT: i64 = 2;
const START_WINDOW: f64 = 0.7;
const MULTI_DAY_SHARE: f64 = 0.2;
const ON_ROUTE_SHARE: f64 = 0.7;

const OFF_ROUTE_SPREAD_DEG: f64 = 0.04;
const NEAR_START_SPREAD_DEG: f64 = 0.008;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifecyclePoint {
    pub position: GeoPoint,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub name: Location,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct RouteAlignment {
    pub starts_on_route: bool,
    pub ends_on_route: bool,
    pub start_route_index: Option<usize>,
    pub end_route_index: Option<usize>,
}

impl RouteAlignment {
    const OFF_ROUTE: Self = Self {
        starts_on_route: false,
        ends_on_route: false,
        start_route_index: None,
        end_route_index: None,
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLifecycle {
    pub event_id: String,
    pub start_location: LifecyclePoint,
    pub end_location: LifecyclePoint,
    pub route_alignment: RouteAlignment,
}

impl EventLifecycle {
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_location.timestamp - self.start_location.timestamp
    }
}

/// Where the end point landed, before names and timestamps are attached.
struct Leg {
    start: GeoPoint,
    end: GeoPoint,
    start_offset: Duration,
    duration: Duration,
    alignment: RouteAlignment,
}

impl FleetSynth {
    /// Compose the lifecycle of `event_id`, optionally aligned to `route`.
    ///
    /// With an empty route both endpoints are synthesized around the base
    /// coordinate. Otherwise the start sits on one of the first 70% of route
    /// points and the end is either a multi-day excursion (~20%), a point
    /// further along the route (~70% of the rest) or a stop near the start.
    ///
    /// `reference_date`, when given, moves `reference_start` onto that day
    /// keeping its time of day and offset.
    #[must_use]
    pub fn compose_lifecycle(
        &self,
        event_id: &str,
        route: &[GeoPoint],
        reference_start: OffsetDateTime,
        reference_date: Option<Date>,
    ) -> EventLifecycle {
        let seed = Seed::of(event_id);
        let anchor = match reference_date {
            Some(date) => reference_start.replace_date(date),
            None => reference_start,
        };

        let leg = if route.is_empty() { off_route_leg(seed) } else { route_leg(seed, route) };
        let (start_at, end_at) = place(anchor, leg.start_offset, leg.duration);

        EventLifecycle {
            event_id: event_id.to_string(),
            start_location: LifecyclePoint {
                position: leg.start,
                timestamp: start_at,
                name: self.catalogs().resolve_location(seed, 0),
            },
            end_location: LifecyclePoint {
                position: leg.end,
                timestamp: end_at,
                name: self.catalogs().resolve_location(seed, offset::END_LOCATION),
            },
            route_alignment: leg.alignment,
        }
    }
}

/// Start and end timestamps for a leg. An anchor too close to the last
/// representable instant is pulled back by the whole span so the end still
/// lands strictly after the start.
fn place(anchor: OffsetDateTime, start_offset: Duration, duration: Duration) -> (OffsetDateTime, OffsetDateTime) {
    let span = start_offset + duration;
    let anchor = match anchor.checked_add(span) {
        Some(_) => anchor,
        None => anchor.checked_sub(span).unwrap_or(anchor),
    };
    let start = anchor.checked_add(start_offset).unwrap_or(anchor);
    let end = start.checked_add(duration).unwrap_or(start);
    (start, end)
}

fn minutes(seed: Seed, draw_offset: u64, lo: u32, hi: u32) -> Duration {
    Duration::minutes(i64::from(seed.range(draw_offset, lo, hi)))
}

fn off_route_leg(seed: Seed) -> Leg {
    Leg {
        start: jitter(BASE_COORDINATE, seed, offset::START_LAT, offset::START_LNG, OFF_ROUTE_SPREAD_DEG),
        end: jitter(BASE_COORDINATE, seed, offset::END_LAT, offset::END_LNG, OFF_ROUTE_SPREAD_DEG),
        start_offset: Duration::ZERO,
        duration: minutes(seed, offset::DURATION, 10, 360),
        alignment: RouteAlignment::OFF_ROUTE,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn route_leg(seed: Seed, route: &[GeoPoint]) -> Leg {
    let window = ((route.len() as f64 * START_WINDOW).floor() as usize).max(1);
    let start_index = seed.index(offset::START_INDEX, window);
    let start = route[start_index];
    let start_offset =
        Duration::minutes(i64::try_from(start_index).unwrap_or(i64::MAX) * MINUTES_PER_ROUTE_POINT);

    if seed.draw(offset::BRANCH) < MULTI_DAY_SHARE {
        let distance = 2.0 + seed.draw(offset::DISTANCE) * 6.0;
        let bearing = seed.draw(offset::BEARING) * 360.0;
        return Leg {
            start,
            end: offset_by_km(start, distance, bearing),
            start_offset,
            duration: Duration::hours(i64::from(seed.range(offset::DURATION, 8, 48))),
            alignment: RouteAlignment {
                starts_on_route: true,
                ends_on_route: false,
                start_route_index: Some(start_index),
                end_route_index: None,
            },
        };
    }

    if seed.draw(offset::ON_ROUTE) < ON_ROUTE_SHARE {
        let ahead = usize::try_from(seed.range(offset::POINTS_AHEAD, 10, 50)).unwrap_or(10);
        let end_index = (start_index + ahead).min(route.len() - 1);
        let covered = i64::try_from(end_index - start_index).unwrap_or(0);
        return Leg {
            start,
            end: route[end_index],
            start_offset,
            duration: Duration::minutes(covered * MINUTES_PER_ROUTE_POINT)
                + minutes(seed, offset::DURATION, 10, 120),
            alignment: RouteAlignment {
                starts_on_route: true,
                ends_on_route: true,
                start_route_index: Some(start_index),
                end_route_index: Some(end_index),
            },
        };
    }

    Leg {
        start,
        end: jitter(start, seed, offset::END_LAT, offset::END_LNG, NEAR_START_SPREAD_DEG),
        start_offset,
        duration: minutes(seed, offset::DURATION, 30, 240),
        alignment: RouteAlignment {
            starts_on_route: true,
            ends_on_route: false,
            start_route_index: Some(start_index),
            end_route_index: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use time::macros::{date, datetime};

    use super::*;
    use crate::route::{distance_km, synthesize_route};

    fn fixture_start() -> OffsetDateTime {
        datetime!(2024-06-01 08:00:00 UTC)
    }

    fn fixture_route(len: usize) -> Vec<GeoPoint> {
        synthesize_route(Seed::of("unidad-7"), len)
    }

    #[test]
    fn empty_route_stays_off_route() {
        let synth = FleetSynth::default();
        for n in 0..200 {
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{n}"), &[], fixture_start(), None);
            assert_eq!(lifecycle.route_alignment, RouteAlignment::OFF_ROUTE);
            assert_eq!(lifecycle.start_location.timestamp, fixture_start());
            let minutes = lifecycle.duration().whole_minutes();
            assert!((10..=360).contains(&minutes), "duration {minutes} out of 10..=360");
            assert!(distance_km(BASE_COORDINATE, lifecycle.start_location.position) < 4.0);
            assert!(distance_km(BASE_COORDINATE, lifecycle.end_location.position) < 4.0);
        }
    }

    #[test]
    fn repeated_composition_is_bit_identical() {
        let synth = FleetSynth::default();
        let route = fixture_route(150);
        let first = synth.compose_lifecycle("event-12", &route, fixture_start(), None);
        let second = synth.compose_lifecycle("event-12", &route, fixture_start(), None);
        assert_eq!(first, second);
        assert_eq!(
            first.start_location.position.lat().to_bits(),
            second.start_location.position.lat().to_bits()
        );
    }

    #[test]
    fn start_index_stays_in_first_seventy_percent() {
        let synth = FleetSynth::default();
        let route = fixture_route(100);
        for n in 0..300 {
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{n}"), &route, fixture_start(), None);
            let Some(start_index) = lifecycle.route_alignment.start_route_index else {
                panic!("non-empty route must record a start index");
            };
            assert!(start_index < 70, "start index {start_index} outside first 70%");
            assert_eq!(lifecycle.start_location.position, route[start_index]);
            assert_eq!(
                lifecycle.start_location.timestamp,
                fixture_start() + Duration::minutes(i64::try_from(start_index).unwrap_or(0) * 2)
            );
        }
    }

    #[test]
    fn every_branch_is_reachable_with_expected_shape() {
        let synth = FleetSynth::default();
        let route = fixture_route(200);
        let (mut multi_day, mut on_route, mut near) = (0_u32, 0_u32, 0_u32);

        for n in 0..1_000 {
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{n}"), &route, fixture_start(), None);
            let alignment = lifecycle.route_alignment;
            let minutes = lifecycle.duration().whole_minutes();
            let moved = distance_km(lifecycle.start_location.position, lifecycle.end_location.position);

            if alignment.ends_on_route {
                on_route += 1;
                let (Some(start), Some(end)) = (alignment.start_route_index, alignment.end_route_index)
                else {
                    panic!("on-route lifecycle must carry both indices");
                };
                assert!((10..=50).contains(&(end - start)), "ahead {}", end - start);
                assert_eq!(lifecycle.end_location.position, route[end]);
                let covered = i64::try_from(end - start).unwrap_or(0) * 2;
                assert!((covered + 10..=covered + 120).contains(&minutes));
            } else if minutes >= 8 * 60 && moved >= 1.9 {
                multi_day += 1;
                assert!(minutes <= 48 * 60);
                assert!(moved <= 8.1, "multi-day end {moved} km away");
            } else {
                near += 1;
                assert!((30..=240).contains(&minutes), "near-stop duration {minutes}");
                assert!(moved < 1.0, "near-stop end {moved} km away");
            }
        }

        assert!((140..=260).contains(&multi_day), "multi-day count {multi_day}");
        assert!((480..=640).contains(&on_route), "on-route count {on_route}");
        assert!(near > 150, "near-stop count {near}");
    }

    #[test]
    fn end_index_is_clamped_to_route_length() {
        let synth = FleetSynth::default();
        let route = fixture_route(12);
        for n in 0..300 {
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{n}"), &route, fixture_start(), None);
            if let Some(end) = lifecycle.route_alignment.end_route_index {
                assert!(end < route.len());
            }
        }
    }

    #[test]
    fn single_point_route_starts_at_that_point() {
        let synth = FleetSynth::default();
        let route = [GeoPoint::new(19.5, -99.2)];
        for n in 0..100 {
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{n}"), &route, fixture_start(), None);
            assert_eq!(lifecycle.route_alignment.start_route_index, Some(0));
            assert!(lifecycle.end_location.timestamp > lifecycle.start_location.timestamp);
        }
    }

    #[test]
    fn reference_date_reanchors_the_start_day() {
        let synth = FleetSynth::default();
        let lifecycle =
            synth.compose_lifecycle("event-5", &[], fixture_start(), Some(date!(2023 - 01 - 15)));
        assert_eq!(lifecycle.start_location.timestamp, datetime!(2023-01-15 08:00:00 UTC));
    }

    #[test]
    fn anchors_at_the_end_of_time_still_compose() {
        let synth = FleetSynth::default();
        let route = fixture_route(120);
        let last_day = datetime!(9999-12-31 23:00:00 UTC);
        for n in 0..50 {
            let id = format!("event-{n}");
            for lifecycle in [
                synth.compose_lifecycle(&id, &route, last_day, None),
                synth.compose_lifecycle(&id, &[], fixture_start(), Some(date!(9999 - 12 - 31))),
            ] {
                assert!(
                    lifecycle.end_location.timestamp > lifecycle.start_location.timestamp,
                    "{id}: end must follow start"
                );
                assert!(lifecycle.duration().whole_minutes() >= 10);
            }
        }
    }

    #[test]
    fn names_do_not_depend_on_the_branch() {
        let synth = FleetSynth::default();
        let without_route = synth.compose_lifecycle("event-77", &[], fixture_start(), None);
        let with_route =
            synth.compose_lifecycle("event-77", &fixture_route(90), fixture_start(), None);
        assert_eq!(without_route.start_location.name, with_route.start_location.name);
        assert_eq!(without_route.end_location.name, with_route.end_location.name);
    }

    proptest! {
        #[test]
        fn indices_stay_in_bounds_and_time_moves_forward(
            number in 0_u32..100_000,
            len in 1_usize..400,
        ) {
            let synth = FleetSynth::default();
            let route = fixture_route(len);
            let lifecycle =
                synth.compose_lifecycle(&format!("event-{number}"), &route, fixture_start(), None);
            let alignment = lifecycle.route_alignment;
            if let Some(start) = alignment.start_route_index {
                prop_assert!(start < route.len());
            }
            if let Some(end) = alignment.end_route_index {
                prop_assert!(end < route.len());
            }
            prop_assert!(lifecycle.end_location.timestamp > lifecycle.start_location.timestamp);
        }
    }
}
