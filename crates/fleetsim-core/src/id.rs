//! Parsing of event and vehicle identifiers.
//!
//! Parsing never fails: an id that matches no known pattern degrades to
//! index 0 so a surface rendering an unexpected id still gets well-formed data.

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::SynthError;

const EVENT_MARKER: &str = "event-";
const VEHICLE_PREFIX: &str = "unidad-";

/// Parsed form of `event-<n>` or `<YYYY-MM-DD>-event-<n>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct EventKey {
    pub number: u32,
    #[serde(default, with = "crate::serde_date::option")]
    pub date: Option<Date>,
    pub well_formed: bool,
}

impl EventKey {
    const MALFORMED: Self = Self { number: 0, date: None, well_formed: false };

    /// Canonical id for the same key.
    #[must_use]
    pub fn to_id(&self) -> String {
        event_id(self.date, self.number)
    }
}

/// Parsed form of `unidad-<n>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct VehicleKey {
    pub index: u32,
    pub well_formed: bool,
}

#[must_use]
pub fn parse_event_id(id: &str) -> EventKey {
    let Some(key) = try_parse_event_id(id) else {
        tracing::debug!(event_id = id, "unrecognized event id, falling back to index 0");
        return EventKey::MALFORMED;
    };
    key
}

fn try_parse_event_id(id: &str) -> Option<EventKey> {
    if let Some(number) = id.strip_prefix(EVENT_MARKER) {
        return Some(EventKey { number: parse_index(number)?, date: None, well_formed: true });
    }

    let (date, number) = id.split_once(&format!("-{EVENT_MARKER}"))?;
    let date = parse_date(date).ok()?;
    Some(EventKey { number: parse_index(number)?, date: Some(date), well_formed: true })
}

#[must_use]
pub fn parse_vehicle_id(id: &str) -> VehicleKey {
    match id.strip_prefix(VEHICLE_PREFIX).and_then(parse_index) {
        Some(index) => VehicleKey { index, well_formed: true },
        None => {
            tracing::debug!(vehicle_id = id, "unrecognized vehicle id, falling back to index 0");
            VehicleKey { index: 0, well_formed: false }
        }
    }
}

fn parse_index(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[must_use]
pub fn event_id(date: Option<Date>, number: u32) -> String {
    match date {
        Some(date) => format!("{}-{EVENT_MARKER}{number}", format_date(date)),
        None => format!("{EVENT_MARKER}{number}"),
    }
}

#[must_use]
pub fn vehicle_id(index: u32) -> String {
    format!("{VEHICLE_PREFIX}{index}")
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
/// Returns [`SynthError::Query`] when the value is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, SynthError> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|err| SynthError::Query(format!("invalid date `{value}`: {err}")))
}

#[must_use]
pub fn format_date(date: Date) -> String {
    let (year, month, day) = date.to_calendar_date();
    format!("{year:04}-{:02}-{day:02}", u8::from(month))
}
