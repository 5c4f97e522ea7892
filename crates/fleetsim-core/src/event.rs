use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::id::{format_date, parse_event_id};
use crate::seed::{offset, Seed};
use crate::FleetSynth;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Severity {
    Alta,
    Media,
    Baja,
    Informativa,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Alta, Self::Media, Self::Baja, Self::Informativa];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alta => "Alta",
            Self::Media => "Media",
            Self::Baja => "Baja",
            Self::Informativa => "Informativa",
        }
    }

    /// Case-insensitive, so `alta` from a query string also resolves.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|severity| severity.as_str().eq_ignore_ascii_case(value))
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct GeneratedEvent {
    pub id: String,
    pub template_name: String,
    pub severity: Severity,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub tag: String,
    pub assignee_email: String,
    pub instructions: String,
}

impl FleetSynth {
    /// Synthesize the full attribute set of one event.
    ///
    /// Everything except the creation time is a function of the id alone. The
    /// creation day is the id's own date fragment when it carries one and
    /// `reference_date` otherwise; the time of day is drawn from the id seed
    /// mixed with that day.
    #[must_use]
    pub fn generate_event(&self, id: &str, reference_date: Date) -> GeneratedEvent {
        let seed = Seed::of(id);
        let key = parse_event_id(id);
        let template = self.catalogs().templates.pick(seed, offset::TEMPLATE);
        let severity = Severity::ALL[seed.index(offset::SEVERITY, Severity::ALL.len())];

        GeneratedEvent {
            id: id.to_string(),
            template_name: template.name.clone(),
            severity,
            created_at: creation_timestamp(seed, key.date.unwrap_or(reference_date)),
            tag: self.catalogs().tags.pick(seed, offset::TAG).clone(),
            assignee_email: self.catalogs().assignees.pick(seed, offset::ASSIGNEE).clone(),
            instructions: template.instructions.clone(),
        }
    }
}

fn creation_timestamp(seed: Seed, day: Date) -> OffsetDateTime {
    let time_seed = seed.combined(Seed::of(&format_date(day)));
    let hour = time_seed.range(offset::HOUR, 0, 23);
    let minute = time_seed.range(offset::MINUTE, 0, 59);
    let second = time_seed.range(offset::SECOND, 0, 59);
    let time = Time::from_hms(
        u8::try_from(hour).unwrap_or(0),
        u8::try_from(minute).unwrap_or(0),
        u8::try_from(second).unwrap_or(0),
    )
    .unwrap_or(Time::MIDNIGHT);
    day.with_time(time).assume_utc()
}
