use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::seed::{offset, Seed};

const STATUS_SEED_FACTOR: u64 = 11;
const OPEN_CUTOFF: f64 = 0.40;
const IN_PROGRESS_CUTOFF: f64 = 0.70;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    Abierto,
    EnProgreso,
    Cerrado,
}

impl OperationalStatus {
    pub const ALL: [Self; 3] = [Self::Abierto, Self::EnProgreso, Self::Cerrado];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abierto => "abierto",
            Self::EnProgreso => "en_progreso",
            Self::Cerrado => "cerrado",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "abierto" => Some(Self::Abierto),
            "en_progreso" => Some(Self::EnProgreso),
            "cerrado" => Some(Self::Cerrado),
            _ => None,
        }
    }

    /// Open events keep accruing elapsed time at render.
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Cerrado)
    }

    fn from_draw(draw: f64) -> Self {
        if draw < OPEN_CUTOFF {
            Self::Abierto
        } else if draw < IN_PROGRESS_CUTOFF {
            Self::EnProgreso
        } else {
            Self::Cerrado
        }
    }
}

impl Display for OperationalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The one place status is derived. Every surface calls this rather than
/// drawing its own 40/30/30 split.
#[must_use]
pub fn resolve_status(id: &str) -> OperationalStatus {
    let draw = Seed::of(id).scaled(STATUS_SEED_FACTOR).draw(offset::SEVERITY);
    OperationalStatus::from_draw(draw)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn cut_points_are_half_open() {
        assert_eq!(OperationalStatus::from_draw(0.0), OperationalStatus::Abierto);
        assert_eq!(OperationalStatus::from_draw(0.399_999), OperationalStatus::Abierto);
        assert_eq!(OperationalStatus::from_draw(0.40), OperationalStatus::EnProgreso);
        assert_eq!(OperationalStatus::from_draw(0.699_999), OperationalStatus::EnProgreso);
        assert_eq!(OperationalStatus::from_draw(0.70), OperationalStatus::Cerrado);
        assert_eq!(OperationalStatus::from_draw(0.999_999), OperationalStatus::Cerrado);
    }

    #[test]
    fn status_is_stable_across_repeated_calls() {
        let first = resolve_status("event-0");
        for _ in 0..10_000 {
            assert_eq!(resolve_status("event-0"), first);
        }
    }

    #[test]
    fn call_order_does_not_matter() {
        let forward = (0..50).map(|n| resolve_status(&format!("event-{n}"))).collect::<Vec<_>>();
        let mut backward =
            (0..50).rev().map(|n| resolve_status(&format!("event-{n}"))).collect::<Vec<_>>();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn distribution_tracks_forty_thirty_thirty() {
        let mut counts = [0_u32; 3];
        for n in 0..1_000 {
            match resolve_status(&format!("event-{n}")) {
                OperationalStatus::Abierto => counts[0] += 1,
                OperationalStatus::EnProgreso => counts[1] += 1,
                OperationalStatus::Cerrado => counts[2] += 1,
            }
        }
        for (count, expected) in counts.into_iter().zip([400_u32, 300, 300]) {
            assert!(count.abs_diff(expected) <= 50, "counts {counts:?} drift from 40/30/30");
        }
    }

    #[test]
    fn names_round_trip() {
        for status in OperationalStatus::ALL {
            assert_eq!(OperationalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OperationalStatus::parse("closed"), None);
    }

    proptest! {
        #[test]
        fn any_id_resolves_deterministically(id in ".{0,32}") {
            prop_assert_eq!(resolve_status(&id), resolve_status(&id));
        }
    }
}
