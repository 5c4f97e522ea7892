use serde::{Deserialize, Serialize};

use crate::id::{parse_vehicle_id, vehicle_id};

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct VehicleIdentity {
    pub numeric_index: u32,
    pub callsign: String,
}

impl VehicleIdentity {
    #[must_use]
    pub fn from_index(numeric_index: u32) -> Self {
        Self { numeric_index, callsign: format_callsign(numeric_index) }
    }

    /// Identity for `unidad-<n>`; malformed ids resolve to index 0.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        Self::from_index(parse_vehicle_id(id).index)
    }

    #[must_use]
    pub fn vehicle_id(&self) -> String {
        vehicle_id(self.numeric_index)
    }
}

/// Three letters at fixed offsets from the index, then the index padded to
/// two digits.
///
/// Callsigns are externally visible and must not change for a given index.
/// Known limitation: uniqueness is only checked for indices 0..100.
#[must_use]
pub fn format_callsign(numeric_index: u32) -> String {
    let letter = |shift: u32| {
        let position = u8::try_from((numeric_index % 26 + shift) % 26).unwrap_or(0);
        char::from(b'A' + position)
    };
    format!("{}{}{}{numeric_index:02}", letter(0), letter(3), letter(7))
}
