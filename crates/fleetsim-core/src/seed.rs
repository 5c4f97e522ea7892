//! Seed derivation and the stateless scalar generator every draw goes through.

use serde::{Deserialize, Serialize};

/// Fixed draw offsets, one per call site. Two attributes read from the same
/// seed must never share an offset or they collapse onto the same list index.
pub mod offset {
    pub const SEVERITY: u64 = 0;
    pub const TEMPLATE: u64 = 7;
    pub const TAG: u64 = 13;
    pub const ASSIGNEE: u64 = 29;
    pub const HOUR: u64 = 41;
    pub const MINUTE: u64 = 43;
    pub const SECOND: u64 = 47;

    pub const LOCATION_KIND: u64 = 101;
    pub const LOCATION_ENTRY: u64 = 103;
    pub const LOCATION_NUMBER: u64 = 107;
    pub const LOCATION_NEIGHBORHOOD: u64 = 109;
    /// Added on top of the start-location offsets to resolve the end name.
    pub const END_LOCATION: u64 = 1_000;

    pub const START_INDEX: u64 = 211;
    pub const BRANCH: u64 = 223;
    pub const ON_ROUTE: u64 = 227;
    pub const POINTS_AHEAD: u64 = 229;
    pub const DURATION: u64 = 233;
    pub const DISTANCE: u64 = 239;
    pub const BEARING: u64 = 241;
    pub const START_LAT: u64 = 251;
    pub const START_LNG: u64 = 257;
    pub const END_LAT: u64 = 263;
    pub const END_LNG: u64 = 269;

    pub const ROUTE_ANCHOR_LAT: u64 = 307;
    pub const ROUTE_ANCHOR_LNG: u64 = 311;
    pub const ROUTE_HEADING: u64 = 313;
    /// Per-step draws use `ROUTE_STEP + 2 * step` and `ROUTE_STEP + 2 * step + 1`.
    pub const ROUTE_STEP: u64 = 10_000;

    pub const ALL: [u64; 29] = [
        SEVERITY,
        TEMPLATE,
        TAG,
        ASSIGNEE,
        HOUR,
        MINUTE,
        SECOND,
        LOCATION_KIND,
        LOCATION_ENTRY,
        LOCATION_NUMBER,
        LOCATION_NEIGHBORHOOD,
        END_LOCATION + LOCATION_KIND,
        END_LOCATION + LOCATION_ENTRY,
        END_LOCATION + LOCATION_NUMBER,
        END_LOCATION + LOCATION_NEIGHBORHOOD,
        START_INDEX,
        BRANCH,
        ON_ROUTE,
        POINTS_AHEAD,
        DURATION,
        DISTANCE,
        BEARING,
        START_LAT,
        START_LNG,
        END_LAT,
        END_LNG,
        ROUTE_ANCHOR_LAT,
        ROUTE_ANCHOR_LNG,
        ROUTE_HEADING,
    ];
}

/// Stable integer seed for one entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Seed(pub u64);

impl Seed {
    #[must_use]
    pub fn of(id: &str) -> Self {
        Self(u64::from(derive_seed(id)))
    }

    /// One scalar draw in `[0, 1)`.
    #[must_use]
    pub fn draw(self, offset: u64) -> f64 {
        scalar(self.0, offset)
    }

    /// Uniform integer in `lo..=hi`.
    #[must_use]
    pub fn range(self, offset: u64, lo: u32, hi: u32) -> u32 {
        range_inclusive(self.0, offset, lo, hi)
    }

    /// Index in `0..len`; `len` must be non-zero.
    #[must_use]
    pub fn index(self, offset: u64, len: usize) -> usize {
        scaled_index(self.draw(offset), len)
    }

    #[must_use]
    pub const fn scaled(self, factor: u64) -> Self {
        Self(self.0.wrapping_mul(factor))
    }

    #[must_use]
    pub const fn combined(self, other: Self) -> Self {
        Self(self.0.wrapping_add(other.0))
    }
}

/// 32-bit rolling hash over UTF-16 code units (`h * 31 + unit`, signed
/// wraparound), returned as an absolute value. The empty string maps to 0.
#[must_use]
pub fn derive_seed(id: &str) -> u32 {
    let hash = id.encode_utf16().fold(0_i32, |hash, unit| {
        hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs()
}

fn splitmix64(mut value: u64) -> u64 {
    value = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    value = (value ^ (value >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    value ^ (value >> 31)
}

/// Pure `(seed, offset) -> [0, 1)` transform. No state survives the call.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn scalar(seed: u64, offset: u64) -> f64 {
    const SCALE: f64 = 1.0 / (1_u64 << 53) as f64;
    let bits = splitmix64(seed ^ splitmix64(offset)) >> 11;
    bits as f64 * SCALE
}

/// Uniform integer in `lo..=hi` built on [`scalar`]. Bounds are swapped when
/// given in the wrong order.
#[must_use]
pub fn range_inclusive(seed: u64, offset: u64, lo: u32, hi: u32) -> u32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let span = usize::try_from(hi - lo).unwrap_or(usize::MAX).saturating_add(1);
    let step = scaled_index(scalar(seed, offset), span);
    lo.saturating_add(u32::try_from(step).unwrap_or(u32::MAX)).min(hi)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn scaled_index(draw: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let index = (draw * len as f64).floor() as usize;
    index.min(len - 1)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_string_hashes_to_zero() {
        assert_eq!(derive_seed(""), 0);
    }

    #[test]
    fn rolling_hash_matches_known_values() {
        assert_eq!(derive_seed("a"), 97);
        assert_eq!(derive_seed("ab"), 97 * 31 + 98);
        assert_eq!(derive_seed("event-0"), 1_376_503_363);
        assert_eq!(derive_seed("unidad-3"), 307_063_683);
    }

    #[test]
    fn hash_runs_over_utf16_units() {
        // U+1F69A sits outside the BMP and contributes two surrogate units.
        let expected = {
            let high = i32::from(0xD83D_u16);
            let low = i32::from(0xDE9A_u16);
            (high.wrapping_mul(31).wrapping_add(low)).unsigned_abs()
        };
        assert_eq!(derive_seed("\u{1F69A}"), expected);
    }

    #[test]
    fn draw_offsets_are_distinct() {
        let unique = offset::ALL.iter().copied().collect::<BTreeSet<_>>();
        assert_eq!(unique.len(), offset::ALL.len());
    }

    #[test]
    fn different_offsets_decorrelate_draws() {
        let seed = Seed::of("event-42");
        assert_ne!(seed.draw(offset::SEVERITY).to_bits(), seed.draw(offset::TAG).to_bits());
    }

    #[test]
    fn range_accepts_reversed_bounds() {
        for seed in 0..200 {
            let value = range_inclusive(seed, 5, 120, 10);
            assert!((10..=120).contains(&value), "value {value} out of 10..=120");
        }
    }

    #[test]
    fn range_covers_both_endpoints() {
        let values = (0..2_000).map(|seed| range_inclusive(seed, 9, 1, 3)).collect::<BTreeSet<_>>();
        assert_eq!(values, BTreeSet::from([1, 2, 3]));
    }

    proptest! {
        #[test]
        fn scalar_stays_in_unit_interval(seed in any::<u64>(), offset in any::<u64>()) {
            let value = scalar(seed, offset);
            prop_assert!((0.0..1.0).contains(&value));
            prop_assert_eq!(value.to_bits(), scalar(seed, offset).to_bits());
        }

        #[test]
        fn derive_seed_is_stable(id in ".{0,40}") {
            prop_assert_eq!(derive_seed(&id), derive_seed(&id.clone()));
        }

        #[test]
        fn index_never_leaves_bounds(seed in any::<u64>(), len in 1_usize..500) {
            prop_assert!(Seed(seed).index(3, len) < len);
        }
    }
}
