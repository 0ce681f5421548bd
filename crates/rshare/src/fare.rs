//! Placeholder fare estimation.
//!
//! There is no map data behind this: the "distance" is derived from the shape
//! of the two place names. It only needs to be stable and cheap.

use crate::config::FareConfig;

/// Pseudo-distance between two place names, never less than 1.
///
/// The character-count difference of the names plus half their combined word
/// count (halves round up). Words are pieces between single spaces.
#[must_use]
pub fn distance_units(from: &str, to: &str) -> u32 {
    let len_diff = from.chars().count().abs_diff(to.chars().count());
    let words = from.split(' ').count() + to.split(' ').count();
    let units = len_diff + words.div_ceil(2);
    u32::try_from(units.max(1)).unwrap_or(u32::MAX)
}

/// Estimate the fare for a ride between two place names.
#[must_use]
pub fn estimate_fare(from: &str, to: &str, rates: &FareConfig) -> u32 {
    rates
        .base
        .saturating_add(distance_units(from, to).saturating_mul(rates.per_unit))
}
