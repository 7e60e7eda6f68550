/// Tide analysis over extracted readings.
///
/// This module works on already-published discrete readings only; there
/// is no harmonic prediction here.
///
/// Submodules:
/// - `interpolate`: height at an arbitrary time between two readings.
/// - `daily`: per-day summaries, high/low classification, port comparison.

pub mod daily;
pub mod interpolate;
