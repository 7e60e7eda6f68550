/// Text extraction for the forecast pages.
///
/// Every function here is a pure computation over flattened page text
/// (see `ingest::flatten`); none of them fetch anything.
///
/// Submodules:
/// - `dates`: `DD MMM` day markers and per-day blocks.
/// - `tides`: (time, height, coefficient) readings.
/// - `tokens`: line classifier used by the hourly extractor.
/// - `hourly`: hourly wind and weather vectors.

pub mod dates;
pub mod hourly;
pub mod tides;
pub mod tokens;
