/// Locale normalization for Portuguese-language forecast pages.
///
/// The pages print decimals with a comma (`1,4 m`), months as three-letter
/// Portuguese abbreviations (`DEZ`) and wind speeds in km/h. Everything
/// downstream works with dot decimals, month numbers and knots.

use std::sync::LazyLock;

use regex::Regex;

/// Kilometres per hour in one knot.
pub const KMH_PER_KNOT: f64 = 1.852;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\d+(?:[.,]\d+)?").expect("valid number regex"));

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digits regex"));

/// Portuguese month abbreviations, January first.
const PT_MONTHS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Returns the first number found in `text`, accepting `,` or `.` as the
/// decimal separator. `"1,4 m"` and `"1.4"` both give `1.4`.
pub fn to_number(text: &str) -> Option<f64> {
    let m = NUMBER_RE.find(text)?;
    m.as_str().replace(',', ".").parse().ok()
}

/// Returns the first run of digits in `text` as an integer.
pub fn to_integer(text: &str) -> Option<u32> {
    DIGITS_RE.find(text)?.as_str().parse().ok()
}

/// Maps a Portuguese three-letter month abbreviation to 1..=12.
///
/// Unknown tokens return `None`; callers skip the marker instead of failing
/// the page.
pub fn month_abbrev_to_number(abbrev: &str) -> Option<u32> {
    let upper = abbrev.trim().to_uppercase();
    PT_MONTHS
        .iter()
        .position(|m| *m == upper)
        .map(|i| i as u32 + 1)
}

pub fn knots_from_kmh(kmh: f64) -> f64 {
    kmh / KMH_PER_KNOT
}

/// Converts a published speed such as `"14 km/h"` into `"7.6 kn"`.
///
/// Only the leading integer is used. Text without a number passes through
/// unchanged.
pub fn kmh_to_knots(text: &str) -> String {
    match to_integer(text) {
        Some(kmh) => format!("{:.1} kn", knots_from_kmh(kmh as f64)),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
