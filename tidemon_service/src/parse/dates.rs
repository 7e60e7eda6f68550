//! Date marker scanning.
//!
//! The forecast pages never print a year. Each day is introduced by a marker
//! such as `27 DEZ` somewhere in the flattened text, and everything up to the
//! next marker belongs to that day.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::logging::{self, LogSource};
use crate::normalize::month_abbrev_to_number;

// Known months may run straight into the weekday ("26DEZSexta-feira"); any
// other three-letter token must stand alone to count as a candidate.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})\s*(JAN|FEV|MAR|ABR|MAI|JUN|JUL|AGO|SET|OUT|NOV|DEZ|[A-Z]{3}\b)")
        .expect("valid date marker regex")
});

// ---------------------------------------------------------------------------
// Scan context
// ---------------------------------------------------------------------------

/// How a marker's year is chosen when the month is earlier than today's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloverPolicy {
    /// Next year only when the marker month is January or February and
    /// earlier than the current month. Any other earlier month stays in the
    /// current year.
    #[default]
    EarlyMonths,
    /// Always the current year.
    Disabled,
}

impl RolloverPolicy {
    /// Parses the config spelling (`"early-months"`, `"disabled"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "early-months" => Some(RolloverPolicy::EarlyMonths),
            "disabled" => Some(RolloverPolicy::Disabled),
            _ => None,
        }
    }

    /// Year to assign to a marker of `month` seen on `today`.
    pub fn year_for(&self, month: u32, today: NaiveDate) -> i32 {
        match self {
            RolloverPolicy::EarlyMonths if month < today.month() && month <= 2 => today.year() + 1,
            _ => today.year(),
        }
    }
}

/// The clock inputs a scan depends on.
///
/// Passed in rather than read from the system so that the same text always
/// scans to the same dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanContext {
    pub today: NaiveDate,
    pub rollover: RolloverPolicy,
}

impl ScanContext {
    pub fn new(today: NaiveDate, rollover: RolloverPolicy) -> Self {
        ScanContext { today, rollover }
    }

    /// Context for the current local date.
    pub fn local(rollover: RolloverPolicy) -> Self {
        ScanContext::new(chrono::Local::now().date_naive(), rollover)
    }
}

// ---------------------------------------------------------------------------
// Markers and blocks
// ---------------------------------------------------------------------------

/// One accepted `DD MMM` occurrence, with byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMarker {
    pub day: u32,
    pub month_abbrev: String,
    pub date: NaiveDate,
    pub start: usize,
    pub end: usize,
}

/// Result of scanning a page for date markers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerScan {
    pub markers: Vec<DateMarker>,
    /// Candidates that looked like markers but had an unknown month or an
    /// impossible day (`00 WSW`, `31 FEV`).
    pub skipped: usize,
}

/// Text belonging to a single calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBlock<'a> {
    pub date: NaiveDate,
    pub text: &'a str,
}

/// Finds every day + month-abbreviation marker in `text`, in order.
///
/// Candidates that do not resolve to a real date are skipped and do not
/// interrupt the scan.
pub fn scan_markers(text: &str, ctx: &ScanContext) -> MarkerScan {
    let mut scan = MarkerScan::default();

    for caps in MARKER_RE.captures_iter(text) {
        let (Some(whole), Some(day), Some(month)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let resolved = month_abbrev_to_number(month.as_str()).and_then(|month_num| {
            let day_num: u32 = day.as_str().parse().ok()?;
            let year = ctx.rollover.year_for(month_num, ctx.today);
            NaiveDate::from_ymd_opt(year, month_num, day_num).map(|date| (day_num, date))
        });

        match resolved {
            Some((day_num, date)) => scan.markers.push(DateMarker {
                day: day_num,
                month_abbrev: month.as_str().to_string(),
                date,
                start: whole.start(),
                end: whole.end(),
            }),
            None => {
                scan.skipped += 1;
                logging::debug(
                    LogSource::Parser,
                    None,
                    &format!("skipping date marker candidate '{}'", whole.as_str()),
                );
            }
        }
    }

    scan
}

/// Slices `text` into one block per marker: from the marker's end to the
/// next marker's start, or to the end of the text for the last one.
pub fn split_blocks<'a>(text: &'a str, markers: &[DateMarker]) -> Vec<DayBlock<'a>> {
    markers
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let end = markers.get(i + 1).map(|next| next.start).unwrap_or(text.len());
            DayBlock {
                date: marker.date,
                text: &text[marker.end..end],
            }
        })
        .collect()
}

/// The date of the last marker starting at or before `offset`, if any.
pub fn date_at(markers: &[DateMarker], offset: usize) -> Option<NaiveDate> {
    markers
        .iter()
        .take_while(|m| m.start <= offset)
        .last()
        .map(|m| m.date)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
