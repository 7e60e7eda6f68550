//! Hourly vector extraction from the `previsao/vento` and `previsao/tempo`
//! pages.
//!
//! A line holding only a clock time starts an hour slot. The lines after it
//! are searched for a wind direction, a speed or a condition phrase. Page
//! layouts vary, so each slot falls back through:
//!
//! 1. direction and/or speed found in the lookahead window,
//! 2. the next line as free text,
//!
//! and a page where no slot produced anything falls back to pairing every
//! clock line with the line after it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{ATTR_DIRECTION, ATTR_SPEED_KMH, ATTR_TEMPERATURE, HourlyVector, parse_clock};
use crate::normalize::kmh_to_knots;
use crate::parse::dates::{DateMarker, ScanContext, date_at, scan_markers};
use crate::parse::tokens::{is_clock, is_speed, pick_window};

/// Lines inspected after each hour boundary.
pub const DEFAULT_LOOKAHEAD: usize = 6;

/// A trimmed, non-blank line and its byte offset in the page text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// Splits flattened text into trimmed non-blank lines.
pub fn page_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            lines.push(Line { offset, text: trimmed });
        }
        offset += raw.len() + 1;
    }
    lines
}

/// Shared state for one page: its lines and the dates they fall under.
struct HourlyPage<'a> {
    lines: Vec<Line<'a>>,
    markers: Vec<DateMarker>,
    today: NaiveDate,
}

impl<'a> HourlyPage<'a> {
    fn new(text: &'a str, ctx: &ScanContext) -> Self {
        HourlyPage {
            lines: page_lines(text),
            markers: scan_markers(text, ctx).markers,
            today: ctx.today,
        }
    }

    /// Indices of every hour-boundary line.
    fn boundaries(&self) -> Vec<usize> {
        (0..self.lines.len()).filter(|&i| is_clock(self.lines[i].text)).collect()
    }

    fn window(&self, boundary: usize, lookahead: usize) -> Vec<&'a str> {
        self.lines
            .iter()
            .skip(boundary + 1)
            .take(lookahead)
            .map(|l| l.text)
            .collect()
    }

    fn next_line(&self, boundary: usize) -> Option<&'a str> {
        self.lines.get(boundary + 1).map(|l| l.text)
    }

    /// Builds a vector for the boundary at `index`, or `None` if its clock
    /// text is not a real time of day.
    fn vector(&self, index: usize, value: String, attributes: BTreeMap<String, String>) -> Option<HourlyVector> {
        let line = self.lines[index];
        Some(HourlyVector {
            date: date_at(&self.markers, line.offset).unwrap_or(self.today),
            hour: parse_clock(line.text)?,
            value,
            attributes,
        })
    }

    /// Boundary paired with the line right after it, verbatim except for
    /// km/h speeds which are converted to knots.
    fn pairs(&self) -> Vec<HourlyVector> {
        self.boundaries()
            .into_iter()
            .filter_map(|i| {
                let next = self.next_line(i).unwrap_or("");
                let value = if is_speed(next) { kmh_to_knots(next) } else { next.to_string() };
                self.vector(i, value, BTreeMap::new())
            })
            .collect()
    }
}

/// Extracts wind-style hourly vectors from a flattened page.
///
/// For every boundary the first direction and the first speed in the next
/// `lookahead` lines are used; the speed is converted to knots. Slots with
/// neither take the following line as a condition, unless that line is
/// itself a clock time.
pub fn extract_hourly(text: &str, ctx: &ScanContext, lookahead: usize) -> Vec<HourlyVector> {
    let page = HourlyPage::new(text, ctx);
    let mut vectors = Vec::new();

    for i in page.boundaries() {
        let pick = pick_window(&page.window(i, lookahead));
        let mut attributes = BTreeMap::new();

        let value = if pick.direction.is_some() || pick.speed.is_some() {
            if let Some(direction) = pick.direction {
                attributes.insert(ATTR_DIRECTION.to_string(), direction.to_string());
            }
            match pick.speed {
                Some(speed) => {
                    attributes.insert(ATTR_SPEED_KMH.to_string(), speed.to_string());
                    kmh_to_knots(speed)
                }
                None => String::new(),
            }
        } else {
            match page.next_line(i) {
                Some(next) if !is_clock(next) => next.to_string(),
                _ => continue,
            }
        };

        if let Some(vector) = page.vector(i, value, attributes) {
            vectors.push(vector);
        }
    }

    if vectors.is_empty() {
        return page.pairs();
    }
    vectors
}

/// Extracts condition-style hourly vectors for the weather page.
///
/// Every boundary is paired with its next line as the condition text. A
/// temperature found within the lookahead window is kept as an attribute.
pub fn extract_conditions(text: &str, ctx: &ScanContext, lookahead: usize) -> Vec<HourlyVector> {
    let page = HourlyPage::new(text, ctx);

    page.boundaries()
        .into_iter()
        .filter_map(|i| {
            let value = page.next_line(i).filter(|l| !is_clock(l)).unwrap_or("").to_string();
            let mut attributes = BTreeMap::new();
            if let Some(temp) = pick_window(&page.window(i, lookahead))
                .temperature
                .and_then(crate::normalize::to_number)
            {
                attributes.insert(ATTR_TEMPERATURE.to_string(), format!("{}", temp));
            }
            page.vector(i, value, attributes)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
