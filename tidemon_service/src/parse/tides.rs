//! Tide event extraction from the `previsao/mares` page.
//!
//! Within a day block, every reading appears as `3:14 0,7 m 56`: clock time,
//! height in metres (comma or dot decimal), then the tidal coefficient.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use crate::model::{TideEvent, parse_clock};
use crate::normalize::{to_integer, to_number};
use crate::parse::dates::{ScanContext, scan_markers, split_blocks};

static TIDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}:\d{2})[\s|;]*([+-]?\d+(?:[.,]\d+)?)\s*m[\s|;]*(\d{1,3})\b")
        .expect("valid tide event regex")
});

static SUNRISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnascer(?:\s+do\s+sol)?\D{0,12}?(\d{1,2}:\d{2})").expect("valid sunrise regex")
});

static SUNSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bp[oô]r(?:\s+do\s+sol)?\D{0,12}?(\d{1,2}:\d{2})").expect("valid sunset regex")
});

/// Tide readings and sun times found in one day block.
#[derive(Debug, Clone, PartialEq)]
pub struct TideDay {
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

/// Everything the tide page yielded, plus how confident the scan was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TidePage {
    pub days: Vec<TideDay>,
    pub markers_found: usize,
    pub markers_skipped: usize,
}

impl TidePage {
    /// All events of all days, in page order.
    pub fn events(&self) -> Vec<TideEvent> {
        self.days.iter().flat_map(|d| d.events.iter().cloned()).collect()
    }
}

/// Extracts every (time, height, coefficient) triplet in `block`, in
/// textual order, all stamped with `date`.
///
/// Duplicates caused by repeated markup are kept; a block without matches
/// gives an empty list.
pub fn extract_tide_events(date: NaiveDate, block: &str) -> Vec<TideEvent> {
    let mut events = Vec::new();
    let mut pos = 0;

    while let Some(caps) = TIDE_RE.captures_at(block, pos) {
        let (Some(whole), Some(time), Some(height), Some(coef)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            break;
        };

        // "0,7 m\n9:41": the digits after the unit start the next reading.
        if block[coef.end()..].starts_with(':') {
            pos = coef.start();
            continue;
        }
        pos = whole.end();

        let Some(time) = parse_clock(time.as_str()) else {
            continue;
        };
        events.push(TideEvent {
            date,
            time,
            height_m: to_number(height.as_str()).filter(|h| h.is_finite()),
            coefficient: to_integer(coef.as_str()),
        });
    }

    events
}

/// Finds labelled sunrise (`Nascer do sol 6:12`) and sunset
/// (`Pôr do sol 18:45`) times in a block.
pub fn extract_sun_times(block: &str) -> (Option<NaiveTime>, Option<NaiveTime>) {
    let find = |re: &Regex| {
        re.captures(block)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_clock(m.as_str()))
    };
    (find(&SUNRISE_RE), find(&SUNSET_RE))
}

/// Runs the date scanner over a flattened tide page and extracts each
/// day block.
pub fn parse_tides_page(text: &str, ctx: &ScanContext) -> TidePage {
    let scan = scan_markers(text, ctx);
    let days = split_blocks(text, &scan.markers)
        .into_iter()
        .map(|block| {
            let (sunrise, sunset) = extract_sun_times(block.text);
            TideDay {
                date: block.date,
                events: extract_tide_events(block.date, block.text),
                sunrise,
                sunset,
            }
        })
        .collect();

    TidePage {
        days,
        markers_found: scan.markers.len(),
        markers_skipped: scan.skipped,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::dates::RolloverPolicy;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_two_triplets_in_textual_order() {
        let d = date(2025, 12, 27);
        let events = extract_tide_events(d, "3:14 0,7 m 56 ... 9:41 1,3 m 62");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TideEvent { date: d, time: hm(3, 14), height_m: Some(0.7), coefficient: Some(56) });
        assert_eq!(events[1], TideEvent { date: d, time: hm(9, 41), height_m: Some(1.3), coefficient: Some(62) });
    }

    #[test]
    fn test_dot_decimals_and_negative_heights() {
        let events = extract_tide_events(date(2025, 1, 2), "15:50 -0.2 m 88\n22:03 2.41m 90");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].height_m, Some(-0.2));
        assert_eq!(events[1].height_m, Some(2.41));
        assert_eq!(events[1].coefficient, Some(90));
    }

    #[test]
    fn test_newline_separated_cells_match() {
        let events = extract_tide_events(date(2025, 1, 2), "3:14\n0,7 m\n56\n9:41\n1,3 m\n62");
        let times: Vec<_> = events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![hm(3, 14), hm(9, 41)]);
    }

    #[test]
    fn test_next_clock_time_is_not_taken_as_coefficient() {
        // First reading has no coefficient; the second must survive intact.
        let events = extract_tide_events(date(2025, 1, 2), "3:14 0,7 m\n9:41 1,3 m 62");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, hm(9, 41));
        assert_eq!(events[0].coefficient, Some(62));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let events = extract_tide_events(date(2025, 1, 2), "3:14 0,7 m 56 3:14 0,7 m 56");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], events[1]);
    }

    #[test]
    fn test_block_without_readings_is_empty() {
        assert!(extract_tide_events(date(2025, 1, 2), "Sábado Lua cheia").is_empty());
        assert!(extract_tide_events(date(2025, 1, 2), "").is_empty());
    }

    #[test]
    fn test_invalid_clock_time_is_skipped() {
        let events = extract_tide_events(date(2025, 1, 2), "25:10 0,7 m 56 4:10 0,9 m 57");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].time, hm(4, 10));
    }

    #[test]
    fn test_sun_times_read_from_labels() {
        let (rise, set) = extract_sun_times("Nascer do sol\n5:31\nPôr do sol\n18:47\n3:14 0,7 m 56");
        assert_eq!(rise, Some(hm(5, 31)));
        assert_eq!(set, Some(hm(18, 47)));
        assert_eq!(extract_sun_times("3:14 0,7 m 56"), (None, None));
    }

    #[test]
    fn test_page_parse_assigns_block_dates() {
        let text = "Marés\n27 DEZ\n3:14 0,7 m 56\n9:41 1,3 m 62\n28 DEZ\n4:02 0,6 m 60\n1 JAN\n5:00 0,5 m 70";
        let ctx = ScanContext::new(date(2025, 12, 27), RolloverPolicy::EarlyMonths);
        let page = parse_tides_page(text, &ctx);

        assert_eq!(page.markers_found, 3);
        assert_eq!(page.days.len(), 3);
        assert_eq!(page.days[0].events.len(), 2);
        assert_eq!(page.days[2].date, date(2026, 1, 1));
        assert_eq!(page.days[2].events[0].date, date(2026, 1, 1));
        assert_eq!(page.events().len(), 4);
    }

    #[test]
    fn test_page_without_markers_yields_nothing() {
        let ctx = ScanContext::new(date(2025, 12, 27), RolloverPolicy::EarlyMonths);
        let page = parse_tides_page("3:14 0,7 m 56", &ctx);
        assert_eq!(page.markers_found, 0);
        assert!(page.events().is_empty());
    }
}
