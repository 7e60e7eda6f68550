/// Tide height at an arbitrary time of day.
///
/// Linear interpolation between the two published readings that bracket the
/// requested time. There is no extrapolation: outside the first and last
/// reading of the day the answer is `None`.

use chrono::{NaiveTime, Timelike};

use crate::model::TideEvent;

/// Minutes elapsed since midnight, ignoring seconds.
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimates the height at `target` from one day's ordered events.
///
/// - A target equal to a reading's time returns that reading's height.
/// - A target strictly between two readings is interpolated and rounded to
///   two decimals.
/// - Empty input, or a target before the first or after the last reading,
///   returns `None`.
///
/// Events without a height are not used as interpolation anchors.
pub fn interpolate(events: &[TideEvent], target: NaiveTime) -> Option<f64> {
    let target_min = minutes_since_midnight(target);
    let mut before: Option<(u32, f64)> = None;
    let mut after: Option<(u32, f64)> = None;

    for event in events {
        let Some(height) = event.height_m else {
            continue;
        };
        let minutes = minutes_since_midnight(event.time);
        if minutes == target_min {
            return Some(height);
        }
        if minutes < target_min {
            before = Some((minutes, height));
        } else {
            after = Some((minutes, height));
            break;
        }
    }

    let ((t0, h0), (t1, h1)) = (before?, after?);
    let fraction = (target_min - t0) as f64 / (t1 - t0) as f64;
    Some(round2(h0 + (h1 - h0) * fraction))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
