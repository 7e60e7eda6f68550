/// Per-day tide views built from extracted events.
///
/// High and low water are decided by comparing each reading with its
/// neighbours; the page's own markup for tide type is not trusted.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::analysis::interpolate::interpolate;
use crate::model::{CoefficientSummary, DailyTideSummary, TideEvent, TideKind};
use crate::parse::tides::TideDay;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classifies each event of one day as high or low water.
///
/// An event higher than every neighbour it has is high; lower than every
/// neighbour is low. Events without a height, without height-bearing
/// neighbours, or level with a neighbour stay unclassified.
pub fn classify_events(events: &[TideEvent]) -> Vec<Option<TideKind>> {
    events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let height = event.height_m?;
            let prev = i.checked_sub(1).and_then(|p| events[p].height_m);
            let next = events.get(i + 1).and_then(|n| n.height_m);
            let neighbours: Vec<f64> = prev.into_iter().chain(next).collect();

            if neighbours.is_empty() {
                None
            } else if neighbours.iter().all(|&n| height > n) {
                Some(TideKind::High)
            } else if neighbours.iter().all(|&n| height < n) {
                Some(TideKind::Low)
            } else {
                None
            }
        })
        .collect()
}

pub fn summarize_coefficients(events: &[TideEvent]) -> Option<CoefficientSummary> {
    let coefs: Vec<u32> = events.iter().filter_map(|e| e.coefficient).collect();
    let min = *coefs.iter().min()?;
    let max = *coefs.iter().max()?;
    let mean = coefs.iter().map(|&c| c as f64).sum::<f64>() / coefs.len() as f64;
    Some(CoefficientSummary { min, max, mean })
}

/// Builds the summary for one parsed day block of a port.
pub fn summarize_day(location: &str, day: &TideDay) -> DailyTideSummary {
    DailyTideSummary {
        location: location.to_string(),
        date: day.date,
        events: day.events.clone(),
        coefficient: summarize_coefficients(&day.events),
        sunrise: day.sunrise,
        sunset: day.sunset,
    }
}

impl DailyTideSummary {
    fn of_kind(&self, kind: TideKind) -> Vec<&TideEvent> {
        self.events
            .iter()
            .zip(classify_events(&self.events))
            .filter(|(_, k)| *k == Some(kind))
            .map(|(e, _)| e)
            .collect()
    }

    pub fn high_tides(&self) -> Vec<&TideEvent> {
        self.of_kind(TideKind::High)
    }

    pub fn low_tides(&self) -> Vec<&TideEvent> {
        self.of_kind(TideKind::Low)
    }

    /// Interpolated height at `time` on this day.
    pub fn tide_at(&self, time: NaiveTime) -> Option<f64> {
        interpolate(&self.events, time)
    }
}

// ---------------------------------------------------------------------------
// Cross-port comparison
// ---------------------------------------------------------------------------

/// Extremes and average coefficient across several ports' days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortComparison {
    pub locations: Vec<String>,
    pub max_height_m: f64,
    pub min_height_m: f64,
    pub mean_coefficient: Option<f64>,
}

/// Compares day summaries, typically the same date across ports.
///
/// Returns `None` when no summary carries a single height.
pub fn compare_ports(days: &[DailyTideSummary]) -> Option<PortComparison> {
    let heights: Vec<f64> = days
        .iter()
        .flat_map(|d| d.events.iter().filter_map(|e| e.height_m))
        .collect();
    let max_height_m = heights.iter().copied().reduce(f64::max)?;
    let min_height_m = heights.iter().copied().reduce(f64::min)?;

    let means: Vec<f64> = days.iter().filter_map(|d| d.coefficient.as_ref().map(|c| c.mean)).collect();
    let mean_coefficient = if means.is_empty() {
        None
    } else {
        Some(means.iter().sum::<f64>() / means.len() as f64)
    };

    Some(PortComparison {
        locations: days.iter().map(|d| d.location.clone()).collect(),
        max_height_m,
        min_height_m,
        mean_coefficient,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
