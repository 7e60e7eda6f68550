/// Output writers for a collection run.
///
/// JSON keeps the full record structure. The two CSV tables flatten it for
/// spreadsheet use: one row per tide event, and one row per hourly sample
/// with the wind and weather pages merged on (date, hour).

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::analysis::daily::classify_events;
use crate::logging::{self, LogSource};
use crate::model::{ATTR_DIRECTION, ATTR_TEMPERATURE, CollectionRun, HourlyVector, PortRecord, TideEvent};
use crate::normalize::to_number;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ExportError {
    Io(io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "Export I/O error: {}", e),
            ExportError::Csv(e) => write!(f, "CSV error: {}", e),
            ExportError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::Json(e)
    }
}

// ---------------------------------------------------------------------------
// Row shapes
// ---------------------------------------------------------------------------

/// One tide table row. `None` fields become empty cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TideRow {
    pub station_id: String,
    pub station_name: String,
    pub date: String,
    pub time: String,
    pub height: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One hourly sample row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRow {
    pub station_id: String,
    pub station_name: String,
    pub date: String,
    pub time: String,
    /// Knots.
    pub wind_speed: Option<f64>,
    pub wind_dir: Option<String>,
    pub wave_height: Option<f64>,
    pub wave_dir: Option<String>,
    /// Degrees Celsius.
    pub temp: Option<f64>,
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Tide rows for one port, with high/low decided per calendar day.
pub fn tide_rows(record: &PortRecord) -> Vec<TideRow> {
    let mut rows = Vec::with_capacity(record.tides_7d.len());

    for day in record.tides_7d.chunk_by(|a, b| a.date == b.date) {
        for (event, kind) in day.iter().zip(classify_events(day)) {
            rows.push(tide_row(record, event, kind.map(|k| k.label()).unwrap_or("")));
        }
    }
    rows
}

fn tide_row(record: &PortRecord, event: &TideEvent, kind: &str) -> TideRow {
    TideRow {
        station_id: record.id.clone(),
        station_name: record.name.clone(),
        date: format_date(event.date),
        time: format_time(event.time),
        height: event.height_m,
        kind: kind.to_string(),
    }
}

/// Wind speed in knots from a vector value such as `"3.8 kn"`.
fn knots_value(vector: &HourlyVector) -> Option<f64> {
    if vector.value.ends_with("kn") {
        to_number(&vector.value)
    } else {
        None
    }
}

/// Sample rows for one port: wind slots first, then weather slots, merged
/// so that each (date, hour) appears once, in first-seen order.
pub fn sample_rows(record: &PortRecord) -> Vec<SampleRow> {
    let mut rows: Vec<(NaiveDate, NaiveTime, SampleRow)> = Vec::new();

    let mut slot = |vector: &HourlyVector| -> usize {
        if let Some(i) = rows.iter().position(|(d, h, _)| *d == vector.date && *h == vector.hour) {
            return i;
        }
        rows.push((
            vector.date,
            vector.hour,
            SampleRow {
                station_id: record.id.clone(),
                station_name: record.name.clone(),
                date: format_date(vector.date),
                time: format_time(vector.hour),
                wind_speed: None,
                wind_dir: None,
                wave_height: None,
                wave_dir: None,
                temp: None,
            },
        ));
        rows.len() - 1
    };

    let mut updates: Vec<(usize, &HourlyVector, bool)> = Vec::new();
    for vector in &record.wind_hourly {
        updates.push((slot(vector), vector, true));
    }
    for vector in &record.weather_hourly {
        updates.push((slot(vector), vector, false));
    }

    for (i, vector, is_wind) in updates {
        let row = &mut rows[i].2;
        if is_wind {
            row.wind_speed = row.wind_speed.or(knots_value(vector));
            if row.wind_dir.is_none() {
                row.wind_dir = vector.attributes.get(ATTR_DIRECTION).cloned();
            }
        } else if row.temp.is_none() {
            row.temp = vector.attributes.get(ATTR_TEMPERATURE).and_then(|t| to_number(t));
        }
    }

    rows.into_iter().map(|(_, _, row)| row).collect()
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

pub fn write_json<W: Write>(run: &CollectionRun, mut out: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut out, run)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_tides_csv<W: Write>(run: &CollectionRun, out: W) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    let mut count = 0;
    for record in &run.ports {
        for row in tide_rows(record) {
            writer.serialize(row)?;
            count += 1;
        }
    }
    if count == 0 {
        writer.write_record(["station_id", "station_name", "date", "time", "height", "type"])?;
    }
    writer.flush()?;
    Ok(count)
}

pub fn write_samples_csv<W: Write>(run: &CollectionRun, out: W) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    let mut count = 0;
    for record in &run.ports {
        for row in sample_rows(record) {
            writer.serialize(row)?;
            count += 1;
        }
    }
    if count == 0 {
        writer.write_record([
            "station_id",
            "station_name",
            "date",
            "time",
            "wind_speed",
            "wind_dir",
            "wave_height",
            "wave_dir",
            "temp",
        ])?;
    }
    writer.flush()?;
    Ok(count)
}

/// Creates `path` and hands it to one of the writers above.
pub fn export_to_file<T>(
    path: &Path,
    write: impl FnOnce(File) -> Result<T, ExportError>,
) -> Result<T, ExportError> {
    let file = File::create(path)?;
    let result = write(file)?;
    logging::info(LogSource::Export, None, &format!("Wrote {}", path.display()));
    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
