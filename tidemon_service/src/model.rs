/// Core data types for the port tide and weather collector.
///
/// This module defines the shared domain model imported by all other modules:
/// tide events, hourly vectors, per-port records and the error types that
/// travel with them. It contains no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page paths
// ---------------------------------------------------------------------------

/// Sub-path of the tide forecast page, relative to a port's base URL.
pub const PATH_TIDES: &str = "previsao/mares";

/// Sub-path of the hourly weather forecast page.
pub const PATH_WEATHER: &str = "previsao/tempo";

/// Sub-path of the hourly wind forecast page.
pub const PATH_WIND: &str = "previsao/vento";

// ---------------------------------------------------------------------------
// Clock time serialization
// ---------------------------------------------------------------------------

/// Serializes a `NaiveTime` as `HH:MM`, the way the forecast pages publish
/// times. Deserialization also accepts `H:MM` and `HH:MM:SS`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_clock(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid clock time '{}'", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                None => Ok(None),
                Some(raw) => crate::model::parse_clock(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid clock time '{}'", raw))),
            }
        }
    }
}

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS` into a clock time.
///
/// Returns `None` for out-of-range values such as `24:00` or `7:60`.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single published tide reading for one calendar date.
///
/// Heights are datum-relative and may be negative. Both height and
/// coefficient are optional because some layouts omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub height_m: Option<f64>,
    pub coefficient: Option<u32>,
}

/// One hourly observation slot from the weather or wind page.
///
/// `value` holds condition text ("Céu limpo"), a speed in knots ("3.8 kn")
/// or is empty when only auxiliary attributes were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyVector {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub hour: NaiveTime,
    pub value: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Attribute key for the wind direction code (`"WSW"`).
pub const ATTR_DIRECTION: &str = "direction";

/// Attribute key for the raw speed token as published (`"7 km/h"`).
pub const ATTR_SPEED_KMH: &str = "speed_kmh";

/// Attribute key for the air temperature in degrees Celsius.
pub const ATTR_TEMPERATURE: &str = "temperature_c";

// ---------------------------------------------------------------------------
// Derived tide views
// ---------------------------------------------------------------------------

/// High or low water, decided from neighbouring heights rather than markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    #[serde(rename = "preia-mar")]
    High,
    #[serde(rename = "baixa-mar")]
    Low,
}

impl TideKind {
    /// Label used in the tabular export.
    pub fn label(&self) -> &'static str {
        match self {
            TideKind::High => "preia-mar",
            TideKind::Low => "baixa-mar",
        }
    }
}

/// Spread of the tidal coefficients published for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientSummary {
    pub min: u32,
    pub max: u32,
    pub mean: f64,
}

/// All tide information gathered for one port on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTideSummary {
    pub location: String,
    pub date: NaiveDate,
    pub events: Vec<TideEvent>,
    pub coefficient: Option<CoefficientSummary>,
    #[serde(with = "hhmm::option", default)]
    pub sunrise: Option<NaiveTime>,
    #[serde(with = "hhmm::option", default)]
    pub sunset: Option<NaiveTime>,
}

// ---------------------------------------------------------------------------
// Per-port records
// ---------------------------------------------------------------------------

/// The three independently collected data categories, plus the post-run
/// sanity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Tides,
    Weather,
    Wind,
    Sanity,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Tides => write!(f, "tides"),
            Stage::Weather => write!(f, "weather"),
            Stage::Wind => write!(f, "wind"),
            Stage::Sanity => write!(f, "sanity"),
        }
    }
}

/// Whether a diagnostic cost the stage its data or only lowers confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A non-fatal diagnostic attached to a port record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub severity: Severity,
    /// URL of the page involved, when the diagnostic concerns one.
    pub source: Option<String>,
    pub message: String,
}

impl StageError {
    pub fn failed(stage: Stage, source: &str, message: impl Into<String>) -> Self {
        StageError {
            stage,
            severity: Severity::Error,
            source: Some(source.to_string()),
            message: message.into(),
        }
    }

    pub fn warning(stage: Stage, source: Option<&str>, message: impl Into<String>) -> Self {
        StageError {
            stage,
            severity: Severity::Warning,
            source: source.map(String::from),
            message: message.into(),
        }
    }
}

/// Everything collected for one port during one run.
///
/// Always produced, even when every stage failed: the stage outputs are
/// then empty and `errors` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: String,
    pub name: String,
    pub base_locator: String,
    pub fetched_at: DateTime<Utc>,
    pub tides_7d: Vec<TideEvent>,
    #[serde(default)]
    pub tide_days: Vec<DailyTideSummary>,
    pub weather_hourly: Vec<HourlyVector>,
    pub wind_hourly: Vec<HourlyVector>,
    pub errors: Vec<StageError>,
}

impl PortRecord {
    /// True when at least one diagnostic of error severity was recorded.
    pub fn is_degraded(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn errors_for(&self, stage: Stage) -> impl Iterator<Item = &StageError> {
        self.errors.iter().filter(move |e| e.stage == stage)
    }
}

/// Output of a full run: one record per registry port, in registry order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRun {
    pub started_at: DateTime<Utc>,
    pub ports: Vec<PortRecord>,
}

impl CollectionRun {
    pub fn find(&self, id: &str) -> Option<&PortRecord> {
        self.ports.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching a forecast page.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response.
    HttpError(u16),
    /// The request exceeded the per-request timeout.
    Timeout(String),
    /// Connection, DNS or TLS failure before a response arrived.
    Transport(String),
    /// A response arrived but its body could not be read as text.
    Body(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FetchError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Body(msg) => write!(f, "Body error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors raised while loading configuration or the port registry.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The TOML document is malformed or has wrong value types.
    Parse(String),
    /// The document parsed but describes an unusable registry or setting.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config read error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
