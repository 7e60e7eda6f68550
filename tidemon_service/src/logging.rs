/// Structured logging for the port collector
///
/// Provides context-rich logging with port identifiers, timestamps, and
/// severity levels. Supports both console output and file-based logging
/// for scheduled runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{FetchError, Stage};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses the config spelling (`"debug"`, `"info"`, `"warn"`, `"error"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Tides,
    Weather,
    Wind,
    Parser,
    Registry,
    Export,
    System,
}

impl From<Stage> for LogSource {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Tides => LogSource::Tides,
            Stage::Weather => LogSource::Weather,
            Stage::Wind => LogSource::Wind,
            Stage::Sanity => LogSource::Parser,
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Tides => write!(f, "TIDES"),
            LogSource::Weather => write!(f, "WEATHER"),
            LogSource::Wind => write!(f, "WIND"),
            LogSource::Parser => write!(f, "PARSE"),
            LogSource::Registry => write!(f, "PORTS"),
            LogSource::Export => write!(f, "EXPORT"),
            LogSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the port has no page of this kind on the site
    Expected,
    /// Unexpected failure - site degradation, network trouble or throttling
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: LogSource, port_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let port_part = port_id.map(|p| format!(" [{}]", p)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, port_part, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, port_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, port_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn dispatch(level: LogLevel, source: LogSource, port_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, port_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: LogSource, port_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, source, port_id, message);
}

/// Log a warning message
pub fn warn(source: LogSource, port_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, source, port_id, message);
}

/// Log an error message
pub fn error(source: LogSource, port_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, source, port_id, message);
}

/// Log a debug message
pub fn debug(source: LogSource, port_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, source, port_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a page fetch failure.
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // Not every port has every forecast page
        FetchError::HttpError(404) | FetchError::HttpError(410) => FailureType::Expected,
        // Throttled or server trouble
        FetchError::HttpError(429) => FailureType::Unexpected,
        FetchError::HttpError(code) if *code >= 500 => FailureType::Unexpected,
        FetchError::Timeout(_) | FetchError::Transport(_) => FailureType::Unexpected,
        _ => FailureType::Unknown,
    }
}

/// Log a stage fetch failure with automatic classification
pub fn log_stage_failure(stage: Stage, port_id: &str, url: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    let message = format!("{} failed [{}]: {} ({})", stage, failure_type, err, url);

    match failure_type {
        FailureType::Expected => debug(stage.into(), Some(port_id), &message),
        FailureType::Unexpected => error(stage.into(), Some(port_id), &message),
        FailureType::Unknown => warn(stage.into(), Some(port_id), &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a collection run
pub fn log_run_summary(total: usize, complete: usize, degraded: usize) {
    let message = format!(
        "Collection complete: {}/{} ports complete, {} degraded",
        complete, total, degraded
    );

    if degraded == 0 {
        info(LogSource::System, None, &message);
    } else if complete == 0 {
        error(LogSource::System, None, &message);
    } else {
        warn(LogSource::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::from_name("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_name("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_name("verbose"), None);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_fetch_failure(&FetchError::HttpError(404)), FailureType::Expected);
        assert_eq!(classify_fetch_failure(&FetchError::HttpError(503)), FailureType::Unexpected);
        assert_eq!(classify_fetch_failure(&FetchError::HttpError(429)), FailureType::Unexpected);
        assert_eq!(
            classify_fetch_failure(&FetchError::Timeout("20s".into())),
            FailureType::Unexpected
        );
        assert_eq!(classify_fetch_failure(&FetchError::HttpError(403)), FailureType::Unknown);
        assert_eq!(classify_fetch_failure(&FetchError::Body("bad utf-8".into())), FailureType::Unknown);
    }

    #[test]
    fn test_stage_maps_to_log_source() {
        assert_eq!(LogSource::from(Stage::Wind), LogSource::Wind);
        assert_eq!(LogSource::from(Stage::Sanity), LogSource::Parser);
    }
}
