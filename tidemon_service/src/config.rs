/// Configuration file loading.
///
/// Everything is optional: a missing default file yields the built-in
/// settings and port list. The file location comes from `--config`, then
/// `TIDEMON_CONFIG` (a `.env` file is honoured), then `tidemon.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::collect::CollectorSettings;
use crate::ingest::fetch::{DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT};
use crate::logging::LogLevel;
use crate::model::ConfigError;
use crate::parse::dates::RolloverPolicy;
use crate::parse::hourly::DEFAULT_LOOKAHEAD;
use crate::ports::{Port, PortRegistry, default_registry};

pub const DEFAULT_CONFIG_FILE: &str = "tidemon.toml";
pub const CONFIG_ENV_VAR: &str = "TIDEMON_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub timeout_secs: u64,
    pub request_spacing_ms: u64,
    pub workers: usize,
    pub min_tide_events: usize,
    pub lookahead_lines: usize,
    pub rollover: String,
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            timeout_secs: 20,
            request_spacing_ms: 700,
            workers: 1,
            min_tide_events: 4,
            lookahead_lines: DEFAULT_LOOKAHEAD,
            rollover: "early-months".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub logging: LoggingConfig,
    pub ports: Vec<Port>,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads a config file. When `required` is false a missing file gives
    /// the defaults.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::Io(format!("{}: {}", path.display(), e))),
        }
    }

    /// Port list from `[[ports]]`, or the built-in registry when none given.
    pub fn registry(&self) -> Result<PortRegistry, ConfigError> {
        if self.ports.is_empty() {
            Ok(default_registry())
        } else {
            PortRegistry::new(self.ports.clone())
        }
    }

    pub fn collector_settings(&self) -> Result<CollectorSettings, ConfigError> {
        let c = &self.collector;
        let rollover = RolloverPolicy::from_name(&c.rollover).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "collector.rollover must be \"early-months\" or \"disabled\", got \"{}\"",
                c.rollover
            ))
        })?;
        if c.lookahead_lines == 0 {
            return Err(ConfigError::Invalid("collector.lookahead_lines must be at least 1".to_string()));
        }

        Ok(CollectorSettings {
            workers: c.workers,
            request_spacing: Duration::from_millis(c.request_spacing_ms),
            min_tide_events: c.min_tide_events,
            lookahead: c.lookahead_lines,
            rollover,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.collector.timeout_secs)
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::from_name(&self.logging.level)
            .ok_or_else(|| ConfigError::Invalid(format!("unknown logging.level \"{}\"", self.logging.level)))
    }
}

/// Resolves which config file to read and whether it must exist.
///
/// An explicit path (flag or environment) must exist; the default file may
/// be absent.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (PathBuf, bool) {
    dotenv::dotenv().ok();

    if let Some(path) = cli_path {
        return (path.to_path_buf(), true);
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
        _ => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    }
}

/// Loads the config named by `--config`, `TIDEMON_CONFIG` or the default.
pub fn load_config(cli_path: Option<&Path>) -> Result<Config, ConfigError> {
    let (path, required) = resolve_config_path(cli_path);
    Config::load(&path, required)
}
