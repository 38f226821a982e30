//! Runtime configuration.
//!
//! Values come from environment variables with fallback to defaults;
//! command-line flags are applied on top by `main`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const SCAN_DELAY_VAR: &str = "RECEIPTS_SCAN_DELAY_MS";
pub const EXPORT_DIR_VAR: &str = "RECEIPTS_EXPORT_DIR";
pub const LOG_VAR: &str = "RECEIPTS_LOG";

const DEFAULT_SCAN_DELAY_MS: u64 = 1500;
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// How long a simulated recognition takes.
    pub scan_delay: Duration,

    /// Directory CSV reports are written into.
    pub export_dir: PathBuf,

    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scan_delay: Duration::from_millis(DEFAULT_SCAN_DELAY_MS),
            export_dir: PathBuf::from("."),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`TrackerConfig::load`] with an explicit variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scan_delay = match lookup(SCAN_DELAY_VAR) {
            Some(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(SCAN_DELAY_VAR.to_string()))?,
            ),
            None => defaults.scan_delay,
        };

        let export_dir = match lookup(EXPORT_DIR_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(EXPORT_DIR_VAR.to_string()));
            }
            Some(raw) => PathBuf::from(raw),
            None => defaults.export_dir,
        };

        let log_filter = lookup(LOG_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            scan_delay,
            export_dir,
            log_filter,
        })
    }

    pub fn with_scan_delay_ms(mut self, delay_ms: Option<u64>) -> Self {
        if let Some(ms) = delay_ms {
            self.scan_delay = Duration::from_millis(ms);
        }
        self
    }

    pub fn with_export_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.export_dir = dir;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
