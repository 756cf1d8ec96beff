//! Configuration loading and service URL resolution
//!
//! Two layers:
//! 1. **TOML file**: service URL, logging, progress estimator and HTTP tuning
//! 2. **Resolved client config**: the values the controller actually runs with,
//!    computed once at start-up
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--service-url`, `--config`)
//! 2. Environment variables (`VIDSUM_SERVICE_URL`, `VIDSUM_CONFIG`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing or malformed TOML file is never fatal: defaults are used and the
//! outcome is reported as a `ConfigSource`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Service location used when nothing else is configured
pub const DEFAULT_SERVICE_BASE_URL: &str = "http://localhost:5100";

/// Environment variable overriding the service base URL
pub const SERVICE_URL_ENV: &str = "VIDSUM_SERVICE_URL";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "VIDSUM_CONFIG";

/// Configuration as stored in `config.toml`
///
/// Every field is optional in the file; absent sections fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the summary service (e.g. `http://localhost:5100`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_base_url: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Synthetic progress tuning for the server-processing phase
    #[serde(default)]
    pub progress: ProgressConfig,

    /// HTTP client tuning
    #[serde(default)]
    pub http: HttpConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Progress estimator settings
///
/// Upload progress fills `0..=floor`; the estimator then creeps from `floor`
/// towards `ceiling` one point per tick. 100 is reserved for a confirmed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Milliseconds between estimator ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Progress value at the end of the upload phase
    #[serde(default = "default_floor")]
    pub floor: u8,

    /// Highest value the estimator may report
    #[serde(default = "default_ceiling")]
    pub ceiling: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            floor: default_floor(),
            ceiling: default_ceiling(),
        }
    }
}

impl ProgressConfig {
    /// Tick period as a `Duration`
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Reject settings that would break progress monotonicity or claim completion
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config(
                "progress.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.floor == 0 || self.floor >= self.ceiling {
            return Err(Error::Config(format!(
                "progress.floor ({}) must be between 1 and progress.ceiling ({})",
                self.floor, self.ceiling
            )));
        }
        if self.ceiling >= 100 {
            return Err(Error::Config(format!(
                "progress.ceiling ({}) must stay below 100",
                self.ceiling
            )));
        }
        Ok(())
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Optional timeout for the result fetch; unset means wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_floor() -> u8 {
    70
}

fn default_ceiling() -> u8 {
    95
}

fn default_user_agent() -> String {
    concat!("vidsum/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Values the client runs with, resolved once at start-up
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Normalized base URL (no trailing slash)
    pub service_base_url: String,
    pub progress: ProgressConfig,
    pub http: HttpConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_base_url: DEFAULT_SERVICE_BASE_URL.to_string(),
            progress: ProgressConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Resolve the client configuration from CLI, environment and TOML
    pub fn resolve(cli_service_url: Option<&str>, toml_config: &TomlConfig) -> Result<Self> {
        toml_config.progress.validate()?;

        Ok(Self {
            service_base_url: resolve_service_base_url(cli_service_url, toml_config)?,
            progress: toml_config.progress,
            http: toml_config.http.clone(),
        })
    }

    /// Configuration pointing at an explicit base URL with default tuning
    pub fn for_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            service_base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }
}

/// Service base URL resolution:
/// 1. Command-line argument (highest priority)
/// 2. `VIDSUM_SERVICE_URL` environment variable
/// 3. TOML `service_base_url`
/// 4. Compiled default
pub fn resolve_service_base_url(
    cli_arg: Option<&str>,
    toml_config: &TomlConfig,
) -> Result<String> {
    // Priority 1: Command-line argument
    if let Some(url) = cli_arg {
        info!("Service URL from command line: {}", url);
        return normalize_base_url(url);
    }

    // Priority 2: Environment variable
    if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
        if !url.trim().is_empty() {
            info!("Service URL from {}: {}", SERVICE_URL_ENV, url);
            return normalize_base_url(&url);
        }
    }

    // Priority 3: TOML config file
    if let Some(url) = toml_config.service_base_url.as_deref() {
        info!("Service URL from config file: {}", url);
        return normalize_base_url(url);
    }

    // Priority 4: Compiled default
    Ok(DEFAULT_SERVICE_BASE_URL.to_string())
}

/// Trim whitespace and trailing slashes, require an http(s) scheme
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');

    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            Error::Config(format!(
                "Service URL must start with http:// or https://: {:?}",
                raw
            ))
        })?;

    if rest.is_empty() {
        return Err(Error::Config(format!("Service URL has no host: {:?}", raw)));
    }

    Ok(trimmed.to_string())
}

/// Platform config file location: `<config_dir>/vidsum/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vidsum").join("config.toml"))
}

/// Config file path: command line, then `VIDSUM_CONFIG`, then platform default
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the start-up config came from
///
/// Loading happens before the tracing subscriber exists, so the outcome is
/// returned and logged with `log()` once it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    Loaded(PathBuf),
    /// No file at this path; defaults in use
    Missing(PathBuf),
    /// The platform has no config directory; defaults in use
    NoConfigDir,
    /// Unreadable or malformed file; defaults in use
    Invalid { path: PathBuf, error: String },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::Loaded(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::Missing(path) => {
                info!("Config file not found at {}, using defaults", path.display())
            }
            ConfigSource::NoConfigDir => {
                warn!("No config directory available on this platform, using defaults")
            }
            ConfigSource::Invalid { error, .. } => warn!("{} (using defaults)", error),
        }
    }
}

/// Load the config file if present, falling back to defaults
///
/// Never fails: a missing file is expected on first run, and an unreadable
/// or malformed file is reported through the returned `ConfigSource`.
pub fn load_toml_config_or_default(path: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let Some(path) = path else {
        return (TomlConfig::default(), ConfigSource::NoConfigDir);
    };

    if !path.exists() {
        return (TomlConfig::default(), ConfigSource::Missing(path.to_path_buf()));
    }

    match load_toml_config(path) {
        Ok(config) => (config, ConfigSource::Loaded(path.to_path_buf())),
        Err(e) => (
            TomlConfig::default(),
            ConfigSource::Invalid {
                path: path.to_path_buf(),
                error: e.to_string(),
            },
        ),
    }
}

/// Write a config file, creating parent directories
///
/// Writes to a sibling temp file first and renames it into place so a reader
/// never observes a half-written file.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_defaults_match_upload_split() {
        let progress = ProgressConfig::default();
        assert_eq!(progress.floor, 70);
        assert_eq!(progress.ceiling, 95);
        assert_eq!(progress.tick_interval(), Duration::from_millis(500));
        assert!(progress.validate().is_ok());
    }

    #[test]
    fn test_progress_validation_rejects_bad_bounds() {
        let zero_tick = ProgressConfig {
            tick_interval_ms: 0,
            ..ProgressConfig::default()
        };
        assert!(zero_tick.validate().is_err());

        let inverted = ProgressConfig {
            floor: 96,
            ceiling: 95,
            ..ProgressConfig::default()
        };
        assert!(inverted.validate().is_err());

        let claims_completion = ProgressConfig {
            ceiling: 100,
            ..ProgressConfig::default()
        };
        assert!(claims_completion.validate().is_err());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(" http://localhost:5100/ ").unwrap(),
            "http://localhost:5100"
        );
        assert_eq!(
            normalize_base_url("https://summaries.example.com/").unwrap(),
            "https://summaries.example.com"
        );
        assert!(normalize_base_url("localhost:5100").is_err());
        assert!(normalize_base_url("http://").is_err());
    }

    #[test]
    fn test_empty_toml_parses_to_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.logging.level, "info");
        assert!(config.http.fetch_timeout().is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            service_base_url = "http://10.0.0.5:5100"

            [progress]
            tick_interval_ms = 250

            [http]
            fetch_timeout_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.service_base_url.as_deref(), Some("http://10.0.0.5:5100"));
        assert_eq!(config.progress.tick_interval_ms, 250);
        assert_eq!(config.progress.floor, 70);
        assert_eq!(config.progress.ceiling, 95);
        assert_eq!(config.http.fetch_timeout(), Some(Duration::from_secs(600)));
        assert!(config.http.user_agent.starts_with("vidsum/"));
    }
}
