//! Configuration management for Seismic Fetcher
//!
//! This module provides unified configuration management with multi-source
//! loading and zero-config defaults. Sources are applied in order: built-in
//! defaults, a TOML file, environment variables and finally CLI flags.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{
    AcquisitionConfig, ArchiveLayout, ClientConfig, DownloadPolicy, EventArchiveLayout,
    EventWindowConfig, RegionConfig,
};
use crate::constants::{archive, env, events, fdsn, logging, region};
use crate::errors::{AppError, ConfigError, Result};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Archive location and acquisition range
    pub archive: ArchiveConfig,
    /// Acquisition region and channel requirements
    pub region: RegionConfig,
    /// Remote service settings
    pub service: ServiceConfig,
    /// Waveform download policy
    pub download: DownloadPolicy,
    /// Event-window acquisition
    pub events: EventWindowConfig,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Archive root and the inclusive day range to acquire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub root: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Root directory of the event-window archive
    pub events_root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(archive::DEFAULT_ROOT),
            start_date: parse_default_date(archive::DEFAULT_START_DATE),
            end_date: parse_default_date(archive::DEFAULT_END_DATE),
            events_root: PathBuf::from(events::DEFAULT_ROOT),
        }
    }
}

fn parse_default_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_default()
}

/// FDSN data centre settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the FDSN data centre
    pub fdsn_base_url: String,
    /// Capture the event catalog of each acquired day
    pub capture_events: bool,
    /// Base URL of the event catalog used by event-window acquisition
    pub event_catalog_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            fdsn_base_url: fdsn::DEFAULT_BASE_URL.to_string(),
            capture_events: true,
            event_catalog_url: events::SERVICE_URL.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI flags are applied by the caller on the returned value.
    pub async fn load(config_file_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path }.into());
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(env::ARCHIVE_ROOT).filter(|v| !v.trim().is_empty()) {
            debug!("Archive root overridden by {}", env::ARCHIVE_ROOT);
            self.archive.root = PathBuf::from(root);
        }
        if let Some(url) = lookup(env::FDSN_URL).filter(|v| !v.trim().is_empty()) {
            debug!("FDSN base URL overridden by {}", env::FDSN_URL);
            self.service.fdsn_base_url = url;
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` listing every problem found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.archive.start_date > self.archive.end_date {
            errors.push(format!(
                "Start date {} is after end date {}",
                self.archive.start_date, self.archive.end_date
            ));
        }
        if self.archive.root.as_os_str().is_empty() {
            errors.push("Archive root cannot be empty".to_string());
        }
        if url::Url::parse(&self.service.fdsn_base_url).is_err() {
            errors.push(format!("Invalid FDSN base URL: {}", self.service.fdsn_base_url));
        }
        if url::Url::parse(&self.service.event_catalog_url).is_err() {
            errors.push(format!(
                "Invalid event catalog URL: {}",
                self.service.event_catalog_url
            ));
        }
        if let Err(e) = self.region.validate() {
            errors.push(e);
        }
        if let Err(e) = self.download.validate() {
            errors.push(e);
        }
        if let Err(e) = self.events.validate() {
            errors.push(e);
        }
        if self.client.rate_limit_rps == 0 {
            errors.push("Rate limit must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Runtime configuration of the day orchestrator
    pub fn acquisition_config(&self) -> AcquisitionConfig {
        AcquisitionConfig::new(self.region.clone(), self.download.clone())
            .with_event_capture(self.service.capture_events)
    }

    /// Storage layout of the configured archive
    pub fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(&self.archive.root)
    }

    /// Storage layout of the event-window archive
    pub fn event_layout(&self) -> EventArchiveLayout {
        EventArchiveLayout::new(&self.archive.events_root)
    }

    /// Serialize the effective configuration as TOML
    pub fn to_toml(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write a commented default config file to `path`
    ///
    /// Fails if the file already exists unless `force` is set.
    pub async fn initialize(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::generic(format!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;

        info!("Wrote default configuration to {}", path.display());
        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(archive::LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.exists());
        if let Some(path) = &found {
            debug!("Found config file: {}", path.display());
        }
        found
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(archive::CONFIG_DIR_NAME)
                .join(archive::CONFIG_FILE_NAME)
        })
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::from)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# Seismic Fetcher Configuration
# Every setting is optional; missing values fall back to the defaults below.

[archive]
# Root directory of the waveform archive
root = "{root}"
# Inclusive day range to acquire
start_date = "{start}"
end_date = "{end}"
# Root directory of the event-window archive (`events` command)
events_root = "{events_root}"

[region]
reference_latitude = {lat}
reference_longitude = {lon}
# Station search radius around the reference point, in degrees
station_radius_deg = {radius}
networks = ["HL", "HA", "HC"]
# A station qualifies only if it exposes every one of these channels
required_channels = ["HHN", "HHE", "HHZ"]
channel_pattern = "{pattern}"
min_event_magnitude = {magnitude:.1}

[service]
fdsn_base_url = "{base_url}"
# Save the event catalog of each acquired day under EventsInfo/
capture_events = true
# Event catalog queried by the `events` command
event_catalog_url = "{event_url}"

[download]
reject_channels_with_gaps = true
# Minimum covered fraction of the day, in (0, 1]
minimum_length = 0.95
# Concurrent channel requests per station
worker_count = 3

[events]
# Events are searched around the reference point, stations around each epicentre
reference_latitude = {lat}
reference_longitude = {lon}
event_radius_km = {event_radius:.1}
station_radius_km = {station_radius:.1}
min_magnitude = {min_mag:.1}
max_magnitude = {max_mag:.1}
# Waveform window around the origin time
pre_event = "30s"
post_event = "3m"
channel_pattern = "{pattern}"
reject_channels_with_gaps = true
minimum_length = 0.9
worker_count = 3

[client]
request_timeout = "2m"
connect_timeout = "30s"
rate_limit_rps = 5
max_retries = 3
retry_base_delay = "1s"

[logging]
level = "info"  # error, warn, info, debug, trace
"#,
            root = archive::DEFAULT_ROOT,
            start = archive::DEFAULT_START_DATE,
            end = archive::DEFAULT_END_DATE,
            lat = region::REF_LATITUDE,
            lon = region::REF_LONGITUDE,
            radius = region::STATION_RADIUS_DEG,
            pattern = region::CHANNEL_PATTERN,
            magnitude = region::MIN_EVENT_MAGNITUDE,
            base_url = fdsn::DEFAULT_BASE_URL,
            events_root = events::DEFAULT_ROOT,
            event_url = events::SERVICE_URL,
            event_radius = events::EVENT_RADIUS_KM,
            station_radius = events::STATION_RADIUS_KM,
            min_mag = events::MIN_MAGNITUDE,
            max_mag = events::MAX_MAGNITUDE,
        )
    }
}
