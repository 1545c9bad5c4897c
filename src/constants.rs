//! Application constants for Seismic Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the archive root directory
    pub const ARCHIVE_ROOT: &str = "SEISMIC_FETCHER_ROOT";

    /// Overrides the FDSN service base URL
    pub const FDSN_URL: &str = "SEISMIC_FETCHER_FDSN_URL";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Seismic-Fetcher/0.1.0 (Seismology Research Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default rate limit for FDSN requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for throttled or overloaded requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// FDSN web service endpoints and query defaults
pub mod fdsn {
    /// Default FDSN data centre (NOA EIDA node)
    pub const DEFAULT_BASE_URL: &str = "https://eida.gein.noa.gr";

    /// Station service query path
    pub const STATION_PATH: &str = "fdsnws/station/1/query";

    /// Event service query path
    pub const EVENT_PATH: &str = "fdsnws/event/1/query";

    /// Dataselect (waveform) service query path
    pub const DATASELECT_PATH: &str = "fdsnws/dataselect/1/query";

    /// Timestamp format accepted by every FDSN service
    pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
}

/// Acquisition region and channel policy defaults
pub mod region {
    /// Reference latitude (Santorini)
    pub const REF_LATITUDE: f64 = 36.618712;

    /// Reference longitude (Santorini)
    pub const REF_LONGITUDE: f64 = 25.682873;

    /// Station search radius in degrees
    pub const STATION_RADIUS_DEG: f64 = 1.82;

    /// Networks queried for stations
    pub const NETWORKS: &[&str] = &["HL", "HA", "HC"];

    /// Channels a station must expose to qualify
    pub const REQUIRED_CHANNELS: &[&str] = &["HHN", "HHE", "HHZ"];

    /// Channel pattern handed to the waveform downloader
    pub const CHANNEL_PATTERN: &str = "HH*";

    /// Minimum magnitude for the per-day event catalog
    pub const MIN_EVENT_MAGNITUDE: f64 = 0.0;
}

/// Waveform download policy defaults
pub mod download {
    /// Concurrent channel downloads per station request
    pub const DEFAULT_WORKER_COUNT: usize = 3;

    /// Minimum covered fraction of the requested window
    pub const MINIMUM_LENGTH: f64 = 0.95;

    /// Reject channels whose data contains gaps
    pub const REJECT_CHANNELS_WITH_GAPS: bool = true;

    /// Length of one acquisition day in seconds
    pub const DAY_SECONDS: i64 = 86_400;
}

/// Archive layout names
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Per station/day completion marker
    pub const DONE_FLAG: &str = "DONE.flag";

    /// Directory holding the global station catalog
    pub const STATIONS_DIR: &str = "Stations";

    /// Catalog record file
    pub const CATALOG_RECORDS: &str = "Stations_All.json";

    /// Merged inventory document
    pub const CATALOG_INVENTORY: &str = "Stations_All.inventory.json";

    /// Directory holding the append-only journals
    pub const LOGS_DIR: &str = "logs";

    /// Acquisition journal
    pub const ACQUISITION_LOG: &str = "acquisitionLogs.log";

    /// Error journal
    pub const ERRORS_LOG: &str = "acquisitionErrors.log";

    /// Per-day event metadata directory
    pub const EVENTS_DIR: &str = "EventsInfo";

    /// Per-day event summary
    pub const EVENT_SUMMARY: &str = "method.json";

    /// Extension of stored QuakeML documents
    pub const EVENT_DOCUMENT_EXTENSION: &str = "xml";

    /// Waveform file extension
    pub const WAVEFORM_EXTENSION: &str = "mseed";

    /// Day directory name format
    pub const DAY_FORMAT: &str = "%Y-%m-%d";
}

/// Event-window acquisition defaults
pub mod events {
    use super::Duration;

    /// Default root of the event-window archive
    pub const DEFAULT_ROOT: &str = "./seismic-events";

    /// Default event catalog provider (EMSC)
    pub const SERVICE_URL: &str = "https://www.seismicportal.eu";

    /// Event search radius around the reference point, in kilometres
    pub const EVENT_RADIUS_KM: f64 = 50.0;

    /// Station search radius around each epicentre, in kilometres
    pub const STATION_RADIUS_KM: f64 = 50.0;

    /// Kilometres per degree of great-circle arc
    pub const KM_PER_DEGREE: f64 = 111.19;

    pub const MIN_MAGNITUDE: f64 = 3.0;

    pub const MAX_MAGNITUDE: f64 = 10.0;

    /// Waveform window start, before the origin time
    pub const PRE_EVENT: Duration = Duration::from_secs(30);

    /// Waveform window end, after the origin time
    pub const POST_EVENT: Duration = Duration::from_secs(180);

    /// Minimum covered fraction of the event window
    pub const MINIMUM_LENGTH: f64 = 0.9;

    /// Per-event description file
    pub const INFO_FILE: &str = "info.txt";

    /// Waveform subdirectory of each station in an event
    pub const WAVEFORM_DIR: &str = "mseed";

    /// Time part of an event directory name
    pub const LABEL_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
}

/// Archive and configuration file defaults
pub mod archive {
    /// Default archive root
    pub const DEFAULT_ROOT: &str = "./seismic-archive";

    /// Default first day of the acquisition range
    pub const DEFAULT_START_DATE: &str = "2012-01-01";

    /// Default last day of the acquisition range
    pub const DEFAULT_END_DATE: &str = "2012-12-31";

    /// Project-local configuration file
    pub const LOCAL_CONFIG_FILE: &str = "seismic-fetcher.toml";

    /// Directory of the user configuration file
    pub const CONFIG_DIR_NAME: &str = "seismic-fetcher";

    /// User configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Logging constants
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use download::DEFAULT_WORKER_COUNT;
pub use fdsn::DEFAULT_BASE_URL as FDSN_BASE_URL;
pub use files::{DONE_FLAG, TEMP_FILE_SUFFIX};
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
