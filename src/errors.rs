//! Error types for Seismic Fetcher
//!
//! This module defines the error taxonomy for every component of the
//! acquisition run. The split that matters most is between
//! [`ServiceError::Unavailable`], which halts the whole run, and everything
//! else, which is recorded per station or per day and retried on the next
//! invocation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the remote FDSN services (station and event queries)
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The service cannot be reached or answered with a gateway-level failure
    #[error("FDSN service unavailable: {reason}")]
    Unavailable { reason: String },

    /// The service answered but the query was rejected or failed server side
    #[error("FDSN query failed (HTTP {status}): {reason}")]
    QueryFailed { status: u16, reason: String },

    /// The response document could not be interpreted
    #[error("Malformed FDSN document: {reason}")]
    Parse { reason: String },

    /// The service URL could not be built
    #[error("Invalid service URL: {url}")]
    InvalidUrl { url: String },
}

impl ServiceError {
    /// Whether this error means the remote service itself is down
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServiceError::Unavailable { .. })
    }

    /// Classify a transport-level reqwest failure
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() || error.is_request() {
            ServiceError::Unavailable {
                reason: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), error.to_string())
        } else {
            ServiceError::Unavailable {
                reason: error.to_string(),
            }
        }
    }

    /// Classify an unsuccessful HTTP status code
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        match status {
            502..=504 => ServiceError::Unavailable {
                reason: format!("HTTP {}: {}", status, reason.into()),
            },
            _ => ServiceError::QueryFailed {
                status,
                reason: reason.into(),
            },
        }
    }
}

/// Waveform download errors (per-station, never fatal to the run)
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The dataselect service failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Waveform or metadata files could not be stored
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The station inventory offers no channel matching the requested pattern
    #[error("No channel of {station} matches pattern {pattern}")]
    NoMatchingChannels { station: String, pattern: String },

    /// The station lies outside the requested domain
    #[error("Station {station} lies outside the requested domain")]
    OutsideDomain { station: String },

    /// A returned miniSEED stream could not be read
    #[error("Invalid miniSEED data: {0}")]
    InvalidWaveform(String),

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}

/// Archive storage errors (directories, flags, journals)
#[derive(Error, Debug)]
pub enum StorageError {
    /// Directory could not be created
    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be written
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of a stored document failed
    #[error("Cannot serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Station catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Underlying storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored inventory document is not valid
    #[error("Inventory document corrupted at {path}: {source}")]
    CorruptInventory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote service error
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Waveform download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Catalog error
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error must terminate the whole acquisition run
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Service(e) if e.is_fatal())
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Service(_) => "service",
            AppError::Download(_) => "download",
            AppError::Storage(_) => "storage",
            AppError::Catalog(_) => "catalog",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Service result type alias
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Catalog result type alias
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
