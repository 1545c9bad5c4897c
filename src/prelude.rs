//! Prelude module for Seismic Fetcher Library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use seismic_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use seismic_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let client = Arc::new(FdsnClient::new(&config.service.fdsn_base_url, &config.client)?);
//!     let downloader = Arc::new(FdsnWaveformDownloader::new(client.clone()));
//!
//!     let mut orchestrator = DayOrchestrator::new(
//!         config.acquisition_config(),
//!         config.layout(),
//!         client.clone(),
//!         client,
//!         downloader,
//!     )
//!     .await?;
//!     let report = orchestrator
//!         .run(config.archive.start_date, config.archive.end_date)
//!         .await?;
//!     println!("{:?}", report.outcome);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components that are used in most integrations
pub use crate::app::{
    AcquisitionConfig,
    ArchiveLayout,
    ClientConfig,
    // Core orchestration
    DayOrchestrator,
    Day,
    DownloadPolicy,
    // Event-window acquisition
    EventArchiver,
    EventWindowConfig,
    FdsnClient,
    FdsnWaveformDownloader,
    RegionConfig,
    RunOutcome,
    RunReport,
    StationCatalog,
    StationKey,
    StationQualifier,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_RATE_LIMIT_RPS, DEFAULT_WORKER_COUNT, FDSN_BASE_URL, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
