//! Core application logic for Seismic Fetcher
//!
//! This module contains the acquisition core and its collaborators: the
//! FDSN HTTP client and waveform downloader, the data models, the station
//! catalog, the archive storage layer, the day orchestrator and the
//! event-window archiver.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use seismic_fetcher::app::{ClientConfig, FdsnClient, RegionConfig, StationQualifier};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(FdsnClient::new("https://eida.gein.noa.gr", &ClientConfig::default())?);
//! let qualifier = StationQualifier::new(client, RegionConfig::default());
//!
//! let day = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
//! let qualified = qualifier.qualify(day).await?;
//! for station in &qualified.stations {
//!     println!("{} at {:.3}, {:.3}", station.key, station.latitude, station.longitude);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod coordinator;
pub mod event;
pub mod event_window;
pub mod inventory;
pub mod models;
pub mod qualifier;
pub mod services;
pub mod storage;
pub mod waveform;

// Re-export main public API
pub use catalog::{StationCatalog, StationCatalogEntry};
pub use client::{ClientConfig, FdsnClient};
pub use coordinator::{
    AcquisitionConfig, CompletionOracle, DayOrchestrator, DayState, DownloadPolicy, RegionConfig,
    ResumeLocator, RunOutcome, RunReport, RunState,
};
pub use event::{EventCatalog, EventSummary};
pub use event_window::{EventArchiver, EventWindowConfig, EventWindowReport};
pub use inventory::Inventory;
pub use models::{Day, GeoPoint, QualifiedStation, StationKey, TimeWindow};
pub use qualifier::{QualifiedDay, StationQualifier};
pub use services::{EventService, StationService, WaveformDownloader};
pub use storage::{AcquisitionJournal, ArchiveLayout, DoneFlag, EventArchiveLayout};
pub use waveform::FdsnWaveformDownloader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Ensure public API is accessible
        let config = ClientConfig::default();
        assert!(config.tcp_nodelay);
        assert_eq!(AcquisitionConfig::default().region.channel_pattern, "HH*");
    }
}
