//! Collaborator interfaces of the acquisition core
//!
//! The orchestrator talks to three external services: the station
//! inventory service, the event catalog service and the bulk waveform
//! downloader. Each is a trait so that runs can be driven by the FDSN HTTP
//! implementations in production and by in-memory fakes in tests.
//!
//! Errors are typed: a [`ServiceError::Unavailable`] from the station
//! service is the only condition that halts the entire run.
//!
//! [`ServiceError::Unavailable`]: crate::errors::ServiceError::Unavailable

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{DownloadResult, ServiceResult};

use super::event::EventCatalog;
use super::inventory::Inventory;
use super::models::{GeoPoint, StationKey, TimeWindow};

/// Detail level requested from the station service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Station,
    Channel,
    Response,
}

impl DetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Station => "station",
            DetailLevel::Channel => "channel",
            DetailLevel::Response => "response",
        }
    }
}

/// Station inventory query
#[derive(Debug, Clone, PartialEq)]
pub struct StationQuery {
    pub window: TimeWindow,
    pub center: GeoPoint,
    pub max_radius_deg: f64,
    pub networks: Vec<String>,
    pub level: DetailLevel,
}

/// Event catalog query
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub window: TimeWindow,
    pub center: GeoPoint,
    pub max_radius_deg: f64,
    pub min_magnitude: f64,
    pub max_magnitude: Option<f64>,
}

/// Circular area of interest around a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularDomain {
    pub center: GeoPoint,
    pub min_radius_deg: f64,
    pub max_radius_deg: f64,
}

impl CircularDomain {
    /// Whether a point lies in the ring `[min_radius_deg, max_radius_deg]`
    pub fn contains(&self, point: &GeoPoint) -> bool {
        let distance = self.center.distance_deg(point);
        distance >= self.min_radius_deg && distance <= self.max_radius_deg
    }
}

/// One station's waveform download
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub station: StationKey,
    pub domain: CircularDomain,
    pub window: TimeWindow,
    pub channel_pattern: String,
    pub reject_channels_with_gaps: bool,
    /// Minimum covered fraction of `window` for a channel to be kept
    pub minimum_length: f64,
    pub waveform_dir: PathBuf,
    pub metadata_dir: PathBuf,
    /// Inventory slice of the station being downloaded
    pub inventory: Inventory,
    pub worker_count: usize,
}

/// What a downloader did for one station
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub rejected: Vec<RejectedChannel>,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedChannel {
    pub channel: String,
    pub reason: String,
}

/// Remote station inventory service
#[async_trait]
pub trait StationService: Send + Sync {
    async fn get_stations(&self, query: &StationQuery) -> ServiceResult<Inventory>;
}

/// Remote event catalog service
#[async_trait]
pub trait EventService: Send + Sync {
    async fn get_events(&self, query: &EventQuery) -> ServiceResult<EventCatalog>;
}

/// Bulk waveform download subsystem
///
/// Implementations persist waveform segments under `waveform_dir` and apply
/// their own retry and threading policy. Any error means the station's day
/// was not acquired.
#[async_trait]
pub trait WaveformDownloader: Send + Sync {
    async fn download(&self, request: &DownloadRequest) -> DownloadResult<DownloadReport>;
}
