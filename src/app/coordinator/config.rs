//! Configuration structures for the day orchestrator
//!
//! This module defines the acquisition region (where stations and events
//! are searched for and which channels a station must expose) and the
//! waveform download policy handed to the download collaborator.

use serde::{Deserialize, Serialize};

use crate::app::models::GeoPoint;
use crate::constants::{download, region};

/// Region and channel requirements of an acquisition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Latitude of the reference point
    pub reference_latitude: f64,
    /// Longitude of the reference point
    pub reference_longitude: f64,
    /// Search radius around the reference point, in degrees
    pub station_radius_deg: f64,
    /// Network codes queried for stations
    pub networks: Vec<String>,
    /// Channel codes a station must all expose to qualify
    pub required_channels: Vec<String>,
    /// Channel pattern requested from the waveform downloader
    pub channel_pattern: String,
    /// Minimum magnitude of captured events
    pub min_event_magnitude: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            reference_latitude: region::REF_LATITUDE,
            reference_longitude: region::REF_LONGITUDE,
            station_radius_deg: region::STATION_RADIUS_DEG,
            networks: region::NETWORKS.iter().map(|s| s.to_string()).collect(),
            required_channels: region::REQUIRED_CHANNELS.iter().map(|s| s.to_string()).collect(),
            channel_pattern: region::CHANNEL_PATTERN.to_string(),
            min_event_magnitude: region::MIN_EVENT_MAGNITUDE,
        }
    }
}

impl RegionConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.reference_latitude, self.reference_longitude)
    }

    /// Validate the region
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.reference_latitude) {
            return Err(format!("Reference latitude {} is out of range", self.reference_latitude));
        }
        if !(-180.0..=180.0).contains(&self.reference_longitude) {
            return Err(format!("Reference longitude {} is out of range", self.reference_longitude));
        }
        if !(self.station_radius_deg > 0.0 && self.station_radius_deg <= 180.0) {
            return Err(format!(
                "Station radius must be in (0, 180] degrees, got {}",
                self.station_radius_deg
            ));
        }
        if self.required_channels.is_empty() {
            return Err("At least one required channel must be configured".to_string());
        }
        if self.channel_pattern.trim().is_empty() {
            return Err("Channel pattern cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Waveform download policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadPolicy {
    /// Drop channels whose data contains gaps
    pub reject_channels_with_gaps: bool,
    /// Minimum covered fraction of the day for a channel to be kept
    pub minimum_length: f64,
    /// Concurrent channel requests per station
    pub worker_count: usize,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            reject_channels_with_gaps: download::REJECT_CHANNELS_WITH_GAPS,
            minimum_length: download::MINIMUM_LENGTH,
            worker_count: download::DEFAULT_WORKER_COUNT,
        }
    }
}

impl DownloadPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.minimum_length > 0.0 && self.minimum_length <= 1.0) {
            return Err(format!(
                "Minimum length must be in (0, 1], got {}",
                self.minimum_length
            ));
        }
        if self.worker_count == 0 {
            return Err("Worker count must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the day orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    #[serde(default)]
    pub region: RegionConfig,
    #[serde(default)]
    pub download: DownloadPolicy,
    /// Capture the event catalog of each acquired day
    #[serde(default = "default_capture_events")]
    pub capture_events: bool,
}

fn default_capture_events() -> bool {
    true
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::new(RegionConfig::default(), DownloadPolicy::default())
    }
}

impl AcquisitionConfig {
    pub fn new(region: RegionConfig, download: DownloadPolicy) -> Self {
        Self {
            region,
            download,
            capture_events: true,
        }
    }

    /// Set the number of concurrent channel requests per station
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.download.worker_count = count;
        self
    }

    /// Enable or disable event capture
    pub fn with_event_capture(mut self, enabled: bool) -> Self {
        self.capture_events = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.region.validate()?;
        self.download.validate()
    }
}
