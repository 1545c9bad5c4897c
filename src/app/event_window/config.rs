//! Configuration of event-window acquisition
//!
//! Events are searched for around the reference point; stations and
//! waveforms are then requested around each epicentre for a short window
//! bracketing the origin time.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::models::GeoPoint;
use crate::constants::{download, events, region};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventWindowConfig {
    pub reference_latitude: f64,
    pub reference_longitude: f64,
    /// Event search radius around the reference point, in kilometres
    pub event_radius_km: f64,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    /// Station search radius around each epicentre, in kilometres
    pub station_radius_km: f64,
    /// Window start before the origin time
    #[serde(with = "humantime_serde")]
    pub pre_event: Duration,
    /// Window end after the origin time
    #[serde(with = "humantime_serde")]
    pub post_event: Duration,
    pub channel_pattern: String,
    pub reject_channels_with_gaps: bool,
    /// Minimum covered fraction of the event window
    pub minimum_length: f64,
    pub worker_count: usize,
}

impl Default for EventWindowConfig {
    fn default() -> Self {
        Self {
            reference_latitude: region::REF_LATITUDE,
            reference_longitude: region::REF_LONGITUDE,
            event_radius_km: events::EVENT_RADIUS_KM,
            min_magnitude: events::MIN_MAGNITUDE,
            max_magnitude: events::MAX_MAGNITUDE,
            station_radius_km: events::STATION_RADIUS_KM,
            pre_event: events::PRE_EVENT,
            post_event: events::POST_EVENT,
            channel_pattern: region::CHANNEL_PATTERN.to_string(),
            reject_channels_with_gaps: download::REJECT_CHANNELS_WITH_GAPS,
            minimum_length: events::MINIMUM_LENGTH,
            worker_count: download::DEFAULT_WORKER_COUNT,
        }
    }
}

impl EventWindowConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.reference_latitude, self.reference_longitude)
    }

    pub fn event_radius_deg(&self) -> f64 {
        self.event_radius_km / events::KM_PER_DEGREE
    }

    /// Station radius in degrees, rounded to two decimals
    pub fn station_radius_deg(&self) -> f64 {
        (self.station_radius_km / events::KM_PER_DEGREE * 100.0).round() / 100.0
    }

    pub fn with_min_magnitude(mut self, magnitude: f64) -> Self {
        self.min_magnitude = magnitude;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.reference_latitude)
            || !(-180.0..=180.0).contains(&self.reference_longitude)
        {
            return Err(format!(
                "Event reference point ({}, {}) is out of range",
                self.reference_latitude, self.reference_longitude
            ));
        }
        if self.event_radius_km <= 0.0 || self.station_radius_km <= 0.0 {
            return Err("Event and station radii must be positive".to_string());
        }
        if self.station_radius_deg() <= 0.0 {
            return Err(format!(
                "Station radius of {} km rounds to zero degrees",
                self.station_radius_km
            ));
        }
        if self.min_magnitude > self.max_magnitude {
            return Err(format!(
                "Minimum magnitude {} is above maximum magnitude {}",
                self.min_magnitude, self.max_magnitude
            ));
        }
        if self.pre_event.is_zero() && self.post_event.is_zero() {
            return Err("Event window cannot be empty".to_string());
        }
        if self.channel_pattern.trim().is_empty() {
            return Err("Channel pattern cannot be empty".to_string());
        }
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
