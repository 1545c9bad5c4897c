//! Event-window acquisition
//!
//! A second acquisition mode next to the day orchestrator. For each year
//! of a range the event catalog around the reference point is fetched,
//! newest event first. Every event then gets its own directory holding a
//! short waveform window of each station near the epicentre, plus an
//! `info.txt` describing how the epicentre was determined.
//!
//! - [`config`] - Event search, station radius and window configuration
//! - [`info`] - Event directory names and the `info.txt` description
//!
//! An event whose directory already holds a waveform file is skipped, so a
//! rerun resumes where the previous one stopped. An event for which no
//! channel is kept leaves no directory behind.
//!
//! # Failure policy
//!
//! - A fatal station or event service error ends the run with `Err`.
//! - Any other failure of an event is logged, counted and the run moves on.
//! - A failed station download only loses that station for the event.

pub mod config;
pub mod info;


use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::app::event::Event;
use crate::app::inventory::Inventory;
use crate::app::models::{day_start, GeoPoint, StationKey, TimeWindow};
use crate::app::services::{
    CircularDomain, DetailLevel, DownloadRequest, EventQuery, EventService, StationQuery,
    StationService, WaveformDownloader,
};
use crate::app::storage::{contains_waveforms, write_atomic, EventArchiveLayout};
use crate::constants::download::DAY_SECONDS;
use crate::errors::{AppError, Result};

pub use config::EventWindowConfig;
pub use info::{render_info, EventLocation, LocationMethod};

/// What happened to one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// A previous run already saved waveforms for it
    AlreadyArchived,
    Archived { stations: usize, channels: usize },
    /// No station near the epicentre yielded a channel
    NoData,
    /// The event has no origin with epicentre coordinates
    Unlocated,
}

/// Counters of one year of events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearReport {
    pub year: i32,
    pub events: usize,
    pub archived: usize,
    pub already_archived: usize,
    pub without_data: usize,
    pub failed: usize,
}

impl YearReport {
    fn record(&mut self, outcome: EventOutcome) {
        match outcome {
            EventOutcome::AlreadyArchived => self.already_archived += 1,
            EventOutcome::Archived { .. } => self.archived += 1,
            EventOutcome::NoData | EventOutcome::Unlocated => self.without_data += 1,
        }
    }
}

/// Report of an event-window run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventWindowReport {
    pub years: Vec<YearReport>,
    pub total_duration: Duration,
}

impl EventWindowReport {
    pub fn events(&self) -> usize {
        self.years.iter().map(|y| y.events).sum()
    }

    pub fn archived(&self) -> usize {
        self.years.iter().map(|y| y.archived).sum()
    }

    pub fn failed(&self) -> usize {
        self.years.iter().map(|y| y.failed).sum()
    }
}

/// Archives a waveform window around every event of a year range
pub struct EventArchiver {
    config: EventWindowConfig,
    layout: EventArchiveLayout,
    stations: Arc<dyn StationService>,
    events: Arc<dyn EventService>,
    downloader: Arc<dyn WaveformDownloader>,
    /// Waveform provider named in `info.txt`
    provider: String,
}

impl EventArchiver {
    pub fn new(
        config: EventWindowConfig,
        layout: EventArchiveLayout,
        stations: Arc<dyn StationService>,
        events: Arc<dyn EventService>,
        downloader: Arc<dyn WaveformDownloader>,
    ) -> Self {
        Self {
            config,
            layout,
            stations,
            events,
            downloader,
            provider: crate::constants::FDSN_BASE_URL.to_string(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Event query covering `year` from Jan 1 00:00:00 to Dec 31 23:59:59
    pub fn year_query(&self, year: i32) -> Result<EventQuery> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1);
        let last = NaiveDate::from_ymd_opt(year, 12, 31);
        let (Some(first), Some(last)) = (first, last) else {
            return Err(AppError::generic(format!("Year {} is out of range", year)));
        };

        Ok(EventQuery {
            window: TimeWindow::new(
                day_start(first),
                day_start(last) + chrono::Duration::seconds(DAY_SECONDS - 1),
            ),
            center: self.config.center(),
            max_radius_deg: self.config.event_radius_deg(),
            min_magnitude: self.config.min_magnitude,
            max_magnitude: Some(self.config.max_magnitude),
        })
    }

    /// Events of `year`, newest first
    pub async fn year_events(&self, year: i32) -> Result<Vec<Event>> {
        let catalog = self.events.get_events(&self.year_query(year)?).await?;
        let mut events: Vec<Event> = catalog
            .events
            .into_iter()
            .filter(|e| e.origin().is_some())
            .collect();
        events.sort_by_key(|e| std::cmp::Reverse(e.origin().map(|o| o.time)));
        Ok(events)
    }

    /// Archive every event from `start_year` to `end_year`, inclusive
    ///
    /// # Errors
    ///
    /// Returns an error for an inverted range, when a year's catalog cannot
    /// be fetched, or on a fatal station service error.
    pub async fn run(&self, start_year: i32, end_year: i32) -> Result<EventWindowReport> {
        if start_year > end_year {
            return Err(AppError::generic(format!(
                "Start year {} is after end year {}",
                start_year, end_year
            )));
        }

        let started = Instant::now();
        let mut report = EventWindowReport::default();

        for year in start_year..=end_year {
            info!("Searching events of {}", year);
            let events = self.year_events(year).await?;
            let mut year_report = YearReport {
                year,
                events: events.len(),
                ..YearReport::default()
            };

            for (index, event) in events.iter().enumerate() {
                debug!("[{}/{}] Event {:?}", index + 1, events.len(), event.resource_id);
                match self.archive_event(year, event).await {
                    Ok(outcome) => year_report.record(outcome),
                    Err(e) if e.is_fatal() => {
                        error!("Station service unavailable, stopping: {}", e);
                        return Err(e);
                    }
                    Err(e) => {
                        warn!("Cannot archive event {:?}: {}", event.resource_id, e);
                        year_report.failed += 1;
                    }
                }
            }

            info!(
                "Year {}: {}/{} events archived ({} already, {} without data, {} failed)",
                year,
                year_report.archived,
                year_report.events,
                year_report.already_archived,
                year_report.without_data,
                year_report.failed
            );
            report.years.push(year_report);
        }

        report.total_duration = started.elapsed();
        Ok(report)
    }

    /// Archive one event of `year`
    pub async fn archive_event(&self, year: i32, event: &Event) -> Result<EventOutcome> {
        let Some(location) = EventLocation::of(event) else {
            warn!("Event {:?} has no epicentre, skipping", event.resource_id);
            return Ok(EventOutcome::Unlocated);
        };
        let label = location.label();
        let event_dir = self.layout.event_dir(year, &label);

        if contains_waveforms(&event_dir).await? {
            info!("Skipping {}: already downloaded", label);
            return Ok(EventOutcome::AlreadyArchived);
        }

        let window = self.event_window(location.origin.time)?;
        let epicentre = GeoPoint::new(location.latitude, location.longitude);
        let radius = self.config.station_radius_deg();
        info!("Event {} (M{:.1}, station radius {:.2}°)", label, location.magnitude, radius);

        let inventory = self
            .stations
            .get_stations(&StationQuery {
                window,
                center: epicentre,
                max_radius_deg: radius,
                networks: Vec::new(),
                level: DetailLevel::Response,
            })
            .await?;

        let mut seen = HashSet::new();
        let mut stations = 0;
        let mut channels = 0;
        for key in inventory.station_keys() {
            if !seen.insert(key.clone()) {
                continue;
            }
            let slice = inventory.select(&key);
            let Some(request) = self.download_request(&key, slice, window, &event_dir) else {
                debug!("{} has no {} channel", key, self.config.channel_pattern);
                continue;
            };

            match self.downloader.download(&request).await {
                Ok(report) if !report.saved.is_empty() => {
                    stations += 1;
                    channels += report.saved.len();
                }
                Ok(_) => {
                    debug!("No channel kept for {} in {}", key, label);
                    discard_dir(&event_dir.join(key.to_string())).await;
                }
                Err(e) => {
                    warn!("Download of {} for {} failed: {}", key, label, e);
                    discard_dir(&event_dir.join(key.to_string())).await;
                }
            }
        }

        if channels == 0 {
            info!("No waveforms for {}, skipping", label);
            discard_dir(&event_dir).await;
            return Ok(EventOutcome::NoData);
        }

        let info = render_info(event, &location, std::slice::from_ref(&self.provider));
        write_atomic(&self.layout.info_file(&event_dir), info.as_bytes()).await?;
        info!("Archived {}: {} channel(s) from {} station(s)", label, channels, stations);

        Ok(EventOutcome::Archived { stations, channels })
    }

    fn event_window(&self, origin_time: DateTime<Utc>) -> Result<TimeWindow> {
        let to_chrono = |duration: Duration| {
            chrono::Duration::from_std(duration)
                .map_err(|e| AppError::generic(format!("Invalid event window: {}", e)))
        };
        Ok(TimeWindow::new(
            origin_time - to_chrono(self.config.pre_event)?,
            origin_time + to_chrono(self.config.post_event)?,
        ))
    }

    /// Request for one station, `None` when it has no matching channel
    fn download_request(
        &self,
        key: &StationKey,
        inventory: Inventory,
        window: TimeWindow,
        event_dir: &Path,
    ) -> Option<DownloadRequest> {
        let pattern = &self.config.channel_pattern;
        let (_, station) = inventory
            .stations()
            .find(|(_, s)| s.channels_matching(pattern).next().is_some())?;
        let location = GeoPoint::new(station.latitude, station.longitude);

        Some(DownloadRequest {
            station: key.clone(),
            domain: CircularDomain {
                center: location,
                min_radius_deg: 0.0,
                max_radius_deg: self.config.station_radius_deg(),
            },
            window,
            channel_pattern: pattern.clone(),
            reject_channels_with_gaps: self.config.reject_channels_with_gaps,
            minimum_length: self.config.minimum_length,
            waveform_dir: self.layout.waveform_dir(event_dir, key),
            metadata_dir: self.layout.stations_dir(),
            inventory,
            worker_count: self.config.worker_count,
        })
    }
}

/// Remove a directory tree left by an event or station without data
async fn discard_dir(path: &Path) {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Cannot remove {}: {}", path.display(), e),
    }
}
