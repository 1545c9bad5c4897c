//! Day-by-day acquisition orchestration
//!
//! This module provides the control loop of an acquisition run. Starting
//! from the first incomplete day of the requested range, it qualifies the
//! day's stations, acquires each station that is not yet done and advances
//! only once the whole day is complete.
//!
//! # Architecture
//!
//! The coordinator module is organized into specialized components:
//!
//! - [`config`] - Region and download policy configuration
//! - [`completion`] - Completion oracle and resume scan
//! - [`events`] - Per-day event metadata capture
//! - [`stats`] - Run state machine and final report
//!
//! # Failure policy
//!
//! - A fatal station service error ends the run with `Err`; nothing after it
//!   is attempted.
//! - A station failure is journaled and the pass moves on to the next
//!   station. No completion flag is written for it.
//! - A day left incomplete after its pass stops the run. The next run
//!   resumes there and retries only the stations without a flag.
//! - Event capture failures are logged and never affect a station.
//! - A journal write that fails after the flag was written is only logged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use seismic_fetcher::app::{
//!     AcquisitionConfig, ArchiveLayout, ClientConfig, DayOrchestrator, FdsnClient,
//!     FdsnWaveformDownloader,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(FdsnClient::new("https://eida.gein.noa.gr", &ClientConfig::default())?);
//! let downloader = Arc::new(FdsnWaveformDownloader::new(client.clone()));
//!
//! let mut orchestrator = DayOrchestrator::new(
//!     AcquisitionConfig::default(),
//!     ArchiveLayout::new("/data/santorini"),
//!     client.clone(),
//!     client,
//!     downloader,
//! )
//! .await?;
//!
//! let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2012, 1, 31).unwrap();
//! let report = orchestrator.run(start, end).await?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

pub mod completion;
pub mod config;
pub mod events;
pub mod stats;

#[cfg(test)]
pub mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::app::catalog::StationCatalog;
use crate::app::inventory::Inventory;
use crate::app::models::{Day, QualifiedStation, TimeWindow};
use crate::app::qualifier::{QualifiedDay, StationQualifier};
use crate::app::services::{
    CircularDomain, DownloadReport, DownloadRequest, EventService, StationService,
    WaveformDownloader,
};
use crate::app::storage::{ensure_dir, AcquisitionJournal, ArchiveLayout, DoneFlag};
use crate::errors::Result;

pub use completion::{CompletionOracle, ResumeLocator};
pub use config::{AcquisitionConfig, DownloadPolicy, RegionConfig};
pub use events::EventCapture;
pub use stats::{DayState, RunOutcome, RunReport, RunState, StationPass};

/// Sequential day-completion orchestrator
///
/// Days are processed one at a time and stations one at a time within a
/// day. The only concurrency is inside the waveform downloader.
pub struct DayOrchestrator {
    config: AcquisitionConfig,
    layout: ArchiveLayout,
    qualifier: Arc<StationQualifier>,
    oracle: CompletionOracle,
    downloader: Arc<dyn WaveformDownloader>,
    events: EventCapture,
    catalog: StationCatalog,
    journal: AcquisitionJournal,
    state: RunState,
}

impl DayOrchestrator {
    /// Create an orchestrator over an archive root
    ///
    /// Opens the station catalog and the journals of the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the journals cannot be created or the catalog
    /// cannot be opened.
    pub async fn new(
        config: AcquisitionConfig,
        layout: ArchiveLayout,
        stations: Arc<dyn StationService>,
        events: Arc<dyn EventService>,
        downloader: Arc<dyn WaveformDownloader>,
    ) -> Result<Self> {
        let qualifier = Arc::new(StationQualifier::new(stations, config.region.clone()));
        let oracle = CompletionOracle::new(Arc::clone(&qualifier), layout.clone());
        let events = EventCapture::new(events, config.region.clone());
        let catalog = StationCatalog::open(&layout.stations_dir()).await?;
        let journal = AcquisitionJournal::open(&layout).await?;

        Ok(Self {
            config,
            layout,
            qualifier,
            oracle,
            downloader,
            events,
            catalog,
            journal,
            state: RunState::Locating,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn oracle(&self) -> &CompletionOracle {
        &self.oracle
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }

    /// Acquire every incomplete day of `[start, end]`, in order
    ///
    /// # Errors
    ///
    /// Returns `AppError::Service` when the station service is unavailable.
    /// Station and day failures are not errors: they end the run with a
    /// [`RunOutcome::Blocked`] report.
    pub async fn run(&mut self, start: Day, end: Day) -> Result<RunReport> {
        let started = Instant::now();

        self.state = RunState::Locating;
        let located = ResumeLocator::new(&self.oracle)
            .find_first_incomplete_day(start, end)
            .await;
        match located {
            Ok(Some(first)) => {
                info!("Resuming from first incomplete day: {}", first);
                self.process(first, end, started).await
            }
            Ok(None) => {
                info!("Every day from {} to {} is already complete", start, end);
                self.state = RunState::Finished;
                Ok(RunReport {
                    outcome: RunOutcome::AlreadyComplete,
                    total_duration: started.elapsed(),
                    ..RunReport::default()
                })
            }
            Err(e) => {
                error!("Station service unavailable, stopping: {}", e);
                self.state = RunState::Finished;
                Err(e)
            }
        }
    }

    /// Acquire from `first` through `end` without scanning for the resume day
    ///
    /// For callers that already located the first incomplete day with
    /// [`ResumeLocator`] over [`Self::oracle`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`].
    pub async fn run_from(&mut self, first: Day, end: Day) -> Result<RunReport> {
        self.process(first, end, Instant::now()).await
    }

    async fn process(&mut self, first: Day, end: Day, started: Instant) -> Result<RunReport> {
        let mut report = RunReport {
            first_incomplete_day: Some(first),
            ..RunReport::default()
        };

        let mut current = Some(first);
        while let Some(day) = current.filter(|day| *day <= end) {
            self.state = RunState::Processing(day);
            info!("Day: {}", day);

            let qualified = match self.qualifier.qualify(day).await {
                Ok(qualified) => qualified,
                Err(e) if e.is_fatal() => {
                    error!("Station service unavailable on {}, stopping: {}", day, e);
                    self.state = RunState::Finished;
                    return Err(e.into());
                }
                Err(e) => {
                    warn!("Cannot retrieve stations for {}: {}", day, e);
                    report.record_day(day, DayState::Blocked);
                    report.outcome = RunOutcome::Undetermined {
                        day,
                        reason: e.to_string(),
                    };
                    self.state = RunState::Blocked(day);
                    report.total_duration = started.elapsed();
                    return Ok(report);
                }
            };

            if qualified.is_empty() {
                info!("No qualifying stations for {}", day);
                self.transition(day, DayState::Unqualified);
                report.record_day(day, DayState::Unqualified);
                current = day.succ_opt();
                continue;
            }

            self.transition(day, DayState::Pending);
            self.transition(day, DayState::InProgress);
            let pass = self.station_pass(day, &qualified).await;
            report.add_pass(&pass);

            let complete = match self.oracle.is_day_complete(day).await {
                Ok(complete) => complete,
                Err(e) => {
                    error!("Station service unavailable on {}, stopping: {}", day, e);
                    self.state = RunState::Finished;
                    return Err(e);
                }
            };

            if complete {
                info!("Day {} fully completed", day);
                self.transition(day, DayState::Complete);
                report.record_day(day, DayState::Complete);
                current = day.succ_opt();
            } else {
                warn!(
                    "Stopping without advancing: stations remain for {} ({} failed)",
                    day, pass.failed
                );
                self.transition(day, DayState::Blocked);
                report.record_day(day, DayState::Blocked);
                report.outcome = RunOutcome::Blocked {
                    day,
                    failed: pass.failed,
                };
                self.state = RunState::Blocked(day);
                report.total_duration = started.elapsed();
                return Ok(report);
            }
        }

        info!("Last processed day: {:?}", report.last_day);
        self.state = RunState::Finished;
        report.outcome = RunOutcome::RangeExhausted;
        report.total_duration = started.elapsed();
        Ok(report)
    }

    fn transition(&self, day: Day, state: DayState) {
        debug!("{} -> {}", day, state);
    }

    /// Acquire every qualifying station of a day that is not yet done
    async fn station_pass(&mut self, day: Day, qualified: &QualifiedDay) -> StationPass {
        let mut pass = StationPass::default();
        let total = qualified.stations.len();

        for (index, station) in qualified.stations.iter().enumerate() {
            let flag = self.layout.done_flag(&station.key, day);
            if DoneFlag::exists(&flag).await {
                info!("[{}/{}] Already done: {} ({})", index + 1, total, station.key, day);
                pass.skipped += 1;
                continue;
            }

            info!("[{}/{}] Acquiring {} for {}", index + 1, total, station.key, day);
            match self.acquire_station(day, station, &qualified.inventory).await {
                Ok(download) => {
                    pass.downloaded += 1;
                    info!(
                        "Completed {}: {} channel(s) saved",
                        station.key,
                        download.saved.len()
                    );
                }
                Err(e) => {
                    pass.failed += 1;
                    error!("Failed {} for {}: {}", station.key, day, e);
                    if let Err(journal_error) =
                        self.journal.record_error(&station.key, day, &e.to_string()).await
                    {
                        error!("Cannot write to the error journal: {}", journal_error);
                    }
                }
            }
        }

        pass
    }

    /// Acquire one station's day; the flag is written only when every step succeeded
    async fn acquire_station(
        &mut self,
        day: Day,
        station: &QualifiedStation,
        inventory: &Inventory,
    ) -> Result<DownloadReport> {
        let day_dir = self.layout.day_dir(&station.key, day);
        ensure_dir(&day_dir).await?;

        let slice = inventory.select(&station.key);
        self.catalog.merge(&slice).await?;

        let request = self.download_request(day, station, slice, day_dir);
        let download = self.downloader.download(&request).await?;
        if download.saved.is_empty() {
            warn!("No waveform channel kept for {} on {}", station.key, day);
        }

        if self.config.capture_events {
            match self.events.capture(&self.layout, &station.key, day).await {
                Ok(count) => debug!("Captured {} event(s) for {}", count, station.key),
                Err(e) => warn!("Cannot capture events for {} on {}: {}", station.key, day, e),
            }
        }

        DoneFlag::write(&self.layout.done_flag(&station.key, day)).await?;
        // The flag is written, so the station is done whatever the journal says
        if let Err(e) = self.journal.record_ok(&station.key, day).await {
            warn!("Cannot journal completion of {} for {}: {}", station.key, day, e);
        }
        Ok(download)
    }

    fn download_request(
        &self,
        day: Day,
        station: &QualifiedStation,
        inventory: Inventory,
        waveform_dir: PathBuf,
    ) -> DownloadRequest {
        let region = &self.config.region;
        let policy = &self.config.download;
        DownloadRequest {
            station: station.key.clone(),
            domain: CircularDomain {
                center: station.location(),
                min_radius_deg: 0.0,
                max_radius_deg: region.station_radius_deg,
            },
            window: TimeWindow::for_day(day).trimmed_end(),
            channel_pattern: region.channel_pattern.clone(),
            reject_channels_with_gaps: policy.reject_channels_with_gaps,
            minimum_length: policy.minimum_length,
            waveform_dir,
            metadata_dir: self.layout.stations_dir(),
            inventory,
            worker_count: policy.worker_count,
        }
    }
}
