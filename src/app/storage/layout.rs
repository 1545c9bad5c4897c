//! Archive path generation
//!
//! Every file the acquisition run reads or writes is named here, so the
//! directory tree stays consistent between the orchestrator, the completion
//! oracle and the `status` command.

use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::app::models::{day_label, Day, StationKey};
use crate::constants::{events, files};

/// Path generator for one archive root
///
/// Structure:
/// - Day data: `{root}/{year}/{NET}.{STA}/{YYYY-MM-DD}/`
/// - Completion marker: `{day dir}/DONE.flag`
/// - Event metadata: `{day dir}/EventsInfo/events_{YYYY-MM-DD}.xml` and `method.json`
/// - Station catalog: `{root}/Stations/Stations_All.json` and `Stations_All.inventory.json`
/// - Journals: `{root}/logs/acquisitionLogs.log` and `acquisitionErrors.log`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{year}`
    pub fn year_dir(&self, day: Day) -> PathBuf {
        self.root.join(day.year().to_string())
    }

    /// `{root}/{year}/{NET}.{STA}`
    pub fn station_dir(&self, key: &StationKey, day: Day) -> PathBuf {
        self.year_dir(day).join(key.to_string())
    }

    /// Directory receiving the waveforms of one station for one day
    pub fn day_dir(&self, key: &StationKey, day: Day) -> PathBuf {
        self.station_dir(key, day).join(day_label(day))
    }

    pub fn done_flag(&self, key: &StationKey, day: Day) -> PathBuf {
        self.day_dir(key, day).join(files::DONE_FLAG)
    }

    pub fn events_dir(&self, key: &StationKey, day: Day) -> PathBuf {
        self.day_dir(key, day).join(files::EVENTS_DIR)
    }

    /// Raw QuakeML document of the day
    pub fn event_document(&self, key: &StationKey, day: Day) -> PathBuf {
        self.events_dir(key, day)
            .join(format!("events_{}.{}", day_label(day), files::EVENT_DOCUMENT_EXTENSION))
    }

    pub fn event_summary(&self, key: &StationKey, day: Day) -> PathBuf {
        self.events_dir(key, day).join(files::EVENT_SUMMARY)
    }

    /// Directory holding the global catalog and per-station metadata documents
    pub fn stations_dir(&self) -> PathBuf {
        self.root.join(files::STATIONS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(files::LOGS_DIR)
    }

    pub fn acquisition_log(&self) -> PathBuf {
        self.logs_dir().join(files::ACQUISITION_LOG)
    }

    pub fn errors_log(&self) -> PathBuf {
        self.logs_dir().join(files::ERRORS_LOG)
    }
}

/// Path generator for an event-window archive
///
/// Structure:
/// - Event data: `{root}/{year}/{event label}/{NET}.{STA}/mseed/`
/// - Event description: `{event dir}/info.txt`
/// - Station metadata shared by every event: `{root}/Stations/{NET}.{STA}.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventArchiveLayout {
    root: PathBuf,
}

impl EventArchiveLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn year_dir(&self, year: i32) -> PathBuf {
        self.root.join(year.to_string())
    }

    pub fn event_dir(&self, year: i32, label: &str) -> PathBuf {
        self.year_dir(year).join(label)
    }

    /// Directory receiving one station's waveforms of an event
    pub fn waveform_dir(&self, event_dir: &Path, key: &StationKey) -> PathBuf {
        event_dir.join(key.to_string()).join(events::WAVEFORM_DIR)
    }

    pub fn info_file(&self, event_dir: &Path) -> PathBuf {
        event_dir.join(events::INFO_FILE)
    }

    pub fn stations_dir(&self) -> PathBuf {
        self.root.join(files::STATIONS_DIR)
    }
}
