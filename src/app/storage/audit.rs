//! Read-only integrity audit of completed days
//!
//! Completion is decided by the `DONE.flag` marker alone. The audit walks
//! the archive and reports flagged day directories holding no waveform
//! file, so an operator can decide what to re-acquire. It never changes
//! completion state.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tokio::fs;

use crate::app::models::{Day, StationKey};
use crate::constants::files;
use crate::errors::{StorageError, StorageResult};

use super::ArchiveLayout;

/// A flagged station day without waveform data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub station: StationKey,
    pub day: Day,
    pub day_dir: PathBuf,
}

/// Scan the archive for flagged days in `[start, end]` that have no waveform file
pub async fn audit_flagged_days(
    layout: &ArchiveLayout,
    start: Day,
    end: Day,
) -> StorageResult<Vec<AuditFinding>> {
    let mut findings = Vec::new();

    for year_dir in subdirectories(layout.root()).await? {
        let Some(year) = dir_name(&year_dir).and_then(|n| n.parse::<i32>().ok()) else {
            continue;
        };
        if year < start.year() || year > end.year() {
            continue;
        }

        for station_dir in subdirectories(&year_dir).await? {
            let Some(station) = dir_name(&station_dir).and_then(parse_station_key) else {
                continue;
            };

            for day_dir in subdirectories(&station_dir).await? {
                let Some(day) = dir_name(&day_dir)
                    .and_then(|n| NaiveDate::parse_from_str(n, files::DAY_FORMAT).ok())
                else {
                    continue;
                };
                if day < start || day > end {
                    continue;
                }
                if !fs::try_exists(day_dir.join(files::DONE_FLAG)).await.unwrap_or(false) {
                    continue;
                }
                if !has_waveform(&day_dir).await? {
                    findings.push(AuditFinding {
                        station: station.clone(),
                        day,
                        day_dir,
                    });
                }
            }
        }
    }

    findings.sort_by(|a, b| (a.day, &a.station).cmp(&(b.day, &b.station)));
    Ok(findings)
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn parse_station_key(name: &str) -> Option<StationKey> {
    let (network, station) = name.split_once('.')?;
    if network.is_empty() || station.is_empty() {
        return None;
    }
    Some(StationKey::new(network, station))
}

async fn subdirectories(path: &Path) -> StorageResult<Vec<PathBuf>> {
    let read_error = |source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(e)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        if entry.file_type().await.map_err(read_error)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

async fn has_waveform(day_dir: &Path) -> StorageResult<bool> {
    let read_error = |source| StorageError::Read {
        path: day_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(day_dir).await.map_err(read_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(files::WAVEFORM_EXTENSION) {
            return Ok(true);
        }
    }
    Ok(false)
}
