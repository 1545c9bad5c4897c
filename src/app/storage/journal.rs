//! Append-only acquisition journals
//!
//! Two plain-text logs live under `{root}/logs`. Every station outcome goes
//! to the acquisition log; failures are also copied to the error log. Lines
//! are `<UTC timestamp> | <message>` and are never rewritten.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::app::models::{day_label, Day, StationKey};
use crate::errors::{StorageError, StorageResult};

use super::{ensure_dir, ArchiveLayout};

#[derive(Debug, Clone)]
pub struct AcquisitionJournal {
    acquisition_log: PathBuf,
    errors_log: PathBuf,
}

impl AcquisitionJournal {
    /// Opens the journals of an archive, creating the logs directory
    pub async fn open(layout: &ArchiveLayout) -> StorageResult<Self> {
        ensure_dir(&layout.logs_dir()).await?;
        Ok(Self {
            acquisition_log: layout.acquisition_log(),
            errors_log: layout.errors_log(),
        })
    }

    pub fn acquisition_log(&self) -> &Path {
        &self.acquisition_log
    }

    pub fn errors_log(&self) -> &Path {
        &self.errors_log
    }

    /// Record a completed station day
    pub async fn record_ok(&self, key: &StationKey, day: Day) -> StorageResult<()> {
        let message = format!("OK | {} | {}", key, day_label(day));
        append_line(&self.acquisition_log, &message).await
    }

    /// Record a failed station day in both journals
    pub async fn record_error(&self, key: &StationKey, day: Day, reason: &str) -> StorageResult<()> {
        // One line per entry, whatever the error text contains
        let reason = reason.replace(['\r', '\n'], " ");
        let message = format!("ERROR | {} | {} | {}", key, day_label(day), reason);
        append_line(&self.errors_log, &message).await?;
        append_line(&self.acquisition_log, &message).await
    }
}

async fn append_line(path: &Path, message: &str) -> StorageResult<()> {
    let line = format!(
        "{} | {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        message
    );
    let write_error = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(write_error)?;
    file.write_all(line.as_bytes()).await.map_err(write_error)?;
    file.flush().await.map_err(write_error)
}
