//! Per station/day completion marker

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs;

use crate::errors::StorageResult;

use super::write_atomic;

/// `DONE.flag` marker, the only record that a station's day was acquired
///
/// The flag is written last, after the waveforms and metadata of the day
/// are in place. Its presence is trusted without looking at the files next
/// to it.
pub struct DoneFlag;

impl DoneFlag {
    pub async fn exists(path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    pub async fn write(path: &Path) -> StorageResult<()> {
        write_atomic(path, Self::contents(Utc::now()).as_bytes()).await
    }

    pub fn contents(completed_at: DateTime<Utc>) -> String {
        format!(
            "Completed at {}\n",
            completed_at.to_rfc3339_opts(SecondsFormat::Micros, true)
        )
    }
}
