//! Persisted archive state
//!
//! The archive is a plain directory tree. This module owns its layout, the
//! per station/day completion markers, the append-only journals and the
//! read-only integrity audit. JSON documents and markers are written
//! atomically through a temporary file and a rename, so an interrupted run
//! never leaves a partial file under a final name.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, error};

use crate::constants::files;
use crate::errors::{StorageError, StorageResult};

pub mod audit;
pub mod flag;
pub mod journal;
pub mod layout;

pub use audit::{audit_flagged_days, AuditFinding};
pub use flag::DoneFlag;
pub use journal::AcquisitionJournal;
pub use layout::{ArchiveLayout, EventArchiveLayout};

/// Create a directory and all missing parents
pub async fn ensure_dir(path: &Path) -> StorageResult<()> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        fs::create_dir_all(path)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Created directory: {}", path.display());
    }
    Ok(())
}

/// Temporary sibling used while `path` is being written
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(files::TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

/// Write `content` to `path` through a temporary file and an atomic rename
pub async fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content)
        .await
        .map_err(|source| StorageError::Write {
            path: temp_path.clone(),
            source,
        })?;

    if let Err(source) = fs::rename(&temp_path, path).await {
        error!("Failed to rename {} into place: {}", temp_path.display(), source);
        let _ = fs::remove_file(&temp_path).await;
        return Err(StorageError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let content = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomic(path, &content).await
}

/// Read a file, `None` when it does not exist
pub async fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StorageError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Whether any waveform file exists at any depth under `dir`
///
/// A missing directory holds no waveforms.
pub async fn contains_waveforms(dir: &Path) -> StorageResult<bool> {
    fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError {
        let path = path.to_path_buf();
        move |source| StorageError::Read { path, source }
    }

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = match fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => return Err(StorageError::Read { path: current, source }),
        };
        while let Some(entry) = entries.next_entry().await.map_err(read_error(&current))? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(read_error(&path))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == files::WAVEFORM_EXTENSION) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
