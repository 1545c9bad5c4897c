//! Day completion detection and resume scanning
//!
//! A day is complete when no station qualifies for it, or when every
//! qualifying station has its `DONE.flag`. The flag is trusted as is. The
//! resume scan walks the range one day at a time and stops at the first
//! incomplete day; days after it are treated as unprocessed whatever they
//! contain.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::models::{days_inclusive, Day};
use crate::app::qualifier::{QualifiedDay, StationQualifier};
use crate::app::storage::{ArchiveLayout, DoneFlag};
use crate::errors::Result;

/// Answers whether a day has been fully acquired
#[derive(Clone)]
pub struct CompletionOracle {
    qualifier: Arc<StationQualifier>,
    layout: ArchiveLayout,
}

impl CompletionOracle {
    pub fn new(qualifier: Arc<StationQualifier>, layout: ArchiveLayout) -> Self {
        Self { qualifier, layout }
    }

    /// Whether `day` is complete
    ///
    /// # Errors
    ///
    /// A fatal station service error propagates. Any other query failure
    /// is logged and reported as incomplete, so the day is attempted again.
    pub async fn is_day_complete(&self, day: Day) -> Result<bool> {
        match self.qualifier.qualify(day).await {
            Ok(qualified) => Ok(self.all_flagged(day, &qualified).await),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Cannot determine completion of {}: {}", day, e);
                Ok(false)
            }
        }
    }

    /// Whether every station of an already qualified day has its flag
    pub async fn all_flagged(&self, day: Day, qualified: &QualifiedDay) -> bool {
        for station in &qualified.stations {
            if !DoneFlag::exists(&self.layout.done_flag(&station.key, day)).await {
                debug!("{} not done for {}", station.key, day);
                return false;
            }
        }
        true
    }
}

/// Finds the day an acquisition run must start from
pub struct ResumeLocator<'a> {
    oracle: &'a CompletionOracle,
}

impl<'a> ResumeLocator<'a> {
    pub fn new(oracle: &'a CompletionOracle) -> Self {
        Self { oracle }
    }

    /// First day of `[start, end]` that is not complete, `None` when all are
    ///
    /// # Errors
    ///
    /// Propagates fatal station service errors.
    pub async fn find_first_incomplete_day(&self, start: Day, end: Day) -> Result<Option<Day>> {
        for day in days_inclusive(start, end) {
            if !self.oracle.is_day_complete(day).await? {
                debug!("First incomplete day: {}", day);
                return Ok(Some(day));
            }
        }
        Ok(None)
    }
}
