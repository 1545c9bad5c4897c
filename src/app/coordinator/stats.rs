//! Run state and statistics of an acquisition run
//!
//! The orchestrator is a small state machine. Each day moves through
//! [`DayState`]s and the run itself through [`RunState`]s; the run ends in
//! exactly one [`RunOutcome`], reported together with counters in a
//! [`RunReport`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::models::Day;

/// Progress of a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayState {
    /// No station qualifies: complete without any directory being created
    Unqualified,
    /// Stations qualify but not all of them are done
    Pending,
    /// The station pass is running
    InProgress,
    /// Every qualifying station has its completion flag
    Complete,
    /// The day could not be completed in this run
    Blocked,
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayState::Unqualified => "unqualified",
            DayState::Pending => "pending",
            DayState::InProgress => "in progress",
            DayState::Complete => "complete",
            DayState::Blocked => "blocked",
        };
        f.write_str(label)
    }
}

/// Position of the orchestrator in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Searching for the first incomplete day
    Locating,
    Processing(Day),
    /// Stopped on a day that could not be completed; terminal
    Blocked(Day),
    /// Range exhausted or already complete; terminal
    Finished,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Blocked(_) | RunState::Finished)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every day of the range was already complete
    AlreadyComplete,
    /// Every remaining day of the range was completed
    RangeExhausted,
    /// A day kept failing stations; the next run resumes there
    Blocked { day: Day, failed: usize },
    /// The station service could not answer for a day (non-fatal)
    Undetermined { day: Day, reason: String },
}

impl RunOutcome {
    /// Day the next run will resume from, if any
    pub fn resume_day(&self) -> Option<Day> {
        match self {
            RunOutcome::Blocked { day, .. } | RunOutcome::Undetermined { day, .. } => Some(*day),
            RunOutcome::AlreadyComplete | RunOutcome::RangeExhausted => None,
        }
    }
}

/// Stations handled during one day's pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationPass {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Final result of an acquisition run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// First incomplete day found by the resume scan
    pub first_incomplete_day: Option<Day>,
    pub days_completed: usize,
    pub stations_downloaded: usize,
    pub stations_skipped: usize,
    pub stations_failed: usize,
    /// Last day the orchestrator worked on
    pub last_day: Option<Day>,
    /// Terminal state of every processed day, in order
    pub days: Vec<(Day, DayState)>,
    pub total_duration: Duration,
}

impl Default for RunReport {
    fn default() -> Self {
        Self {
            outcome: RunOutcome::AlreadyComplete,
            first_incomplete_day: None,
            days_completed: 0,
            stations_downloaded: 0,
            stations_skipped: 0,
            stations_failed: 0,
            last_day: None,
            days: Vec::new(),
            total_duration: Duration::ZERO,
        }
    }
}

impl RunReport {
    /// Fold one day's station pass into the totals
    pub fn add_pass(&mut self, pass: &StationPass) {
        self.stations_downloaded += pass.downloaded;
        self.stations_skipped += pass.skipped;
        self.stations_failed += pass.failed;
    }

    pub fn record_day(&mut self, day: Day, state: DayState) {
        if matches!(state, DayState::Complete | DayState::Unqualified) {
            self.days_completed += 1;
        }
        self.last_day = Some(day);
        self.days.push((day, state));
    }

    /// Whether the run stopped before the end of its range
    pub fn is_blocked(&self) -> bool {
        self.outcome.resume_day().is_some()
    }
}
