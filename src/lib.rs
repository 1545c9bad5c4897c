//! Seismic Fetcher Library
//!
//! A Rust library for building a day-by-day archive of continuous seismic
//! waveforms from FDSN web services. Runs are resumable: each station/day is
//! marked done only after its data is on disk, and a restarted run picks up
//! at the first incomplete day.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
