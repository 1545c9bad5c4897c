//! Command-line interface components
//!
//! This module contains CLI-specific code for the Seismic Fetcher
//! application: argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DownloadArgs, EventsArgs, GlobalArgs, RangeArgs,
    StatusArgs,
};
pub use commands::{
    handle_catalog, handle_config, handle_download, handle_events, handle_status,
};
