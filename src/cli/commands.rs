//! Command handlers for Seismic Fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! and the loaded configuration to the acquisition core.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::app::storage::audit_flagged_days;
use crate::app::{
    ArchiveLayout, CompletionOracle, DayOrchestrator, DoneFlag, EventArchiver, EventWindowReport,
    FdsnClient, FdsnWaveformDownloader, ResumeLocator, RunOutcome, RunReport, StationCatalog,
    StationQualifier,
};
use crate::cli::{ConfigAction, DownloadArgs, EventsArgs, StatusArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the download command
///
/// Locates the first incomplete day of the range, then runs the day
/// orchestrator from there. A fatal upstream error is returned as `Err`.
pub async fn handle_download(args: DownloadArgs, mut config: AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let (start, end) = args
        .range
        .resolve(config.archive.start_date, config.archive.end_date)
        .map_err(AppError::generic)?;

    if let Some(workers) = args.workers {
        config.download.worker_count = workers;
    }
    if args.no_events {
        config.service.capture_events = false;
    }

    let layout = config.layout();
    info!(
        "Archive: {} | range {} to {} | service {}",
        layout.root().display(),
        start,
        end,
        config.service.fdsn_base_url
    );

    let client = Arc::new(FdsnClient::new(&config.service.fdsn_base_url, &config.client)?);

    if args.dry_run {
        return dry_run(&config, layout, client, start, end).await;
    }

    let downloader = Arc::new(FdsnWaveformDownloader::new(Arc::clone(&client)));
    let mut orchestrator = DayOrchestrator::new(
        config.acquisition_config(),
        layout,
        client.clone(),
        client,
        downloader,
    )
    .await?;

    let spinner = scan_spinner(start, end);
    let located = ResumeLocator::new(orchestrator.oracle())
        .find_first_incomplete_day(start, end)
        .await;
    spinner.finish_and_clear();

    let Some(first) = located? else {
        println!("✅ Every day from {} to {} is already complete", start, end);
        return Ok(());
    };
    println!("🚀 Resuming acquisition at {}", first);

    let report = orchestrator.run_from(first, end).await?;
    print_run_summary(&report);
    Ok(())
}

/// Handle the events command
///
/// Events come from the configured event catalog; stations and waveforms
/// from the FDSN data centre.
pub async fn handle_events(args: EventsArgs, mut config: AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    if let Some(magnitude) = args.min_magnitude {
        config.events.min_magnitude = magnitude;
    }
    if let Some(workers) = args.workers {
        config.events.worker_count = workers;
    }
    if let Some(output) = args.output {
        config.archive.events_root = output;
    }
    config.events.validate().map_err(AppError::generic)?;

    let layout = config.event_layout();
    info!(
        "Event archive: {} | years {} to {} | events from {} | waveforms from {}",
        layout.root().display(),
        args.start_year,
        args.end_year,
        config.service.event_catalog_url,
        config.service.fdsn_base_url
    );

    let catalog = Arc::new(FdsnClient::new(&config.service.event_catalog_url, &config.client)?);
    let client = Arc::new(FdsnClient::new(&config.service.fdsn_base_url, &config.client)?);
    let downloader = Arc::new(FdsnWaveformDownloader::new(Arc::clone(&client)));

    let archiver = EventArchiver::new(config.events.clone(), layout, client, catalog, downloader)
        .with_provider(config.service.fdsn_base_url.clone());

    println!(
        "🌐 Archiving M{:.1}+ events from {} to {}",
        config.events.min_magnitude, args.start_year, args.end_year
    );
    let report = archiver.run(args.start_year, args.end_year).await?;
    print_events_summary(&report);
    Ok(())
}

/// Report the first incomplete day and what a run would do there
async fn dry_run(
    config: &AppConfig,
    layout: ArchiveLayout,
    client: Arc<FdsnClient>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<()> {
    let qualifier = Arc::new(StationQualifier::new(client, config.region.clone()));
    let oracle = CompletionOracle::new(Arc::clone(&qualifier), layout.clone());

    let spinner = scan_spinner(start, end);
    let located = ResumeLocator::new(&oracle)
        .find_first_incomplete_day(start, end)
        .await;
    spinner.finish_and_clear();

    let Some(day) = located? else {
        println!("✅ Every day from {} to {} is already complete", start, end);
        return Ok(());
    };

    let qualified = qualifier.qualify(day).await?;
    println!("🔍 Dry run: first incomplete day is {}", day);
    println!("   {} qualifying station(s):", qualified.stations.len());
    for station in &qualified.stations {
        let done = DoneFlag::exists(&layout.done_flag(&station.key, day)).await;
        println!(
            "   {} {} ({:.3}, {:.3})",
            if done { "✔" } else { "•" },
            station.key,
            station.latitude,
            station.longitude
        );
    }
    for excluded in &qualified.excluded {
        println!(
            "   ✗ {} missing {}",
            excluded.key,
            excluded.missing_channels.join(", ")
        );
    }
    Ok(())
}

/// Handle the status command
pub async fn handle_status(args: StatusArgs, config: AppConfig) -> Result<()> {
    let (start, end) = args
        .range
        .resolve(config.archive.start_date, config.archive.end_date)
        .map_err(AppError::generic)?;
    let layout = config.layout();

    println!("📋 Archive Status");
    println!("=================");
    println!("Root:  {}", layout.root().display());
    println!("Range: {} to {}", start, end);

    let catalog = StationCatalog::open(&layout.stations_dir()).await?;
    println!("Catalogued stations: {}", catalog.len());

    let client = Arc::new(FdsnClient::new(&config.service.fdsn_base_url, &config.client)?);
    let qualifier = Arc::new(StationQualifier::new(client, config.region.clone()));
    let oracle = CompletionOracle::new(qualifier, layout.clone());

    let spinner = scan_spinner(start, end);
    let located = ResumeLocator::new(&oracle)
        .find_first_incomplete_day(start, end)
        .await;
    spinner.finish_and_clear();

    match located? {
        Some(day) => println!("First incomplete day: {}", day),
        None => println!("Every day of the range is complete"),
    }

    if args.audit {
        println!();
        println!("🔍 Auditing flagged days...");
        let findings = audit_flagged_days(&layout, start, end).await?;
        if findings.is_empty() {
            println!("✅ Every flagged day holds waveform data");
        } else {
            warn!("{} flagged day(s) without waveform data", findings.len());
            println!("⚠️  {} flagged day(s) without waveform data:", findings.len());
            for finding in &findings {
                println!(
                    "  • {} {} ({})",
                    finding.station,
                    finding.day,
                    finding.day_dir.display()
                );
            }
        }
    }

    Ok(())
}

/// Handle the catalog command
pub async fn handle_catalog(config: AppConfig) -> Result<()> {
    let layout = config.layout();
    let catalog = StationCatalog::open(&layout.stations_dir()).await?;

    if catalog.is_empty() {
        println!("Station catalog is empty: {}", catalog.records_path().display());
        return Ok(());
    }

    let mut channels: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut locations: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for record in catalog.records() {
        let key = record.station_key().to_string();
        locations.entry(key.clone()).or_insert((record.latitude, record.longitude));
        let codes = channels.entry(key).or_default();
        if !codes.contains(&record.channel) {
            codes.push(record.channel.clone());
        }
    }

    println!("📡 Station Catalog ({} stations)", catalog.len());
    println!("===============================");
    for (key, codes) in &channels {
        let (lat, lon) = locations.get(key).copied().unwrap_or_default();
        println!("{:<10} {:>9.4} {:>9.4}  {}", key, lat, lon, codes.join(","));
    }
    debug!("Catalog records: {}", catalog.records().len());
    Ok(())
}

/// Handle the config command
pub async fn handle_config(
    action: ConfigAction,
    config_path: Option<PathBuf>,
    config: Option<AppConfig>,
) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => {
            let target = path
                .or(config_path)
                .or_else(AppConfig::default_config_path)
                .ok_or_else(|| AppError::generic("Could not determine user config directory"))?;
            AppConfig::initialize(&target, force).await?;
            println!("📁 Created default configuration file:");
            println!("   {}", target.display());
            println!("   You can customize settings by editing this file.");
        }
        ConfigAction::Show => {
            let config = match config {
                Some(config) => config,
                None => AppConfig::load(config_path).await?,
            };
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

fn scan_spinner(start: NaiveDate, end: NaiveDate) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
    }
    spinner.set_message(format!("Scanning {} to {} for the first incomplete day...", start, end));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn print_run_summary(report: &RunReport) {
    println!("\n📊 Acquisition Summary:");
    println!("  Days completed:      {}", report.days_completed);
    println!("  Stations downloaded: {}", report.stations_downloaded);
    println!("  Stations skipped:    {}", report.stations_skipped);
    println!("  Stations failed:     {}", report.stations_failed);
    println!("  Total time:          {:?}", report.total_duration);

    match &report.outcome {
        RunOutcome::AlreadyComplete => println!("\n✅ Nothing to do: the range is complete"),
        RunOutcome::RangeExhausted => {
            if let Some(day) = report.last_day {
                println!("\n✅ Last processed day: {}", day);
            }
        }
        RunOutcome::Blocked { day, failed } => {
            println!(
                "\n⛔ Stopped at {}: {} station(s) failed. Run again to retry them.",
                day, failed
            );
        }
        RunOutcome::Undetermined { day, reason } => {
            println!(
                "\n⛔ Stopped at {}: station list unavailable ({}). Run again to resume.",
                day, reason
            );
        }
    }
}

fn print_events_summary(report: &EventWindowReport) {
    println!("\n📊 Event Archive Summary:");
    for year in &report.years {
        println!(
            "  {}: {}/{} archived, {} already present, {} without data, {} failed",
            year.year,
            year.archived,
            year.events,
            year.already_archived,
            year.without_data,
            year.failed
        );
    }
    println!("  Total time: {:?}", report.total_duration);
}
