//! Tests for the day orchestrator
//!
//! The orchestrator is driven by in-memory collaborators: a scripted
//! station service, an event service and a downloader that writes a
//! placeholder waveform file or fails on demand.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use super::*;
use crate::app::client::quakeml::parse_quakeml;
use crate::app::client::quakeml::tests::CATALOG as EVENTS_QUAKEML;
use crate::app::event::EventCatalog;
use crate::app::inventory::tests::inventory;
use crate::app::models::{GeoPoint, StationKey};
use crate::app::services::{EventQuery, StationQuery};
use crate::errors::{DownloadError, DownloadResult, ServiceError, ServiceResult};

/// Scripted answer of the station service for one day
#[derive(Clone)]
pub enum StationScript {
    Stations(Inventory),
    Unavailable,
    QueryFailed,
}

/// Station service answering from a per-day script
///
/// Days without a script have no stations.
#[derive(Default)]
pub struct FakeStationService {
    scripts: Mutex<HashMap<Day, StationScript>>,
    calls: AtomicUsize,
}

impl FakeStationService {
    pub fn set(&self, day: Day, script: StationScript) {
        self.scripts.lock().unwrap().insert(day, script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StationService for FakeStationService {
    async fn get_stations(&self, query: &StationQuery) -> ServiceResult<Inventory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let day = query.window.start.date_naive();
        let script = self.scripts.lock().unwrap().get(&day).cloned();
        match script {
            Some(StationScript::Stations(inventory)) => Ok(inventory),
            Some(StationScript::Unavailable) => Err(ServiceError::Unavailable {
                reason: "HTTP 502: Bad Gateway".to_string(),
            }),
            Some(StationScript::QueryFailed) => Err(ServiceError::QueryFailed {
                status: 400,
                reason: "bad request".to_string(),
            }),
            None => Ok(Inventory::default()),
        }
    }
}

/// Event service returning a fixed catalog, or failing
pub struct FakeEventService {
    catalog: Option<EventCatalog>,
    calls: AtomicUsize,
}

impl FakeEventService {
    pub fn with_events() -> Self {
        Self {
            catalog: Some(parse_quakeml(EVENTS_QUAKEML).unwrap()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            catalog: Some(EventCatalog::empty()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            catalog: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventService for FakeEventService {
    async fn get_events(&self, _query: &EventQuery) -> ServiceResult<EventCatalog> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.catalog.clone().ok_or_else(|| ServiceError::QueryFailed {
            status: 500,
            reason: "event service error".to_string(),
        })
    }
}

/// Downloader writing one placeholder file per call, failing for chosen stations
#[derive(Default)]
pub struct FakeDownloader {
    failing: Mutex<HashSet<StationKey>>,
    requests: Mutex<Vec<DownloadRequest>>,
}

impl FakeDownloader {
    pub fn fail(&self, key: &StationKey) {
        self.failing.lock().unwrap().insert(key.clone());
    }

    pub fn recover(&self, key: &StationKey) {
        self.failing.lock().unwrap().remove(key);
    }

    pub fn calls(&self) -> Vec<StationKey> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.station.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaveformDownloader for FakeDownloader {
    async fn download(&self, request: &DownloadRequest) -> DownloadResult<DownloadReport> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.lock().unwrap().contains(&request.station) {
            return Err(DownloadError::Other("simulated download failure".to_string()));
        }

        let path = request
            .waveform_dir
            .join(format!("{}..HHZ.mseed", request.station));
        std::fs::write(&path, b"mseed").map_err(|e| DownloadError::Other(e.to_string()))?;
        Ok(DownloadReport {
            saved: vec![path],
            rejected: Vec::new(),
            bytes_written: 5,
        })
    }
}

/// Shared fixture: an archive in a temporary directory plus the fakes
struct Fixture {
    temp_dir: TempDir,
    stations: Arc<FakeStationService>,
    events: Arc<FakeEventService>,
    downloader: Arc<FakeDownloader>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_events(FakeEventService::with_events())
    }

    fn with_events(events: FakeEventService) -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
            stations: Arc::new(FakeStationService::default()),
            events: Arc::new(events),
            downloader: Arc::new(FakeDownloader::default()),
        }
    }

    fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(self.temp_dir.path())
    }

    async fn orchestrator(&self) -> DayOrchestrator {
        DayOrchestrator::new(
            AcquisitionConfig::default(),
            self.layout(),
            self.stations.clone(),
            self.events.clone(),
            self.downloader.clone(),
        )
        .await
        .unwrap()
    }

    fn flag(&self, key: &StationKey, day: Day) -> std::path::PathBuf {
        self.layout().done_flag(key, day)
    }

    fn write_flag(&self, key: &StationKey, day: Day) {
        let flag = self.flag(key, day);
        std::fs::create_dir_all(flag.parent().unwrap()).unwrap();
        std::fs::write(flag, "Completed at earlier run\n").unwrap();
    }
}

fn day(d: u32) -> Day {
    NaiveDate::from_ymd_opt(2012, 1, d).unwrap()
}

fn key(station: &str) -> StationKey {
    StationKey::new("HL", station)
}

const BROADBAND: &[&str] = &["HHN", "HHE", "HHZ"];

/// Inventory of `HL` stations each exposing the three required channels
fn full_stations(stations: &[&str]) -> StationScript {
    let entries: Vec<(&str, &str, &[&str])> = stations.iter().map(|s| ("HL", *s, BROADBAND)).collect();
    StationScript::Stations(inventory(&entries))
}

fn log_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Test the three-station day where one station fails
///
/// Station A was done in an earlier run, B downloads and C fails. A and B
/// end with flags, C without; the error log holds exactly one entry for C
/// and the run stops on the day.
#[tokio::test]
async fn test_failed_station_blocks_day() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA", "BBB", "CCC"]));
    fixture.stations.set(day(2), full_stations(&["AAA"]));
    fixture.write_flag(&key("AAA"), day(1));
    fixture.downloader.fail(&key("CCC"));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(2)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Blocked { day: day(1), failed: 1 });
    assert_eq!(orchestrator.state(), RunState::Blocked(day(1)));
    assert_eq!(report.stations_skipped, 1);
    assert_eq!(report.stations_downloaded, 1);
    assert_eq!(report.days, vec![(day(1), DayState::Blocked)]);

    assert!(fixture.flag(&key("AAA"), day(1)).exists());
    assert!(fixture.flag(&key("BBB"), day(1)).exists());
    assert!(!fixture.flag(&key("CCC"), day(1)).exists());
    // The failed station keeps its directory
    assert!(fixture.layout().day_dir(&key("CCC"), day(1)).exists());

    let errors = log_lines(&fixture.layout().errors_log());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("ERROR | HL.CCC | 2012-01-01 | simulated download failure"));

    let acquisition = log_lines(&fixture.layout().acquisition_log());
    assert_eq!(acquisition.len(), 2);
    assert!(acquisition.iter().any(|l| l.ends_with("OK | HL.BBB | 2012-01-01")));

    assert_eq!(fixture.downloader.calls(), vec![key("BBB"), key("CCC")]);
    // The day was never advanced past
    assert!(!fixture.layout().day_dir(&key("AAA"), day(2)).exists());
}

/// Test that a second run retries only the failed station
#[tokio::test]
async fn test_second_run_completes_day() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA", "BBB", "CCC"]));
    fixture.downloader.fail(&key("CCC"));

    let mut first = fixture.orchestrator().await;
    let report = first.run(day(1), day(1)).await.unwrap();
    assert!(report.is_blocked());

    fixture.downloader.recover(&key("CCC"));
    let mut second = fixture.orchestrator().await;
    let report = second.run(day(1), day(1)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.days_completed, 1);
    assert_eq!(report.stations_skipped, 2);
    assert_eq!(report.stations_downloaded, 1);
    assert_eq!(
        fixture.downloader.calls(),
        vec![key("AAA"), key("BBB"), key("CCC"), key("CCC")]
    );
    assert!(fixture.flag(&key("CCC"), day(1)).exists());
    assert_eq!(second.state(), RunState::Finished);
}

/// Test that a gateway error while qualifying aborts every remaining day
#[tokio::test]
async fn test_gateway_error_aborts_run() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA"]));
    fixture.stations.set(day(2), StationScript::Unavailable);
    fixture.stations.set(day(3), full_stations(&["BBB"]));

    let mut orchestrator = fixture.orchestrator().await;
    let error = orchestrator.run(day(1), day(3)).await.unwrap_err();

    assert!(error.is_fatal());
    assert!(fixture.flag(&key("AAA"), day(1)).exists());
    assert_eq!(fixture.downloader.calls(), vec![key("AAA")]);
    assert!(!fixture.layout().year_dir(day(3)).join("HL.BBB").exists());
    assert!(log_lines(&fixture.layout().errors_log()).is_empty());
}

/// Test that a gateway error during the resume scan is fatal too
#[tokio::test]
async fn test_gateway_error_while_locating_is_fatal() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), StationScript::Unavailable);

    let mut orchestrator = fixture.orchestrator().await;
    assert!(orchestrator.run(day(1), day(5)).await.unwrap_err().is_fatal());
    assert!(fixture.downloader.calls().is_empty());
}

/// Test that a non-fatal query failure stops the run without an error
#[tokio::test]
async fn test_query_failure_leaves_day_undetermined() {
    let fixture = Fixture::new();
    fixture.stations.set(day(2), StationScript::QueryFailed);

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(3)).await.unwrap();

    assert!(matches!(
        report.outcome,
        RunOutcome::Undetermined { day: d, .. } if d == day(2)
    ));
    assert_eq!(orchestrator.state(), RunState::Blocked(day(2)));
    assert_eq!(report.first_incomplete_day, Some(day(2)));
    assert!(!fixture.layout().year_dir(day(2)).exists());
}

/// Test the resume scan stops at the first gap
///
/// D1 and D2 are complete, D3 is missing a flag, D4 and D5 are complete.
#[tokio::test]
async fn test_resume_locator_returns_first_gap() {
    let fixture = Fixture::new();
    for d in 1..=5 {
        fixture.stations.set(day(d), full_stations(&["AAA"]));
        if d != 3 {
            fixture.write_flag(&key("AAA"), day(d));
        }
    }
    let orchestrator = fixture.orchestrator().await;
    let locator = ResumeLocator::new(orchestrator.oracle());

    assert_eq!(
        locator.find_first_incomplete_day(day(1), day(5)).await.unwrap(),
        Some(day(3))
    );
    assert_eq!(locator.find_first_incomplete_day(day(4), day(5)).await.unwrap(), None);
}

/// Test the completion oracle's answers
#[tokio::test]
async fn test_completion_oracle() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA", "BBB"]));
    fixture.stations.set(day(2), StationScript::QueryFailed);
    fixture.stations.set(day(3), StationScript::Unavailable);
    fixture.write_flag(&key("AAA"), day(1));
    let orchestrator = fixture.orchestrator().await;
    let oracle = orchestrator.oracle();

    assert!(!oracle.is_day_complete(day(1)).await.unwrap());
    fixture.write_flag(&key("BBB"), day(1));
    assert!(oracle.is_day_complete(day(1)).await.unwrap());

    assert!(!oracle.is_day_complete(day(2)).await.unwrap());
    assert!(oracle.is_day_complete(day(3)).await.unwrap_err().is_fatal());
    // Nothing qualifies on an unscripted day
    assert!(oracle.is_day_complete(day(4)).await.unwrap());
}

/// Test that days without qualifying stations leave no trace
#[tokio::test]
async fn test_days_without_stations_create_nothing() {
    let fixture = Fixture::new();
    // HL.SANT lacks HHE and never qualifies
    fixture.stations.set(
        day(2),
        StationScript::Stations(inventory(&[("HL", "SANT", &["HHN", "HHZ"])])),
    );
    fixture.stations.set(day(3), full_stations(&["AAA"]));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(3)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.first_incomplete_day, Some(day(3)));
    assert_eq!(fixture.downloader.calls(), vec![key("AAA")]);

    let year_dir = fixture.layout().year_dir(day(1));
    let entries: Vec<_> = std::fs::read_dir(&year_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["HL.AAA"]);

    let day_dirs: Vec<_> = std::fs::read_dir(year_dir.join("HL.AAA"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(day_dirs, vec!["2012-01-03"]);
}

/// Test that an empty range of work leaves even the year directory absent
#[tokio::test]
async fn test_all_unqualified_range_is_already_complete() {
    let fixture = Fixture::new();
    let mut orchestrator = fixture.orchestrator().await;

    let report = orchestrator.run(day(1), day(4)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::AlreadyComplete);
    assert_eq!(fixture.stations.calls(), 4);
    assert!(!fixture.layout().year_dir(day(1)).exists());
}

/// Test that flagged stations are never downloaded again
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA", "BBB"]));
    fixture.stations.set(day(2), full_stations(&["AAA", "BBB"]));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(2)).await.unwrap();
    assert_eq!(report.days_completed, 2);
    assert_eq!(fixture.downloader.calls().len(), 4);

    let report = orchestrator.run(day(1), day(2)).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::AlreadyComplete);
    assert_eq!(fixture.downloader.calls().len(), 4);
    assert_eq!(log_lines(&fixture.layout().acquisition_log()).len(), 4);
}

/// Test that stations enter the catalog once across days
#[tokio::test]
async fn test_catalog_merged_once_per_station() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA"]));
    fixture.stations.set(day(2), full_stations(&["AAA", "BBB"]));

    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.run(day(1), day(2)).await.unwrap();

    let catalog = orchestrator.catalog();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.records().len(), 6);

    let merged: Inventory =
        serde_json::from_str(&std::fs::read_to_string(catalog.inventory_path()).unwrap()).unwrap();
    assert_eq!(merged.station_keys(), vec![key("AAA"), key("BBB")]);
}

/// Test that the day's events are fetched once and written per station
#[tokio::test]
async fn test_events_captured_once_per_day() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA", "BBB"]));

    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.run(day(1), day(1)).await.unwrap();

    assert_eq!(fixture.events.calls(), 1);
    for station in ["AAA", "BBB"] {
        let layout = fixture.layout();
        let document = layout.event_document(&key(station), day(1));
        assert_eq!(std::fs::read_to_string(document).unwrap(), EVENTS_QUAKEML);

        let summary: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(layout.event_summary(&key(station), day(1))).unwrap(),
        )
        .unwrap();
        assert_eq!(summary[0]["event_id"], "smi:noa/event/noa2012aaaa");
        assert_eq!(summary[0]["method"], "smi:noa/method/HypoInverse");
        assert_eq!(summary[0]["unique_phases"], serde_json::json!(["P", "S"]));
    }
}

/// Test that event failures never fail a station
#[tokio::test]
async fn test_event_failure_does_not_fail_station() {
    let fixture = Fixture::with_events(FakeEventService::failing());
    fixture.stations.set(day(1), full_stations(&["AAA"]));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(1)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert!(fixture.flag(&key("AAA"), day(1)).exists());
    assert!(log_lines(&fixture.layout().errors_log()).is_empty());
    assert!(!fixture.layout().events_dir(&key("AAA"), day(1)).exists());
}

/// Test that an empty event catalog writes no event files
#[tokio::test]
async fn test_empty_event_catalog_writes_nothing() {
    let fixture = Fixture::with_events(FakeEventService::empty());
    fixture.stations.set(day(1), full_stations(&["AAA"]));

    let mut orchestrator = fixture.orchestrator().await;
    orchestrator.run(day(1), day(1)).await.unwrap();

    assert!(fixture.flag(&key("AAA"), day(1)).exists());
    assert!(!fixture.layout().events_dir(&key("AAA"), day(1)).exists());
}

/// Test that a caller-located start day is processed without a second scan
#[tokio::test]
async fn test_run_from_skips_resume_scan() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA"]));
    fixture.stations.set(day(2), full_stations(&["AAA"]));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run_from(day(2), day(2)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.first_incomplete_day, Some(day(2)));
    // One query to qualify the day and one to confirm completion
    assert_eq!(fixture.stations.calls(), 2);
    assert_eq!(fixture.downloader.calls(), vec![key("AAA")]);
    assert!(!fixture.flag(&key("AAA"), day(1)).exists());
}

/// Test that the download domain is centred on the station itself
///
/// HL.EDGE sits just beyond the region radius from the reference point,
/// as a server may still list it. The request must still cover it.
#[tokio::test]
async fn test_download_domain_is_centred_on_station() {
    let fixture = Fixture::new();
    let region = AcquisitionConfig::default().region;
    let mut edge = inventory(&[("HL", "EDGE", BROADBAND)]);
    edge.networks[0].stations[0].latitude = region.reference_latitude + 1.8201;
    edge.networks[0].stations[0].longitude = region.reference_longitude;
    fixture.stations.set(day(1), StationScript::Stations(edge));

    let mut orchestrator = fixture.orchestrator().await;
    let report = orchestrator.run(day(1), day(1)).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::RangeExhausted);

    let requests = fixture.downloader.requests();
    assert_eq!(requests.len(), 1);
    let station = GeoPoint::new(region.reference_latitude + 1.8201, region.reference_longitude);
    assert_eq!(requests[0].domain.center, station);
    assert!(requests[0].domain.contains(&station));
}

/// Test that a journal failure after the flag does not fail the station
#[tokio::test]
async fn test_journal_failure_after_flag_is_not_a_station_failure() {
    let fixture = Fixture::new();
    fixture.stations.set(day(1), full_stations(&["AAA"]));

    let mut orchestrator = fixture.orchestrator().await;
    // A directory in place of the log makes every append fail
    std::fs::create_dir_all(fixture.layout().acquisition_log()).unwrap();

    let report = orchestrator.run(day(1), day(1)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.stations_downloaded, 1);
    assert_eq!(report.stations_failed, 0);
    assert!(fixture.flag(&key("AAA"), day(1)).exists());
    assert!(log_lines(&fixture.layout().errors_log()).is_empty());
}
