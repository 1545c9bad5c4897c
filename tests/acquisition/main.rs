//! Integration tests for a full acquisition run over HTTP
//!
//! These tests drive the day orchestrator and the event archiver through
//! the real FDSN client and waveform downloader against a mock data
//! centre, then inspect the archive left on disk.

mod support;

use std::sync::Arc;

use mockito::{Matcher, Mock, Server, ServerGuard};
use tempfile::TempDir;

use seismic_fetcher::app::storage::audit_flagged_days;
use seismic_fetcher::app::{
    AcquisitionConfig, ArchiveLayout, DayOrchestrator, EventArchiveLayout, EventArchiver,
    EventWindowConfig, FdsnClient, FdsnWaveformDownloader, RunOutcome, StationCatalog, StationKey,
};
use seismic_fetcher::errors::AppError;

use support::{
    client_config, day, full_day_stream, one_hour_stream, quakeml_event, station_xml,
    window_stream, StationRows,
};

const BROADBAND: &[&str] = &["HHN", "HHE", "HHZ"];

fn santorini_stations() -> String {
    station_xml(&[
        StationRows {
            network: "HL",
            station: "SANT",
            latitude: 36.3712,
            longitude: 25.4597,
            channels: BROADBAND,
        },
        StationRows {
            network: "HL",
            station: "THE",
            latitude: 36.4431,
            longitude: 25.3547,
            channels: BROADBAND,
        },
        StationRows {
            network: "HA",
            station: "AMOE",
            latitude: 36.8314,
            longitude: 25.9022,
            channels: &["HHZ"],
        },
    ])
}

async fn mock_stations(server: &mut ServerGuard, status: usize, body: &str) -> Mock {
    server
        .mock("GET", Matcher::Regex("^/fdsnws/station/1/query".to_string()))
        .match_query(Matcher::Any)
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

async fn mock_no_events(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", Matcher::Regex("^/fdsnws/event/1/query".to_string()))
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await
}

async fn mock_waveforms(
    server: &mut ServerGuard,
    station: &str,
    status: usize,
    body: Vec<u8>,
    hits: Option<usize>,
) -> Mock {
    let mock = server
        .mock("GET", Matcher::Regex("^/fdsnws/dataselect/1/query".to_string()))
        .match_query(Matcher::UrlEncoded("station".to_string(), station.to_string()))
        .with_status(status)
        .with_body(body);
    match hits {
        Some(hits) => mock.expect(hits),
        None => mock,
    }
    .create_async()
    .await
}

async fn orchestrator(server: &ServerGuard, root: &std::path::Path) -> DayOrchestrator {
    let client = Arc::new(FdsnClient::new(&server.url(), &client_config()).unwrap());
    let downloader = Arc::new(FdsnWaveformDownloader::new(client.clone()));
    DayOrchestrator::new(
        AcquisitionConfig::default(),
        ArchiveLayout::new(root),
        client.clone(),
        client,
        downloader,
    )
    .await
    .unwrap()
}

async fn mseed_files(dir: &std::path::Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Some(entry) = entries.next_entry().await.unwrap() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".mseed") {
            names.push(name);
        }
    }
    names.sort();
    names
}

/// A qualifying day is acquired end to end and the archive is complete
///
/// HA.AMOE only exposes HHZ and is never touched; both broadband
/// stations get their three channels, metadata, flag and journal line.
#[tokio::test]
async fn test_full_day_acquisition_over_http() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    mock_stations(&mut server, 200, &santorini_stations()).await;
    mock_no_events(&mut server).await;
    let sant = mock_waveforms(&mut server, "SANT", 200, full_day_stream(day(1)), Some(3)).await;
    let thera = mock_waveforms(&mut server, "THE", 200, full_day_stream(day(1)), Some(3)).await;

    let mut orchestrator = orchestrator(&server, temp_dir.path()).await;
    let report = orchestrator.run(day(1), day(1)).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.stations_downloaded, 2);
    sant.assert_async().await;
    thera.assert_async().await;

    let layout = ArchiveLayout::new(temp_dir.path());
    for station in ["SANT", "THE"] {
        let key = StationKey::new("HL", station);
        assert!(layout.done_flag(&key, day(1)).exists());
        let files = mseed_files(&layout.day_dir(&key, day(1))).await;
        assert_eq!(files.len(), 3, "{} should hold three channels", key);
        assert!(layout.stations_dir().join(format!("{}.json", key)).exists());
    }

    let amoe = StationKey::new("HA", "AMOE");
    assert!(!layout.day_dir(&amoe, day(1)).exists());

    let catalog = StationCatalog::open(&layout.stations_dir()).await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(!catalog.contains(&amoe));

    let journal = tokio::fs::read_to_string(layout.acquisition_log()).await.unwrap();
    assert_eq!(journal.lines().filter(|l| l.contains("| OK |")).count(), 2);
}

/// A station whose waveform requests fail blocks the day; the next run
/// retries only that station and then completes the day
#[tokio::test]
async fn test_failed_station_is_retried_on_next_run() {
    let temp_dir = TempDir::new().unwrap();

    let mut first = Server::new_async().await;
    mock_stations(&mut first, 200, &santorini_stations()).await;
    mock_no_events(&mut first).await;
    mock_waveforms(&mut first, "SANT", 200, full_day_stream(day(1)), None).await;
    mock_waveforms(&mut first, "THE", 500, b"Internal error".to_vec(), None).await;

    let report = orchestrator(&first, temp_dir.path())
        .await
        .run(day(1), day(2))
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::Blocked { day: day(1), failed: 1 });

    let layout = ArchiveLayout::new(temp_dir.path());
    let thera = StationKey::new("HL", "THE");
    assert!(!layout.done_flag(&thera, day(1)).exists());
    let errors = tokio::fs::read_to_string(layout.errors_log()).await.unwrap();
    assert!(errors.contains("HL.THE"));

    let mut second = Server::new_async().await;
    mock_stations(&mut second, 200, &santorini_stations()).await;
    mock_no_events(&mut second).await;
    let sant = mock_waveforms(&mut second, "SANT", 200, full_day_stream(day(1)), Some(0)).await;
    mock_waveforms(&mut second, "THE", 200, full_day_stream(day(1)), None).await;

    let report = orchestrator(&second, temp_dir.path())
        .await
        .run(day(1), day(1))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.stations_skipped, 1);
    assert_eq!(report.stations_downloaded, 1);
    assert!(layout.done_flag(&thera, day(1)).exists());
    sant.assert_async().await;
}

/// Channels covering too little of the day are dropped without failing
/// the station; the audit reports the empty flagged day
#[tokio::test]
async fn test_short_channels_are_rejected_and_audited() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    mock_stations(
        &mut server,
        200,
        &station_xml(&[StationRows {
            network: "HL",
            station: "SANT",
            latitude: 36.3712,
            longitude: 25.4597,
            channels: BROADBAND,
        }]),
    )
    .await;
    mock_no_events(&mut server).await;
    mock_waveforms(&mut server, "SANT", 200, one_hour_stream(day(1)), None).await;

    let report = orchestrator(&server, temp_dir.path())
        .await
        .run(day(1), day(1))
        .await
        .unwrap();
    assert_eq!(report.outcome, RunOutcome::RangeExhausted);

    let layout = ArchiveLayout::new(temp_dir.path());
    let key = StationKey::new("HL", "SANT");
    assert!(layout.done_flag(&key, day(1)).exists());
    assert!(mseed_files(&layout.day_dir(&key, day(1))).await.is_empty());

    let findings = audit_flagged_days(&layout, day(1), day(1)).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].station, key);
}

/// A gateway error from the station service aborts the run before any
/// station directory is created
#[tokio::test]
async fn test_gateway_error_aborts_run() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    mock_stations(&mut server, 502, "<html>502 Bad Gateway</html>").await;

    let result = orchestrator(&server, temp_dir.path())
        .await
        .run(day(1), day(3))
        .await;

    match result {
        Err(error @ AppError::Service(_)) => assert!(error.is_fatal()),
        other => panic!("expected a fatal service error, got {:?}", other),
    }
    assert!(!temp_dir.path().join("2012").exists());
}

/// A station returned just past the search radius of the reference point
/// still completes, since its download domain is centred on the station
#[tokio::test]
async fn test_station_at_search_radius_edge_completes() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    mock_stations(
        &mut server,
        200,
        &station_xml(&[StationRows {
            network: "HL",
            station: "EDGE",
            latitude: 36.618712 + 1.8201,
            longitude: 25.682873,
            channels: BROADBAND,
        }]),
    )
    .await;
    mock_no_events(&mut server).await;
    let edge = mock_waveforms(&mut server, "EDGE", 200, full_day_stream(day(1)), Some(3)).await;

    let report = orchestrator(&server, temp_dir.path())
        .await
        .run(day(1), day(1))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::RangeExhausted);
    assert_eq!(report.stations_downloaded, 1);
    edge.assert_async().await;

    let layout = ArchiveLayout::new(temp_dir.path());
    let key = StationKey::new("HL", "EDGE");
    assert!(layout.done_flag(&key, day(1)).exists());
    assert_eq!(mseed_files(&layout.day_dir(&key, day(1))).await.len(), 3);
}

/// An event is archived into its own directory with an `info.txt`, and a
/// second run leaves it alone
#[tokio::test]
async fn test_event_window_archive_over_http() {
    let temp_dir = TempDir::new().unwrap();
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex("^/fdsnws/event/1/query".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("starttime".to_string(), "2012-01-01T00:00:00.000000".to_string()),
            Matcher::UrlEncoded("format".to_string(), "xml".to_string()),
        ]))
        .with_status(200)
        .with_body(quakeml_event("2012-06-01T12:00:00Z", 36.42, 25.43, 8000.0, 3.4))
        .create_async()
        .await;
    mock_stations(
        &mut server,
        200,
        &station_xml(&[StationRows {
            network: "HL",
            station: "SANT",
            latitude: 36.3712,
            longitude: 25.4597,
            channels: BROADBAND,
        }]),
    )
    .await;
    let window_start = chrono::DateTime::parse_from_rfc3339("2012-06-01T11:59:30Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let sant = mock_waveforms(&mut server, "SANT", 200, window_stream(window_start, 210), Some(3)).await;

    let client = Arc::new(FdsnClient::new(&server.url(), &client_config()).unwrap());
    let layout = EventArchiveLayout::new(temp_dir.path());
    let archiver = EventArchiver::new(
        EventWindowConfig::default(),
        layout.clone(),
        client.clone(),
        client.clone(),
        Arc::new(FdsnWaveformDownloader::new(client)),
    )
    .with_provider(server.url());

    let report = archiver.run(2012, 2012).await.unwrap();
    assert_eq!(report.archived(), 1);

    let event_dir = layout.event_dir(2012, "20120601T120000_36.42_25.43_8.0km_M3.4");
    let key = StationKey::new("HL", "SANT");
    assert_eq!(mseed_files(&layout.waveform_dir(&event_dir, &key)).await.len(), 3);
    assert!(layout.stations_dir().join("HL.SANT.json").exists());

    let info = tokio::fs::read_to_string(layout.info_file(&event_dir)).await.unwrap();
    assert!(info.contains("Method: Hypo71 (arrival-time method)\n"));
    assert!(info.contains("Used Phases: P, S\n"));
    assert!(info.contains("Agency: NOA\n"));

    let rerun = archiver.run(2012, 2012).await.unwrap();
    assert_eq!(rerun.years[0].already_archived, 1);
    sant.assert_async().await;
}
