//! Waveform download from the FDSN dataselect service
//!
//! [`FdsnWaveformDownloader`] fetches one miniSEED stream per matching
//! channel of a station, with at most `worker_count` requests in flight.
//! Each stream is checked against the request policy before it is kept:
//! channels with gaps (when rejected) or covering less than
//! `minimum_length` of the window are dropped. Accepted streams are written
//! atomically next to each other in the day directory, and the station's
//! inventory slice is stored once in the metadata directory.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::app::client::FdsnClient;
use crate::app::inventory::InventoryChannel;
use crate::app::models::{GeoPoint, TimeWindow};
use crate::app::services::{DownloadReport, DownloadRequest, RejectedChannel, WaveformDownloader};
use crate::app::storage::{self, write_atomic, write_json_atomic};
use crate::constants::{fdsn, files};
use crate::errors::{DownloadError, DownloadResult};

pub mod mseed;

/// Filename timestamp format of saved waveform segments
const SEGMENT_TIME_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Outcome of one channel request
#[derive(Debug)]
enum ChannelOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Rejected(RejectedChannel),
}

/// Stream identity of one requested channel
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChannelId {
    location: String,
    channel: String,
}

impl ChannelId {
    fn from_inventory(channel: &InventoryChannel) -> Self {
        Self {
            location: channel.location_code.clone(),
            channel: channel.code.clone(),
        }
    }

    /// `NET.STA.LOC.CHA` label of the stream
    fn label(&self, request: &DownloadRequest) -> String {
        format!(
            "{}.{}.{}.{}",
            request.station.network, request.station.station, self.location, self.channel
        )
    }

    /// FDSN spells the empty location code `--`
    fn location_param(&self) -> String {
        if self.location.trim().is_empty() {
            "--".to_string()
        } else {
            self.location.clone()
        }
    }
}

/// Dataselect-backed implementation of [`WaveformDownloader`]
#[derive(Debug, Clone)]
pub struct FdsnWaveformDownloader {
    client: Arc<FdsnClient>,
}

impl FdsnWaveformDownloader {
    pub fn new(client: Arc<FdsnClient>) -> Self {
        Self { client }
    }

    fn requested_channels(request: &DownloadRequest) -> DownloadResult<Vec<ChannelId>> {
        let mut channels: Vec<ChannelId> = Vec::new();
        for (_, station) in request.inventory.stations() {
            for channel in station.channels_matching(&request.channel_pattern) {
                let id = ChannelId::from_inventory(channel);
                if !channels.contains(&id) {
                    channels.push(id);
                }
            }
        }

        if channels.is_empty() {
            return Err(DownloadError::NoMatchingChannels {
                station: request.station.to_string(),
                pattern: request.channel_pattern.clone(),
            });
        }
        Ok(channels)
    }

    fn check_domain(request: &DownloadRequest) -> DownloadResult<()> {
        for (_, station) in request.inventory.stations() {
            let location = GeoPoint::new(station.latitude, station.longitude);
            if !request.domain.contains(&location) {
                return Err(DownloadError::OutsideDomain {
                    station: request.station.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Store the station's inventory slice unless an earlier day already did
    async fn save_station_metadata(&self, request: &DownloadRequest) -> DownloadResult<()> {
        let path = request
            .metadata_dir
            .join(format!("{}.json", request.station));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }
        write_json_atomic(&path, &request.inventory).await?;
        debug!("Saved station metadata: {}", path.display());
        Ok(())
    }

    async fn fetch_channel(
        &self,
        request: &DownloadRequest,
        id: ChannelId,
    ) -> DownloadResult<ChannelOutcome> {
        let label = id.label(request);
        let (start, end) = request.window.fdsn_bounds();
        let url = self.client.service_url(
            fdsn::DATASELECT_PATH,
            &[
                ("network", request.station.network.clone()),
                ("station", request.station.station.clone()),
                ("location", id.location_param()),
                ("channel", id.channel.clone()),
                ("starttime", start),
                ("endtime", end),
                ("nodata", "404".to_string()),
            ],
        )?;

        let Some(data) = self.client.http().get_bytes(&url).await? else {
            return Ok(rejected(&id, "no data available"));
        };

        let spans = mseed::scan_records(&data)?;
        let coverage = mseed::coverage(&spans, &request.window);

        if request.reject_channels_with_gaps && coverage.gaps > 0 {
            return Ok(rejected(&id, &format!("{} gap(s) in data", coverage.gaps)));
        }
        if coverage.fraction() < request.minimum_length {
            return Ok(rejected(
                &id,
                &format!(
                    "covers {:.1}% of the window, below {:.1}%",
                    coverage.fraction() * 100.0,
                    request.minimum_length * 100.0
                ),
            ));
        }

        let path = request
            .waveform_dir
            .join(segment_file_name(&label, &request.window));
        write_atomic(&path, &data).await?;
        debug!("Saved {} ({} bytes)", path.display(), data.len());

        Ok(ChannelOutcome::Saved {
            path,
            bytes: data.len() as u64,
        })
    }
}

#[async_trait]
impl WaveformDownloader for FdsnWaveformDownloader {
    async fn download(&self, request: &DownloadRequest) -> DownloadResult<DownloadReport> {
        Self::check_domain(request)?;
        let channels = Self::requested_channels(request)?;

        storage::ensure_dir(&request.waveform_dir).await?;
        storage::ensure_dir(&request.metadata_dir).await?;

        let outcomes: Vec<DownloadResult<ChannelOutcome>> = stream::iter(channels)
            .map(|id| self.fetch_channel(request, id))
            .buffer_unordered(request.worker_count.max(1))
            .collect()
            .await;

        let mut report = DownloadReport::default();
        for outcome in outcomes {
            match outcome? {
                ChannelOutcome::Saved { path, bytes } => {
                    report.saved.push(path);
                    report.bytes_written += bytes;
                }
                ChannelOutcome::Rejected(rejection) => {
                    warn!(
                        "Rejected {}.{}: {}",
                        request.station, rejection.channel, rejection.reason
                    );
                    report.rejected.push(rejection);
                }
            }
        }
        report.saved.sort();

        self.save_station_metadata(request).await?;

        info!(
            "{}: saved {} channel(s), rejected {}, {} bytes",
            request.station,
            report.saved.len(),
            report.rejected.len(),
            report.bytes_written
        );
        Ok(report)
    }
}

fn rejected(id: &ChannelId, reason: &str) -> ChannelOutcome {
    ChannelOutcome::Rejected(RejectedChannel {
        channel: id.channel.clone(),
        reason: reason.to_string(),
    })
}

/// `NET.STA.LOC.CHA__<start>__<end>.mseed`
fn segment_file_name(label: &str, window: &TimeWindow) -> String {
    format!(
        "{}__{}__{}.{}",
        label,
        window.start.format(SEGMENT_TIME_FORMAT),
        window.end.format(SEGMENT_TIME_FORMAT),
        files::WAVEFORM_EXTENSION
    )
}
