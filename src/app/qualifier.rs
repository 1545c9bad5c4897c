//! Station qualification for one acquisition day
//!
//! A station qualifies on a day when the inventory active that day lists
//! every required channel for it. Stations missing a channel are reported
//! and excluded; there is no fallback to a smaller channel set.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::coordinator::config::RegionConfig;
use crate::app::inventory::Inventory;
use crate::app::models::{Day, QualifiedStation, StationKey, TimeWindow};
use crate::app::services::{DetailLevel, StationQuery, StationService};
use crate::errors::ServiceResult;

/// A station left out of a day, with the channels it lacked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedStation {
    pub key: StationKey,
    pub missing_channels: Vec<String>,
}

/// Result of qualifying one day
#[derive(Debug, Clone, Default)]
pub struct QualifiedDay {
    /// Qualifying stations in inventory listing order
    pub stations: Vec<QualifiedStation>,
    /// Full inventory returned for the day, for catalog merges
    pub inventory: Inventory,
    pub excluded: Vec<ExcludedStation>,
}

impl QualifiedDay {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

pub struct StationQualifier {
    service: Arc<dyn StationService>,
    region: RegionConfig,
}

impl StationQualifier {
    pub fn new(service: Arc<dyn StationService>, region: RegionConfig) -> Self {
        Self { service, region }
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    /// Inventory query for the stations active at any instant of `day`
    pub fn query_for(&self, day: Day) -> StationQuery {
        StationQuery {
            window: TimeWindow::inventory_window(day),
            center: self.region.center(),
            max_radius_deg: self.region.station_radius_deg,
            networks: self.region.networks.clone(),
            level: DetailLevel::Response,
        }
    }

    /// Query the day's inventory and keep the stations exposing every required channel
    ///
    /// # Errors
    ///
    /// Returns the station service error unchanged. Callers decide whether
    /// it is fatal with [`ServiceError::is_fatal`].
    ///
    /// [`ServiceError::is_fatal`]: crate::errors::ServiceError::is_fatal
    pub async fn qualify(&self, day: Day) -> ServiceResult<QualifiedDay> {
        let inventory = self.service.get_stations(&self.query_for(day)).await?;
        let (stations, excluded) = self.filter(&inventory);

        for station in &excluded {
            warn!(
                "Skipping {} on {} (missing: {})",
                station.key,
                day,
                station.missing_channels.join(", ")
            );
        }
        debug!(
            "{}: {} qualifying station(s), {} excluded",
            day,
            stations.len(),
            excluded.len()
        );

        Ok(QualifiedDay {
            stations,
            inventory,
            excluded,
        })
    }

    fn filter(&self, inventory: &Inventory) -> (Vec<QualifiedStation>, Vec<ExcludedStation>) {
        // A station may be listed once per epoch; its channels are pooled
        let mut order: Vec<(StationKey, QualifiedStation, HashSet<&str>)> = Vec::new();
        for (network, station) in inventory.stations() {
            let key = StationKey::new(network, &station.code);
            match order.iter_mut().find(|(k, _, _)| *k == key) {
                Some((_, _, codes)) => codes.extend(station.channel_codes()),
                None => order.push((
                    key.clone(),
                    QualifiedStation {
                        key,
                        latitude: station.latitude,
                        longitude: station.longitude,
                        elevation: station.elevation,
                    },
                    station.channel_codes(),
                )),
            }
        }

        let mut qualified = Vec::new();
        let mut excluded = Vec::new();
        for (key, station, codes) in order {
            let missing: BTreeSet<&str> = self
                .region
                .required_channels
                .iter()
                .map(String::as_str)
                .filter(|required| !codes.contains(required))
                .collect();
            if missing.is_empty() {
                qualified.push(station);
            } else {
                excluded.push(ExcludedStation {
                    key,
                    missing_channels: missing.into_iter().map(str::to_string).collect(),
                });
            }
        }
        (qualified, excluded)
    }
}
