//! Station inventory model
//!
//! An [`Inventory`] is the networks → stations → channels → response tree
//! returned by the station service. It is also the shape of the merged
//! inventory document kept by the station catalog, so it carries the
//! operations that document needs: selecting one station, listing station
//! keys and merging with one definition per station.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::StationKey;

/// Networks → stations → channels tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub networks: Vec<InventoryNetwork>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryNetwork {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stations: Vec<InventoryStation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryStation {
    pub code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub channels: Vec<InventoryChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryChannel {
    pub code: String,
    #[serde(default)]
    pub location_code: String,
    #[serde(default)]
    pub depth: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sample_rate: Option<f64>,
    #[serde(default)]
    pub sensor: Option<Equipment>,
    #[serde(default)]
    pub data_logger: Option<Equipment>,
    #[serde(default)]
    pub response: Option<Response>,
}

/// Sensor or datalogger description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Instrument response of one channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub instrument_sensitivity: Option<Sensitivity>,
    #[serde(default)]
    pub stages: Vec<ResponseStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    pub value: f64,
    pub frequency: f64,
    #[serde(default)]
    pub input_units: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStage {
    #[serde(default)]
    pub stage_gain: Option<f64>,
    #[serde(default)]
    pub poles: Vec<Complex>,
    #[serde(default)]
    pub zeros: Vec<Complex>,
}

/// A pole or zero of a transfer function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub real: f64,
    pub imaginary: f64,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.networks.iter().all(|n| n.stations.is_empty())
    }

    /// Iterate every station together with its network code
    pub fn stations(&self) -> impl Iterator<Item = (&str, &InventoryStation)> {
        self.networks
            .iter()
            .flat_map(|n| n.stations.iter().map(move |s| (n.code.as_str(), s)))
    }

    /// Keys of all stations, in listing order
    pub fn station_keys(&self) -> Vec<StationKey> {
        self.stations()
            .map(|(net, sta)| StationKey::new(net, &sta.code))
            .collect()
    }

    /// Sub-inventory holding only the given station
    pub fn select(&self, key: &StationKey) -> Inventory {
        let networks = self
            .networks
            .iter()
            .filter(|n| n.code == key.network)
            .filter_map(|n| {
                let stations: Vec<InventoryStation> = n
                    .stations
                    .iter()
                    .filter(|s| s.code == key.station)
                    .cloned()
                    .collect();
                (!stations.is_empty()).then(|| InventoryNetwork {
                    code: n.code.clone(),
                    description: n.description.clone(),
                    stations,
                })
            })
            .collect();
        Inventory { networks }
    }

    /// Concatenate `other` after `self` and keep one definition per station
    ///
    /// The first definition seen for a `(network, station)` key wins, so an
    /// already stored station is never replaced by a later copy.
    pub fn merged_unique(&self, other: &Inventory) -> Inventory {
        let mut seen: HashSet<StationKey> = HashSet::new();
        let mut merged = Inventory::default();

        for network in self.networks.iter().chain(other.networks.iter()) {
            for station in &network.stations {
                let key = StationKey::new(&network.code, &station.code);
                if !seen.insert(key) {
                    continue;
                }
                merged.network_mut(network).stations.push(station.clone());
            }
        }

        merged.networks.retain(|n| !n.stations.is_empty());
        merged
    }

    fn network_mut(&mut self, template: &InventoryNetwork) -> &mut InventoryNetwork {
        let index = match self.networks.iter().position(|n| n.code == template.code) {
            Some(index) => index,
            None => {
                self.networks.push(InventoryNetwork {
                    code: template.code.clone(),
                    description: template.description.clone(),
                    stations: Vec::new(),
                });
                self.networks.len() - 1
            }
        };
        &mut self.networks[index]
    }
}

impl InventoryStation {
    /// Distinct channel codes of this station
    pub fn channel_codes(&self) -> HashSet<&str> {
        self.channels.iter().map(|c| c.code.as_str()).collect()
    }

    /// Channels whose code matches an FDSN wildcard pattern
    pub fn channels_matching<'a>(
        &'a self,
        pattern: &'a str,
    ) -> impl Iterator<Item = &'a InventoryChannel> + 'a {
        self.channels
            .iter()
            .filter(move |c| matches_pattern(pattern, &c.code))
    }
}

/// Match a code against an FDSN wildcard pattern (`*` and `?`)
pub fn matches_pattern(pattern: &str, code: &str) -> bool {
    fn matches(p: &[char], c: &[char]) -> bool {
        match (p.first(), c.first()) {
            (None, None) => true,
            (Some('*'), _) => matches(&p[1..], c) || (!c.is_empty() && matches(p, &c[1..])),
            (Some('?'), Some(_)) => matches(&p[1..], &c[1..]),
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => matches(&p[1..], &c[1..]),
            _ => false,
        }
    }

    let p: Vec<char> = pattern.chars().collect();
    let c: Vec<char> = code.chars().collect();
    matches(&p, &c)
}
