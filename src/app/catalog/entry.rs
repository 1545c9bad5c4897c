//! Flat catalog record of one station channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::inventory::{Complex, InventoryChannel, InventoryStation};
use crate::app::models::StationKey;

/// One row of `Stations_All.json`
///
/// Every response-derived field is optional: a channel without a response,
/// sensitivity or stage still produces a record, with nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationCatalogEntry {
    pub network: String,
    pub station: String,
    pub channel: String,
    #[serde(default)]
    pub location_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    pub depth_m: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sampling_rate: Option<f64>,
    pub sensor_model: Option<String>,
    pub sensor_manufacturer: Option<String>,
    pub data_logger_model: Option<String>,
    pub sensitivity_value: Option<f64>,
    pub sensitivity_frequency: Option<f64>,
    pub stage_gain: Option<f64>,
    #[serde(default)]
    pub poles: Vec<Complex>,
    #[serde(default)]
    pub zeros: Vec<Complex>,
}

impl StationCatalogEntry {
    pub fn from_channel(network: &str, station: &InventoryStation, channel: &InventoryChannel) -> Self {
        let response = channel.response.as_ref();
        let sensitivity = response.and_then(|r| r.instrument_sensitivity.as_ref());
        // The first stage carries the sensor's transfer function
        let first_stage = response.and_then(|r| r.stages.first());

        Self {
            network: network.to_string(),
            station: station.code.clone(),
            channel: channel.code.clone(),
            location_code: channel.location_code.clone(),
            latitude: station.latitude,
            longitude: station.longitude,
            elevation_m: station.elevation,
            depth_m: channel.depth,
            start_date: channel.start_date,
            end_date: channel.end_date,
            sampling_rate: channel.sample_rate,
            sensor_model: channel.sensor.as_ref().and_then(|s| s.model.clone()),
            sensor_manufacturer: channel.sensor.as_ref().and_then(|s| s.manufacturer.clone()),
            data_logger_model: channel.data_logger.as_ref().and_then(|d| d.model.clone()),
            sensitivity_value: sensitivity.map(|s| s.value),
            sensitivity_frequency: sensitivity.map(|s| s.frequency),
            stage_gain: first_stage.and_then(|s| s.stage_gain),
            poles: first_stage.map(|s| s.poles.clone()).unwrap_or_default(),
            zeros: first_stage.map(|s| s.zeros.clone()).unwrap_or_default(),
        }
    }

    pub fn station_key(&self) -> StationKey {
        StationKey::new(&self.network, &self.station)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::inventory::tests::station;
    use crate::app::inventory::{Equipment, Response, ResponseStage, Sensitivity};

    #[test]
    fn test_channel_without_response_yields_nulls() {
        let sta = station("SANT", &["HHZ"]);
        let entry = StationCatalogEntry::from_channel("HL", &sta, &sta.channels[0]);

        assert_eq!(entry.station_key(), StationKey::new("HL", "SANT"));
        assert_eq!(entry.sampling_rate, Some(100.0));
        assert!(entry.sensitivity_value.is_none());
        assert!(entry.stage_gain.is_none());
        assert!(entry.poles.is_empty());
    }

    #[test]
    fn test_response_fields_are_extracted() {
        let mut sta = station("SANT", &["HHZ"]);
        sta.channels[0].sensor = Some(Equipment {
            model: Some("CMG-3ESPC".to_string()),
            manufacturer: Some("Guralp".to_string()),
            description: None,
        });
        sta.channels[0].response = Some(Response {
            instrument_sensitivity: Some(Sensitivity {
                value: 1.5e9,
                frequency: 1.0,
                input_units: Some("M/S".to_string()),
            }),
            stages: vec![ResponseStage {
                stage_gain: Some(2000.0),
                poles: vec![Complex {
                    real: -0.037,
                    imaginary: 0.037,
                }],
                zeros: Vec::new(),
            }],
        });

        let entry = StationCatalogEntry::from_channel("HL", &sta, &sta.channels[0]);
        assert_eq!(entry.sensor_model.as_deref(), Some("CMG-3ESPC"));
        assert_eq!(entry.sensitivity_value, Some(1.5e9));
        assert_eq!(entry.stage_gain, Some(2000.0));
        assert_eq!(entry.poles.len(), 1);
        assert!(entry.data_logger_model.is_none());
    }
}
