//! FDSN StationXML parser
//!
//! Station queries are made with `level=response`, so every channel
//! carries its overall sensitivity and the response stages with their
//! gains and poles/zeros. Elements the archive does not use are ignored.

use serde::Deserialize;

use crate::app::inventory::{
    Complex, Equipment, Inventory, InventoryChannel, InventoryNetwork, InventoryStation, Response,
    ResponseStage, Sensitivity,
};
use crate::errors::ServiceResult;

use super::parse::{from_xml, parse_time};

#[derive(Debug, Deserialize)]
struct StationXml {
    #[serde(rename = "Network", default)]
    networks: Vec<XmlNetwork>,
}

#[derive(Debug, Deserialize)]
struct XmlNetwork {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Station", default)]
    stations: Vec<XmlStation>,
}

#[derive(Debug, Deserialize)]
struct XmlStation {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "Latitude")]
    latitude: Measured,
    #[serde(rename = "Longitude")]
    longitude: Measured,
    #[serde(rename = "Elevation")]
    elevation: Measured,
    #[serde(rename = "Site")]
    site: Option<XmlSite>,
    #[serde(rename = "Channel", default)]
    channels: Vec<XmlChannel>,
}

#[derive(Debug, Deserialize)]
struct XmlSite {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlChannel {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@locationCode", default)]
    location_code: String,
    #[serde(rename = "@startDate")]
    start_date: Option<String>,
    #[serde(rename = "@endDate")]
    end_date: Option<String>,
    #[serde(rename = "Depth")]
    depth: Option<Measured>,
    #[serde(rename = "SampleRate")]
    sample_rate: Option<Measured>,
    #[serde(rename = "Sensor")]
    sensor: Option<XmlEquipment>,
    #[serde(rename = "DataLogger")]
    data_logger: Option<XmlEquipment>,
    #[serde(rename = "Response")]
    response: Option<XmlResponse>,
}

#[derive(Debug, Deserialize)]
struct XmlEquipment {
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Manufacturer")]
    manufacturer: Option<String>,
    #[serde(rename = "Model")]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlResponse {
    #[serde(rename = "InstrumentSensitivity")]
    instrument_sensitivity: Option<XmlSensitivity>,
    #[serde(rename = "Stage", default)]
    stages: Vec<XmlStage>,
}

#[derive(Debug, Deserialize)]
struct XmlSensitivity {
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "Frequency")]
    frequency: f64,
    #[serde(rename = "InputUnits")]
    input_units: Option<XmlUnits>,
}

#[derive(Debug, Deserialize)]
struct XmlUnits {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct XmlStage {
    #[serde(rename = "PolesZeros")]
    poles_zeros: Option<XmlPolesZeros>,
    #[serde(rename = "StageGain")]
    stage_gain: Option<XmlGain>,
}

#[derive(Debug, Deserialize)]
struct XmlPolesZeros {
    #[serde(rename = "Zero", default)]
    zeros: Vec<XmlComplex>,
    #[serde(rename = "Pole", default)]
    poles: Vec<XmlComplex>,
}

#[derive(Debug, Deserialize)]
struct XmlGain {
    #[serde(rename = "Value")]
    value: f64,
}

#[derive(Debug, Deserialize)]
struct XmlComplex {
    #[serde(rename = "Real")]
    real: Measured,
    #[serde(rename = "Imaginary")]
    imaginary: Measured,
}

/// Numeric element that may carry unit or error attributes
#[derive(Debug, Deserialize)]
struct Measured {
    #[serde(rename = "$text")]
    value: f64,
}

/// Parse a StationXML document into an inventory
pub fn parse_station_xml(document: &str) -> ServiceResult<Inventory> {
    let parsed: StationXml = from_xml(document, "StationXML")?;
    Ok(Inventory {
        networks: parsed.networks.into_iter().map(network).collect(),
    })
}

fn network(xml: XmlNetwork) -> InventoryNetwork {
    InventoryNetwork {
        code: xml.code,
        description: xml.description,
        stations: xml.stations.into_iter().map(station).collect(),
    }
}

fn station(xml: XmlStation) -> InventoryStation {
    InventoryStation {
        code: xml.code,
        latitude: xml.latitude.value,
        longitude: xml.longitude.value,
        elevation: xml.elevation.value,
        site_name: xml.site.and_then(|s| s.name),
        channels: xml.channels.into_iter().map(channel).collect(),
    }
}

fn channel(xml: XmlChannel) -> InventoryChannel {
    InventoryChannel {
        code: xml.code,
        location_code: xml.location_code.trim().to_string(),
        depth: xml.depth.map(|d| d.value),
        start_date: xml.start_date.as_deref().and_then(parse_time),
        end_date: xml.end_date.as_deref().and_then(parse_time),
        sample_rate: xml.sample_rate.map(|r| r.value),
        sensor: xml.sensor.map(equipment),
        data_logger: xml.data_logger.map(equipment),
        response: xml.response.map(response),
    }
}

fn equipment(xml: XmlEquipment) -> Equipment {
    Equipment {
        model: xml.model,
        manufacturer: xml.manufacturer,
        description: xml.description,
    }
}

fn response(xml: XmlResponse) -> Response {
    Response {
        instrument_sensitivity: xml.instrument_sensitivity.map(|s| Sensitivity {
            value: s.value,
            frequency: s.frequency,
            input_units: s.input_units.map(|u| u.name),
        }),
        stages: xml
            .stages
            .into_iter()
            .map(|stage| {
                let (poles, zeros) = match stage.poles_zeros {
                    Some(pz) => (complexes(pz.poles), complexes(pz.zeros)),
                    None => (Vec::new(), Vec::new()),
                };
                ResponseStage {
                    stage_gain: stage.stage_gain.map(|g| g.value),
                    poles,
                    zeros,
                }
            })
            .collect(),
    }
}

fn complexes(values: Vec<XmlComplex>) -> Vec<Complex> {
    values
        .into_iter()
        .map(|c| Complex {
            real: c.real.value,
            imaginary: c.imaginary.value,
        })
        .collect()
}
