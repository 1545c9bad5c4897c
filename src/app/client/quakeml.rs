//! QuakeML event catalog parser
//!
//! Reads the parts of a QuakeML 1.2 document that the archive records per
//! event: every origin with its method and earth model identifiers, its
//! quality statistics and arrival phases, plus the magnitudes. The raw
//! document is kept alongside so it can be stored unchanged.

use serde::Deserialize;

use crate::app::event::{Arrival, CreationInfo, Event, EventCatalog, Magnitude, Origin, OriginQuality};
use crate::errors::{ServiceError, ServiceResult};

use super::parse::{from_xml, parse_time};

#[derive(Debug, Deserialize)]
struct QuakeMl {
    #[serde(rename = "eventParameters")]
    parameters: Option<XmlEventParameters>,
}

#[derive(Debug, Deserialize)]
struct XmlEventParameters {
    #[serde(rename = "event", default)]
    events: Vec<XmlEvent>,
}

#[derive(Debug, Deserialize)]
struct XmlEvent {
    #[serde(rename = "@publicID")]
    public_id: Option<String>,
    #[serde(rename = "preferredOriginID")]
    preferred_origin_id: Option<String>,
    #[serde(rename = "origin", default)]
    origins: Vec<XmlOrigin>,
    #[serde(rename = "magnitude", default)]
    magnitudes: Vec<XmlMagnitude>,
}

#[derive(Debug, Deserialize)]
struct XmlOrigin {
    #[serde(rename = "@publicID")]
    public_id: Option<String>,
    time: XmlValue<String>,
    latitude: Option<XmlValue<f64>>,
    longitude: Option<XmlValue<f64>>,
    depth: Option<XmlValue<f64>>,
    #[serde(rename = "methodID")]
    method_id: Option<String>,
    #[serde(rename = "earthModelID")]
    earth_model_id: Option<String>,
    quality: Option<XmlQuality>,
    #[serde(rename = "type")]
    origin_type: Option<String>,
    #[serde(rename = "evaluationMode")]
    evaluation_mode: Option<String>,
    #[serde(rename = "evaluationStatus")]
    evaluation_status: Option<String>,
    #[serde(rename = "creationInfo")]
    creation_info: Option<XmlCreationInfo>,
    #[serde(rename = "arrival", default)]
    arrivals: Vec<XmlArrival>,
}

/// QuakeML quantity: the value plus optional uncertainties, which are ignored
#[derive(Debug, Deserialize)]
struct XmlValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct XmlQuality {
    #[serde(rename = "usedPhaseCount")]
    used_phase_count: Option<u32>,
    #[serde(rename = "usedStationCount")]
    used_station_count: Option<u32>,
    #[serde(rename = "standardError")]
    standard_error: Option<f64>,
    #[serde(rename = "azimuthalGap")]
    azimuthal_gap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct XmlCreationInfo {
    #[serde(rename = "agencyID")]
    agency_id: Option<String>,
    author: Option<String>,
    #[serde(rename = "creationTime")]
    creation_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlArrival {
    phase: String,
}

#[derive(Debug, Deserialize)]
struct XmlMagnitude {
    mag: XmlValue<f64>,
    #[serde(rename = "type")]
    magnitude_type: Option<String>,
}

/// Parse a QuakeML document into a catalog that keeps the raw document
///
/// # Errors
///
/// Returns [`ServiceError::Parse`] when the document is not QuakeML or an
/// origin time cannot be read.
pub fn parse_quakeml(document: &str) -> ServiceResult<EventCatalog> {
    let parsed: QuakeMl = from_xml(document, "QuakeML")?;
    let events = parsed
        .parameters
        .map(|p| p.events)
        .unwrap_or_default()
        .into_iter()
        .map(event)
        .collect::<ServiceResult<Vec<_>>>()?;

    Ok(EventCatalog {
        raw: document.to_string(),
        events,
    })
}

fn event(xml: XmlEvent) -> ServiceResult<Event> {
    let origins = xml
        .origins
        .into_iter()
        .map(origin)
        .collect::<ServiceResult<Vec<_>>>()?;
    let preferred_origin = xml.preferred_origin_id.as_deref().and_then(|id| {
        origins
            .iter()
            .position(|o| o.resource_id.as_deref() == Some(id.trim()))
    });

    Ok(Event {
        resource_id: xml.public_id,
        preferred_origin,
        origins,
        magnitudes: xml
            .magnitudes
            .into_iter()
            .map(|m| Magnitude {
                value: m.mag.value,
                magnitude_type: m.magnitude_type,
            })
            .collect(),
    })
}

fn origin(xml: XmlOrigin) -> ServiceResult<Origin> {
    let time = parse_time(&xml.time.value).ok_or_else(|| ServiceError::Parse {
        reason: format!("QuakeML: invalid origin time '{}'", xml.time.value),
    })?;

    Ok(Origin {
        resource_id: xml.public_id,
        time,
        latitude: xml.latitude.map(|v| v.value),
        longitude: xml.longitude.map(|v| v.value),
        depth: xml.depth.map(|v| v.value),
        method_id: xml.method_id,
        earth_model_id: xml.earth_model_id,
        quality: xml.quality.map(|q| OriginQuality {
            used_phase_count: q.used_phase_count,
            used_station_count: q.used_station_count,
            standard_error: q.standard_error,
            azimuthal_gap: q.azimuthal_gap,
        }),
        origin_type: xml.origin_type,
        evaluation_mode: xml.evaluation_mode,
        evaluation_status: xml.evaluation_status,
        creation_info: xml.creation_info.map(|c| CreationInfo {
            agency_id: c.agency_id,
            author: c.author,
            creation_time: c.creation_time.as_deref().and_then(parse_time),
        }),
        arrivals: xml
            .arrivals
            .into_iter()
            .map(|a| Arrival { phase: a.phase })
            .collect(),
    })
}
