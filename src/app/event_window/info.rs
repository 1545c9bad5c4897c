//! Event directory naming and the `info.txt` description
//!
//! The description records where the waveforms came from and how the
//! epicentre was determined, with a short reading of the location method
//! and the arrival phases reported by the agency.

use std::fmt::Write;

use crate::app::event::{Event, Origin};
use crate::constants::events;

const UNKNOWN: &str = "Unknown";

/// Epicentre location data of one event, resolved from its preferred origin
#[derive(Debug, Clone, PartialEq)]
pub struct EventLocation<'a> {
    pub origin: &'a Origin,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub magnitude: f64,
}

impl<'a> EventLocation<'a> {
    /// Resolve an event; `None` without an origin or epicentre coordinates
    ///
    /// A missing depth reads as zero and a missing magnitude as 0.0.
    pub fn of(event: &'a Event) -> Option<Self> {
        let origin = event.origin()?;
        Some(Self {
            origin,
            latitude: origin.latitude?,
            longitude: origin.longitude?,
            depth_km: origin.depth.map(|m| (m / 100.0).round() / 10.0).unwrap_or(0.0),
            magnitude: event.magnitudes.first().map(|m| m.value).unwrap_or(0.0),
        })
    }

    /// Directory name: `{YYYYmmddTHHMMSS}_{lat}_{lon}_{depth}km_M{mag}`
    pub fn label(&self) -> String {
        format!(
            "{}_{:.2}_{:.2}_{:.1}km_M{:.1}",
            self.origin.time.format(events::LABEL_TIME_FORMAT),
            self.latitude,
            self.longitude,
            self.depth_km,
            self.magnitude
        )
    }
}

/// How the agency located the epicentre
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationMethod {
    HypoInverse,
    Hypo71,
    Undeclared,
    Declared(String),
}

impl LocationMethod {
    pub fn classify(method_id: Option<&str>) -> Self {
        let Some(id) = method_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return LocationMethod::Undeclared;
        };
        let lower = id.to_lowercase();
        if lower.contains("hypoinverse") {
            LocationMethod::HypoInverse
        } else if lower.contains("hypo71") {
            LocationMethod::Hypo71
        } else if id == UNKNOWN || id.contains("NA") {
            LocationMethod::Undeclared
        } else {
            LocationMethod::Declared(id.to_string())
        }
    }

    pub fn label(&self) -> String {
        match self {
            LocationMethod::HypoInverse => "HypoInverse (arrival-time method)".to_string(),
            LocationMethod::Hypo71 => "Hypo71 (arrival-time method)".to_string(),
            LocationMethod::Undeclared => {
                "Undeclared (likely HypoInverse or similar local algorithm)".to_string()
            }
            LocationMethod::Declared(id) => id.clone(),
        }
    }

    pub fn interpretation(&self) -> &'static str {
        match self {
            LocationMethod::HypoInverse | LocationMethod::Hypo71 => {
                "Local epicenter determined via arrival-time inversion of P and S phases."
            }
            LocationMethod::Undeclared => {
                "Method not declared, likely computed by a local network using P and S arrivals (e.g. HypoInverse)."
            }
            LocationMethod::Declared(_) => "Epicenter method explicitly provided by agency.",
        }
    }
}

/// Reading of the arrival phases used for the location
pub fn phase_comment(phases: &[String]) -> &'static str {
    if phases.is_empty() {
        "No phase data reported, possibly automatic centroid solution."
    } else if phases.iter().any(|p| p == "PKS") {
        "PKS phases were used in epicenter determination."
    } else {
        "PKS phases not reported, likely only P and S arrivals used."
    }
}

/// Distinct upper-cased arrival phases in sorted order
fn used_phases(origin: &Origin) -> Vec<String> {
    let mut phases: Vec<String> = origin
        .unique_phases()
        .into_iter()
        .map(|p| p.to_uppercase())
        .collect();
    phases.sort();
    phases.dedup();
    phases
}

/// Render the `info.txt` description of an archived event
pub fn render_info(event: &Event, location: &EventLocation<'_>, providers: &[String]) -> String {
    let origin = location.origin;
    let creation = origin.creation_info.as_ref();
    let method = LocationMethod::classify(origin.method_id.as_deref());
    let phases = used_phases(origin);
    let or_unknown = |value: Option<&str>| value.unwrap_or(UNKNOWN).to_string();

    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "==== EVENT INFORMATION ====");
    let _ = writeln!(out, "Event ID: {}", location.label());
    let _ = writeln!(out, "Time (UTC): {}", origin.time.format("%Y-%m-%dT%H:%M:%S%.6fZ"));
    let _ = writeln!(out, "Latitude: {}", location.latitude);
    let _ = writeln!(out, "Longitude: {}", location.longitude);
    let _ = writeln!(out, "Depth (km): {}", location.depth_km);
    let _ = writeln!(out, "Magnitude: {:.1}", location.magnitude);
    let _ = writeln!(out, "Downloaded from: {}", providers.join(", "));

    let _ = writeln!(out, "\n==== EPICENTER DETERMINATION ====");
    let _ = writeln!(out, "Agency: {}", or_unknown(creation.and_then(|c| c.agency_id.as_deref())));
    let _ = writeln!(out, "Method: {}", method.label());
    let _ = writeln!(out, "Origin Type: {}", or_unknown(origin.origin_type.as_deref()));
    let _ = writeln!(
        out,
        "Evaluation Mode: {}",
        origin.evaluation_mode.as_deref().unwrap_or("automatic")
    );
    let _ = writeln!(
        out,
        "Evaluation Status: {}",
        origin.evaluation_status.as_deref().unwrap_or("preliminary")
    );
    let _ = writeln!(out, "Earth Model: {}", or_unknown(origin.earth_model_id.as_deref()));
    let phase_list = if phases.is_empty() {
        UNKNOWN.to_string()
    } else {
        phases.join(", ")
    };
    let _ = writeln!(out, "Used Phases: {}", phase_list);
    let _ = writeln!(out, "{}", phase_comment(&phases));

    let _ = writeln!(out, "\n==== INTERPRETATION ====");
    let _ = writeln!(out, "{}", method.interpretation());

    let _ = writeln!(out, "\n==== DATA ATTRIBUTES ====");
    let _ = writeln!(out, "Resource ID: {}", or_unknown(event.resource_id.as_deref()));
    let _ = writeln!(out, "Origin Resource ID: {}", or_unknown(origin.resource_id.as_deref()));
    let creation_time = creation
        .and_then(|c| c.creation_time)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let _ = writeln!(out, "Creation Time: {}", creation_time);
    let _ = writeln!(out, "Author: {}", or_unknown(creation.and_then(|c| c.author.as_deref())));
    out
}
