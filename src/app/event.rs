//! Event catalog model and the per-event summary written to `method.json`

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events of one query, together with the QuakeML document they were parsed from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCatalog {
    pub raw: String,
    pub events: Vec<Event>,
}

impl EventCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Summaries of every event that has an origin
    pub fn summaries(&self) -> Vec<EventSummary> {
        self.events.iter().filter_map(EventSummary::from_event).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub resource_id: Option<String>,
    /// Index into `origins` of the preferred origin
    pub preferred_origin: Option<usize>,
    pub origins: Vec<Origin>,
    pub magnitudes: Vec<Magnitude>,
}

impl Event {
    /// Preferred origin, falling back to the first one
    pub fn origin(&self) -> Option<&Origin> {
        self.preferred_origin
            .and_then(|i| self.origins.get(i))
            .or_else(|| self.origins.first())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub resource_id: Option<String>,
    pub time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Depth in metres
    pub depth: Option<f64>,
    pub method_id: Option<String>,
    pub earth_model_id: Option<String>,
    pub quality: Option<OriginQuality>,
    pub origin_type: Option<String>,
    pub evaluation_mode: Option<String>,
    pub evaluation_status: Option<String>,
    pub creation_info: Option<CreationInfo>,
    pub arrivals: Vec<Arrival>,
}

impl Origin {
    /// Distinct arrival phases in sorted order
    pub fn unique_phases(&self) -> Vec<String> {
        let phases: BTreeSet<&str> = self
            .arrivals
            .iter()
            .map(|a| a.phase.trim())
            .filter(|p| !p.is_empty())
            .collect();
        phases.into_iter().map(str::to_string).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationInfo {
    pub agency_id: Option<String>,
    pub author: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OriginQuality {
    pub used_phase_count: Option<u32>,
    pub used_station_count: Option<u32>,
    pub standard_error: Option<f64>,
    pub azimuthal_gap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrival {
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnitude {
    pub value: f64,
    pub magnitude_type: Option<String>,
}

/// One row of the per-day `method.json` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: Option<String>,
    pub time: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    pub method: Option<String>,
    pub earth_model: Option<String>,
    pub used_phase_count: Option<u32>,
    pub used_station_count: Option<u32>,
    pub standard_error: Option<f64>,
    pub azimuthal_gap: Option<f64>,
    pub unique_phases: Vec<String>,
    pub magnitude: Option<f64>,
    pub magnitude_type: Option<String>,
}

impl EventSummary {
    /// Summarise an event; events without any origin are skipped
    pub fn from_event(event: &Event) -> Option<Self> {
        let origin = event.origin()?;
        let quality = origin.quality.clone().unwrap_or_default();
        let magnitude = event.magnitudes.first();

        Some(Self {
            event_id: event.resource_id.clone(),
            time: origin.time.to_rfc3339(),
            latitude: origin.latitude,
            longitude: origin.longitude,
            depth_km: origin.depth.map(|m| m / 1000.0),
            method: origin.method_id.clone(),
            earth_model: origin.earth_model_id.clone(),
            used_phase_count: quality.used_phase_count,
            used_station_count: quality.used_station_count,
            standard_error: quality.standard_error,
            azimuthal_gap: quality.azimuthal_gap,
            unique_phases: origin.unique_phases(),
            magnitude: magnitude.map(|m| m.value),
            magnitude_type: magnitude.and_then(|m| m.magnitude_type.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn origin(depth: Option<f64>, phases: &[&str]) -> Origin {
        Origin {
            resource_id: None,
            time: Utc.with_ymd_and_hms(2012, 1, 1, 3, 4, 5).unwrap(),
            latitude: Some(36.5),
            longitude: Some(25.6),
            depth,
            method_id: Some("smi:local/HypoInverse".to_string()),
            earth_model_id: None,
            quality: Some(OriginQuality {
                used_phase_count: Some(12),
                ..Default::default()
            }),
            origin_type: None,
            evaluation_mode: None,
            evaluation_status: None,
            creation_info: None,
            arrivals: phases
                .iter()
                .map(|p| Arrival {
                    phase: p.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_summary_uses_preferred_origin() {
        let event = Event {
            resource_id: Some("noa2012abcd".to_string()),
            preferred_origin: Some(1),
            origins: vec![origin(Some(1000.0), &[]), origin(Some(12_500.0), &["S", "P", "P"])],
            magnitudes: vec![Magnitude {
                value: 2.7,
                magnitude_type: Some("ML".to_string()),
            }],
        };

        let summary = EventSummary::from_event(&event).unwrap();
        assert_eq!(summary.depth_km, Some(12.5));
        assert_eq!(summary.unique_phases, vec!["P", "S"]);
        assert_eq!(summary.used_phase_count, Some(12));
        assert_eq!(summary.standard_error, None);
        assert_eq!(summary.magnitude_type.as_deref(), Some("ML"));
    }

    #[test]
    fn test_summary_skips_events_without_origin() {
        let catalog = EventCatalog {
            raw: "raw".to_string(),
            events: vec![Event::default(), Event {
                origins: vec![origin(None, &[])],
                ..Default::default()
            }],
        };

        let summaries = catalog.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].depth_km, None);
        assert!(summaries[0].unique_phases.is_empty());
    }
}
