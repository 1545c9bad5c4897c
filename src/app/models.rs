//! Core data models for the acquisition archive
//!
//! Days, station identities and the time windows derived from them. These
//! types are shared by every component: the qualifier produces
//! [`QualifiedStation`]s, the archive layout turns a [`StationKey`] plus a
//! [`Day`] into paths, and the collaborators receive [`TimeWindow`]s.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{download, fdsn, files};

/// A calendar day of acquisition
pub type Day = NaiveDate;

/// Identity of a station: network code plus station code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationKey {
    pub network: String,
    pub station: String,
}

impl StationKey {
    pub fn new(network: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
        }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.network, self.station)
    }
}

/// A station that exposes every required channel on a given day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifiedStation {
    pub key: StationKey,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
}

impl QualifiedStation {
    /// Location of the station as a geographic point
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point, in degrees of arc
    pub fn distance_deg(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        (2.0 * a.sqrt().min(1.0).asin()).to_degrees()
    }
}

/// Half-open UTC time interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Full acquisition window of a day: midnight to the next midnight
    pub fn for_day(day: Day) -> Self {
        let start = day_start(day);
        Self {
            start,
            end: start + Duration::seconds(download::DAY_SECONDS),
        }
    }

    /// Inventory query window: the stations active at any instant of the day
    pub fn inventory_window(day: Day) -> Self {
        let start = day_start(day);
        Self {
            start,
            end: start + Duration::seconds(download::DAY_SECONDS) - Duration::microseconds(1),
        }
    }

    /// Window length in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Copy of this window with the end pulled back by one second
    ///
    /// Waveform requests stop one second short of the next day so that a
    /// day never claims the first sample of the following one.
    pub fn trimmed_end(&self) -> Self {
        Self {
            start: self.start,
            end: self.end - Duration::seconds(1),
        }
    }

    /// Format both bounds the way FDSN services expect them
    pub fn fdsn_bounds(&self) -> (String, String) {
        (
            self.start.format(fdsn::TIME_FORMAT).to_string(),
            self.end.format(fdsn::TIME_FORMAT).to_string(),
        )
    }
}

/// Midnight UTC at the start of a day
pub fn day_start(day: Day) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Directory/file label of a day (`YYYY-MM-DD`)
pub fn day_label(day: Day) -> String {
    day.format(files::DAY_FORMAT).to_string()
}

/// Iterate the days of an inclusive range
pub fn days_inclusive(start: Day, end: Day) -> impl Iterator<Item = Day> {
    start.iter_days().take_while(move |day| *day <= end)
}
