//! Shared helpers for FDSN documents
//!
//! The station and event services both answer in XML. Each document is
//! deserialized into a private wire representation with `quick-xml` and
//! then converted into the crate's own models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;

use crate::errors::{ServiceError, ServiceResult};

/// Deserialize an XML document into its wire representation
pub fn from_xml<T: DeserializeOwned>(document: &str, kind: &str) -> ServiceResult<T> {
    quick_xml::de::from_str(document).map_err(|e| ServiceError::Parse {
        reason: format!("{}: {}", kind, e),
    })
}

/// Parse an FDSN timestamp (`2012-01-01T00:00:00[.ffffff][Z]`)
pub fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let bare = value.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(bare, fmt).ok())
        .map(|naive| naive.and_utc())
}
