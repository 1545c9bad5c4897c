//! HTTP client for FDSN web services
//!
//! This module provides the station and event service client used by the
//! acquisition core. It is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core HTTP operations with rate limiting, backoff and typed
//!   failure classification
//! - `parse`: shared XML and timestamp helpers
//! - `stationxml`: StationXML inventory parser
//! - `quakeml`: QuakeML event catalog parser

use async_trait::async_trait;
use url::Url;

use crate::app::event::EventCatalog;
use crate::app::inventory::Inventory;
use crate::app::services::{EventQuery, EventService, StationQuery, StationService};
use crate::constants::fdsn;
use crate::errors::{ServiceError, ServiceResult};

pub mod config;
pub mod http;
pub mod parse;
pub mod quakeml;
pub mod stationxml;

pub use config::ClientConfig;

use http::HttpHandler;

/// Client for the station, event and dataselect services of one data centre
///
/// Station queries return StationXML at the requested detail level and
/// event queries return QuakeML.
#[derive(Debug)]
pub struct FdsnClient {
    http_handler: HttpHandler,
    base_url: Url,
}

impl FdsnClient {
    /// Creates a client for the data centre at `base_url`
    ///
    /// # Errors
    ///
    /// Returns `ServiceError` if the URL is invalid or the HTTP client cannot be built
    pub fn new(base_url: &str, config: &ClientConfig) -> ServiceResult<Self> {
        let base_url = Self::normalise_base(base_url)?;
        let http_handler = HttpHandler::new(config)?;

        tracing::info!("Created FDSN client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
        })
    }

    fn normalise_base(base_url: &str) -> ServiceResult<Url> {
        let with_slash = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        Url::parse(&with_slash).map_err(|_| ServiceError::InvalidUrl {
            url: base_url.to_string(),
        })
    }

    /// Get the base URL of the data centre
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Shared HTTP handler, also used by the waveform downloader
    pub fn http(&self) -> &HttpHandler {
        &self.http_handler
    }

    /// Build a service URL from a path and query pairs
    pub fn service_url(&self, path: &str, params: &[(&str, String)]) -> ServiceResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|_| ServiceError::InvalidUrl {
                url: format!("{}{}", self.base_url, path),
            })?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    fn station_url(&self, query: &StationQuery) -> ServiceResult<Url> {
        let (start, end) = query.window.fdsn_bounds();
        let mut params = vec![
            ("starttime", start),
            ("endtime", end),
            ("latitude", query.center.latitude.to_string()),
            ("longitude", query.center.longitude.to_string()),
            ("maxradius", query.max_radius_deg.to_string()),
            ("level", query.level.as_str().to_string()),
            ("format", "xml".to_string()),
            ("nodata", "404".to_string()),
        ];
        if !query.networks.is_empty() {
            params.push(("network", query.networks.join(",")));
        }
        self.service_url(fdsn::STATION_PATH, &params)
    }

    fn event_url(&self, query: &EventQuery) -> ServiceResult<Url> {
        let (start, end) = query.window.fdsn_bounds();
        let mut params = vec![
            ("starttime", start),
            ("endtime", end),
            ("latitude", query.center.latitude.to_string()),
            ("longitude", query.center.longitude.to_string()),
            ("maxradius", query.max_radius_deg.to_string()),
            ("minmagnitude", query.min_magnitude.to_string()),
            ("format", "xml".to_string()),
            ("nodata", "404".to_string()),
        ];
        if let Some(max) = query.max_magnitude {
            params.push(("maxmagnitude", max.to_string()));
        }
        self.service_url(fdsn::EVENT_PATH, &params)
    }
}

#[async_trait]
impl StationService for FdsnClient {
    async fn get_stations(&self, query: &StationQuery) -> ServiceResult<Inventory> {
        let url = self.station_url(query)?;
        match self.http_handler.get_text(&url).await? {
            Some(document) => stationxml::parse_station_xml(&document),
            None => Ok(Inventory::default()),
        }
    }
}

#[async_trait]
impl EventService for FdsnClient {
    async fn get_events(&self, query: &EventQuery) -> ServiceResult<EventCatalog> {
        let url = self.event_url(query)?;
        match self.http_handler.get_text(&url).await? {
            Some(document) => quakeml::parse_quakeml(&document),
            None => Ok(EventCatalog::empty()),
        }
    }
}
