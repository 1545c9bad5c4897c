//! Per-day event metadata capture
//!
//! The event catalog of a day is requested once and reused for every
//! station acquired that day. Each station's `EventsInfo` directory
//! receives the raw QuakeML document and a `method.json` summary with one
//! entry per event.

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::coordinator::config::RegionConfig;
use crate::app::event::EventCatalog;
use crate::app::models::{Day, StationKey, TimeWindow};
use crate::app::services::{EventQuery, EventService};
use crate::app::storage::{write_atomic, write_json_atomic, ArchiveLayout};
use crate::errors::Result;

pub struct EventCapture {
    service: Arc<dyn EventService>,
    region: RegionConfig,
    /// Catalog of the day currently being acquired
    memo: Option<(Day, Arc<EventCatalog>)>,
}

impl EventCapture {
    pub fn new(service: Arc<dyn EventService>, region: RegionConfig) -> Self {
        Self {
            service,
            region,
            memo: None,
        }
    }

    pub fn query_for(&self, day: Day) -> EventQuery {
        EventQuery {
            window: TimeWindow::for_day(day),
            center: self.region.center(),
            max_radius_deg: self.region.station_radius_deg,
            min_magnitude: self.region.min_event_magnitude,
            max_magnitude: None,
        }
    }

    async fn catalog_for(&mut self, day: Day) -> Result<Arc<EventCatalog>> {
        if let Some((memo_day, catalog)) = &self.memo {
            if *memo_day == day {
                return Ok(Arc::clone(catalog));
            }
        }

        let catalog = Arc::new(self.service.get_events(&self.query_for(day)).await?);
        debug!("Fetched {} event(s) for {}", catalog.len(), day);
        self.memo = Some((day, Arc::clone(&catalog)));
        Ok(catalog)
    }

    /// Write the day's events next to a station's waveforms
    ///
    /// Returns the number of events written. An empty catalog writes nothing.
    pub async fn capture(&mut self, layout: &ArchiveLayout, key: &StationKey, day: Day) -> Result<usize> {
        let catalog = self.catalog_for(day).await?;
        if catalog.is_empty() {
            info!("No events found for {} in the region", day);
            return Ok(0);
        }

        let document = layout.event_document(key, day);
        write_atomic(&document, catalog.raw.as_bytes()).await?;

        let summaries = catalog.summaries();
        write_json_atomic(&layout.event_summary(key, day), &summaries).await?;

        debug!(
            "Saved {} event(s) for {} to {}",
            summaries.len(),
            key,
            document.display()
        );
        Ok(catalog.len())
    }
}
