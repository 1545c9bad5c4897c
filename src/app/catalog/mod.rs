//! Global station catalog
//!
//! The catalog records every station seen anywhere in the archive, once.
//! It is made of two documents under `{root}/Stations`: a flat list of
//! per-channel records and a merged inventory holding one instrument
//! definition per station. Both are loaded once, kept in memory with an
//! index of catalogued stations, and rewritten in full (atomically) only
//! when a merge introduces a new station.
//!
//! Deduplication is by `(network, station)`: once a station is catalogued,
//! later inventories are never scanned for new channels of it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::app::inventory::Inventory;
use crate::app::models::StationKey;
use crate::app::storage::{read_optional, write_json_atomic};
use crate::constants::files;
use crate::errors::{CatalogError, CatalogResult};

pub mod entry;

pub use entry::StationCatalogEntry;

#[derive(Debug)]
pub struct StationCatalog {
    records_path: PathBuf,
    inventory_path: PathBuf,
    records: Vec<StationCatalogEntry>,
    index: BTreeSet<StationKey>,
    /// Merged inventory, loaded on the first merge that needs it
    inventory: Option<Inventory>,
}

impl StationCatalog {
    /// Load the catalog kept in `stations_dir`
    ///
    /// A missing, unreadable or corrupt record file is treated as an empty
    /// catalog.
    pub async fn open(stations_dir: &Path) -> CatalogResult<Self> {
        let records_path = stations_dir.join(files::CATALOG_RECORDS);
        let inventory_path = stations_dir.join(files::CATALOG_INVENTORY);

        let records = Self::load_records(&records_path).await;
        let index: BTreeSet<StationKey> = records.iter().map(StationCatalogEntry::station_key).collect();

        debug!(
            "Opened station catalog with {} stations ({} records)",
            index.len(),
            records.len()
        );

        Ok(Self {
            records_path,
            inventory_path,
            records,
            index,
            inventory: None,
        })
    }

    async fn load_records(path: &Path) -> Vec<StationCatalogEntry> {
        match read_optional(path).await {
            Ok(Some(content)) => match serde_json::from_slice(&content) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Station catalog {} is corrupt, starting empty: {}", path.display(), e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Station catalog unreadable, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    async fn load_inventory(&self) -> CatalogResult<Inventory> {
        if let Some(inventory) = &self.inventory {
            return Ok(inventory.clone());
        }
        match read_optional(&self.inventory_path).await? {
            Some(content) => {
                serde_json::from_slice(&content).map_err(|source| CatalogError::CorruptInventory {
                    path: self.inventory_path.clone(),
                    source,
                })
            }
            None => Ok(Inventory::default()),
        }
    }

    /// Add every station of `slice` not yet catalogued
    ///
    /// Returns the keys of the stations that were added. Nothing is written
    /// when the slice holds only known stations.
    pub async fn merge(&mut self, slice: &Inventory) -> CatalogResult<Vec<StationKey>> {
        let mut added = Vec::new();
        let mut new_records = Vec::new();

        for (network, station) in slice.stations() {
            let key = StationKey::new(network, &station.code);
            if self.index.contains(&key) || added.contains(&key) {
                continue;
            }
            new_records.extend(
                station
                    .channels
                    .iter()
                    .map(|channel| StationCatalogEntry::from_channel(network, station, channel)),
            );
            added.push(key);
        }

        if added.is_empty() {
            return Ok(added);
        }

        let inventory = self.load_inventory().await?.merged_unique(slice);

        let mut records = self.records.clone();
        records.extend(new_records);
        write_json_atomic(&self.records_path, &records).await?;
        write_json_atomic(&self.inventory_path, &inventory).await?;

        self.records = records;
        self.index.extend(added.iter().cloned());
        self.inventory = Some(inventory);

        for key in &added {
            info!("Added to station catalog: {}", key);
        }
        Ok(added)
    }

    pub fn contains(&self, key: &StationKey) -> bool {
        self.index.contains(key)
    }

    /// Catalogued stations, in key order
    pub fn stations(&self) -> impl Iterator<Item = &StationKey> {
        self.index.iter()
    }

    pub fn records(&self) -> &[StationCatalogEntry] {
        &self.records
    }

    /// Number of catalogued stations
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    pub fn inventory_path(&self) -> &Path {
        &self.inventory_path
    }
}
