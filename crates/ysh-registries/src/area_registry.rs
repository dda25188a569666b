//! Area Registry
//!
//! Areas are the rooms devices and entities are assigned to. Their names are
//! what Yandex shows as the device room.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::storage::{Storable, Storage, StorageResult};

pub const STORAGE_KEY: &str = "core.area_registry";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 6;

/// A registered area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaEntry {
    pub id: String,

    /// Display name (e.g. "Кухня")
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_id: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl AreaEntry {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            name: name.into(),
            aliases: Vec::new(),
            floor_id: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Case- and whitespace-insensitive key used for name lookups
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaRegistryData {
    pub areas: Vec<AreaEntry>,
}

impl Storable for AreaRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Area Registry
///
/// Entries are stored as `Arc<AreaEntry>` so lookups never clone the entry.
#[derive(Default)]
pub struct AreaRegistry {
    /// Primary index: area_id -> entry
    by_id: DashMap<String, Arc<AreaEntry>>,

    /// Index: normalized name -> area_id
    by_name: DashMap<String, String>,
}

impl AreaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, storage: &Storage) -> StorageResult<()> {
        if let Some(file) = storage.load::<AreaRegistryData>().await? {
            info!("Loading {} areas from storage", file.data.areas.len());
            for entry in file.data.areas {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    pub async fn save(&self, storage: &Storage) -> StorageResult<()> {
        let mut areas: Vec<AreaEntry> = self.by_id.iter().map(|r| (**r.value()).clone()).collect();
        areas.sort_by_key(|a| a.created_at);
        storage.save(AreaRegistryData { areas }).await?;
        debug!("Saved {} areas to storage", self.by_id.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<AreaEntry>) {
        self.by_name
            .insert(normalize_name(&entry.name), entry.id.clone());
        self.by_id.insert(entry.id.clone(), entry);
    }

    pub fn get(&self, area_id: &str) -> Option<Arc<AreaEntry>> {
        self.by_id.get(area_id).map(|r| Arc::clone(r.value()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<AreaEntry>> {
        self.by_name
            .get(&normalize_name(name))
            .and_then(|area_id| self.get(&area_id))
    }

    /// Return the area with this name, creating it if needed
    pub fn get_or_create(&self, name: &str) -> Arc<AreaEntry> {
        if let Some(existing) = self.get_by_name(name) {
            return existing;
        }

        let entry = Arc::new(AreaEntry::new(name));
        info!("Created area: {} ({})", name, entry.id);
        self.index_entry(Arc::clone(&entry));
        entry
    }

    pub fn update<F>(&self, area_id: &str, f: F) -> Option<Arc<AreaEntry>>
    where
        F: FnOnce(&mut AreaEntry),
    {
        // Take the entry out first so no map guard is held while re-indexing
        let (_, old) = self.by_id.remove(area_id)?;
        self.by_name.remove(&normalize_name(&old.name));

        let mut entry = (*old).clone();
        f(&mut entry);
        entry.modified_at = Utc::now();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Some(entry)
    }

    pub fn remove(&self, area_id: &str) -> Option<Arc<AreaEntry>> {
        let (_, entry) = self.by_id.remove(area_id)?;
        self.by_name.remove(&normalize_name(&entry.name));
        info!("Removed area: {}", area_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
