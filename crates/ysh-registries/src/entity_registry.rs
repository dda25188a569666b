//! Entity Registry
//!
//! Registered entities with their unique ids, the device they belong to and
//! the area they were assigned to directly.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{Storable, Storage, StorageResult};

#[derive(Debug, Error, Clone)]
pub enum EntityRegistryError {
    #[error("Entity not found: {0}")]
    NotFound(String),
}

pub const STORAGE_KEY: &str = "core.entity_registry";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 19;

/// Reason an entity or device was disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisabledBy {
    ConfigEntry,
    Device,
    Hass,
    Integration,
    User,
}

/// Reason an entity was hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenBy {
    Integration,
    User,
}

/// A registered entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    pub id: String,

    /// Full entity ID (domain.object_id)
    pub entity_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,

    /// Integration that provides this entity
    pub platform: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Area assigned to the entity itself; overrides the device area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    /// User-set name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_by: Option<HiddenBy>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl EntityEntry {
    pub fn new(
        entity_id: impl Into<String>,
        platform: impl Into<String>,
        unique_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string().to_lowercase(),
            entity_id: entity_id.into(),
            unique_id,
            platform: platform.into(),
            device_id: None,
            area_id: None,
            name: None,
            original_name: None,
            device_class: None,
            disabled_by: None,
            hidden_by: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or(&self.entity_id)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistryData {
    pub entities: Vec<EntityEntry>,
    #[serde(default)]
    pub deleted_entities: Vec<EntityEntry>,
}

impl Storable for EntityRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Turn free text into an object id slug (`"Test 1"` -> `"test_1"`)
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Entity Registry
///
/// The primary index is an `IndexMap` so iteration follows registration
/// order.
#[derive(Default)]
pub struct EntityRegistry {
    /// Primary index: entity_id -> entry
    by_entity_id: RwLock<IndexMap<String, Arc<EntityEntry>>>,

    /// Index: "platform:unique_id" -> entity_id
    by_unique_id: DashMap<String, String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, storage: &Storage) -> StorageResult<()> {
        if let Some(file) = storage.load::<EntityRegistryData>().await? {
            info!("Loading {} entities from storage", file.data.entities.len());
            for entry in file.data.entities {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    pub async fn save(&self, storage: &Storage) -> StorageResult<()> {
        let entities: Vec<EntityEntry> = self
            .by_entity_id
            .read()
            .map(|idx| idx.values().map(|e| (**e).clone()).collect())
            .unwrap_or_default();
        let count = entities.len();

        storage
            .save(EntityRegistryData {
                entities,
                deleted_entities: Vec::new(),
            })
            .await?;
        debug!("Saved {} entities to storage", count);
        Ok(())
    }

    fn unique_key(platform: &str, unique_id: &str) -> String {
        format!("{}:{}", platform, unique_id)
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let entity_id = entry.entity_id.clone();

        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .insert(Self::unique_key(&entry.platform, unique_id), entity_id.clone());
        }
        if let Ok(mut idx) = self.by_entity_id.write() {
            idx.insert(entity_id, entry);
        }
    }

    fn unindex_secondary(&self, entry: &EntityEntry) {
        if let Some(ref unique_id) = entry.unique_id {
            self.by_unique_id
                .remove(&Self::unique_key(&entry.platform, unique_id));
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id
            .read()
            .ok()
            .and_then(|idx| idx.get(entity_id).cloned())
    }

    pub fn get_by_unique_id(&self, platform: &str, unique_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_unique_id
            .get(&Self::unique_key(platform, unique_id))
            .and_then(|entity_id| self.get(&entity_id))
    }

    /// Register an entity of `platform` with `unique_id` in `domain`
    ///
    /// The entity id is derived from `<platform>_<unique_id>`; a numeric
    /// suffix is appended when that id is already taken.
    pub fn get_or_create(
        &self,
        domain: &str,
        platform: &str,
        unique_id: &str,
        device_id: Option<&str>,
    ) -> Arc<EntityEntry> {
        if let Some(existing) = self.get_by_unique_id(platform, unique_id) {
            debug!("Found existing entity by unique_id: {}", existing.entity_id);
            return existing;
        }

        let entity_id = self.generate_entity_id(domain, &format!("{platform}_{unique_id}"));
        let mut entry = EntityEntry::new(&entity_id, platform, Some(unique_id.to_string()));
        entry.device_id = device_id.map(str::to_string);

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        info!("Registered new entity: {}", entity_id);
        entry
    }

    fn generate_entity_id(&self, domain: &str, suggested_object_id: &str) -> String {
        let base = format!("{}.{}", domain, slugify(suggested_object_id));
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.get(&candidate).is_some() {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        candidate
    }

    pub fn update<F>(&self, entity_id: &str, f: F) -> Result<Arc<EntityEntry>, EntityRegistryError>
    where
        F: FnOnce(&mut EntityEntry),
    {
        // Take the entry out before touching secondary indexes
        let old = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut idx| idx.shift_remove(entity_id))
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;
        self.unindex_secondary(&old);

        let mut entry = (*old).clone();
        f(&mut entry);
        entry.modified_at = Utc::now();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    pub fn remove(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        let entry = self
            .by_entity_id
            .write()
            .ok()
            .and_then(|mut idx| idx.shift_remove(entity_id))?;
        self.unindex_secondary(&entry);
        info!("Removed entity: {}", entity_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_entity_id.read().map(|idx| idx.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
