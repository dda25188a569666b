//! Device Registry
//!
//! Physical devices that group entities, with the hardware metadata
//! (manufacturer, model, firmware) surfaced as Yandex `device_info`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::entity_registry::DisabledBy;
use crate::storage::{Storable, Storage, StorageResult};

pub const STORAGE_KEY: &str = "core.device_registry";
pub const STORAGE_VERSION: u32 = 1;
pub const STORAGE_MINOR_VERSION: u32 = 12;

/// A device identifier `(domain, id)`
///
/// Stored as a JSON array. Some integrations write three or more parts; the
/// trailing parts are joined with `:` into the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<serde_json::Value>")]
pub struct DeviceIdentifier(pub String, pub String);

impl DeviceIdentifier {
    pub fn new(domain: impl Into<String>, id: impl Into<String>) -> Self {
        Self(domain.into(), id.into())
    }

    pub fn domain(&self) -> &str {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.1
    }

    fn key(&self) -> String {
        format!("{}:{}", self.0, self.1)
    }
}

impl TryFrom<Vec<serde_json::Value>> for DeviceIdentifier {
    type Error = String;

    fn try_from(parts: Vec<serde_json::Value>) -> Result<Self, Self::Error> {
        let mut parts = parts.into_iter().map(|value| match value {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(format!("identifier part must be string or number, got {other}")),
        });

        let domain = parts
            .next()
            .ok_or_else(|| "identifier is empty".to_string())??;
        let id = parts.collect::<Result<Vec<_>, _>>()?;
        if id.is_empty() {
            return Err(format!("identifier for '{domain}' has no id"));
        }

        Ok(Self(domain, id.join(":")))
    }
}

/// A registered device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,

    #[serde(default)]
    pub identifiers: Vec<DeviceIdentifier>,

    #[serde(default)]
    pub config_entries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_by_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,

    /// Software/firmware version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_by: Option<DisabledBy>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl DeviceEntry {
    pub fn new(name: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            identifiers: Vec::new(),
            config_entries: Vec::new(),
            name: name.map(str::to_string),
            name_by_user: None,
            manufacturer: None,
            model: None,
            hw_version: None,
            sw_version: None,
            area_id: None,
            disabled_by: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRegistryData {
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub deleted_devices: Vec<DeviceEntry>,
}

impl Storable for DeviceRegistryData {
    const KEY: &'static str = STORAGE_KEY;
    const VERSION: u32 = STORAGE_VERSION;
    const MINOR_VERSION: u32 = STORAGE_MINOR_VERSION;
}

/// Device Registry indexed by id and by identifier
#[derive(Default)]
pub struct DeviceRegistry {
    /// Primary index: device_id -> entry
    by_id: DashMap<String, Arc<DeviceEntry>>,

    /// Index: "domain:id" identifier key -> device_id
    by_identifier: DashMap<String, String>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&self, storage: &Storage) -> StorageResult<()> {
        if let Some(file) = storage.load::<DeviceRegistryData>().await? {
            info!("Loading {} devices from storage", file.data.devices.len());
            for entry in file.data.devices {
                self.index_entry(Arc::new(entry));
            }
        }
        Ok(())
    }

    pub async fn save(&self, storage: &Storage) -> StorageResult<()> {
        let mut devices: Vec<DeviceEntry> =
            self.by_id.iter().map(|r| (**r.value()).clone()).collect();
        devices.sort_by_key(|d| d.created_at);
        storage
            .save(DeviceRegistryData {
                devices,
                deleted_devices: Vec::new(),
            })
            .await?;
        debug!("Saved {} devices to storage", self.by_id.len());
        Ok(())
    }

    fn index_entry(&self, entry: Arc<DeviceEntry>) {
        for identifier in &entry.identifiers {
            self.by_identifier.insert(identifier.key(), entry.id.clone());
        }
        self.by_id.insert(entry.id.clone(), entry);
    }

    fn unindex_identifiers(&self, entry: &DeviceEntry) {
        for identifier in &entry.identifiers {
            self.by_identifier.remove(&identifier.key());
        }
    }

    pub fn get(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        self.by_id.get(device_id).map(|r| Arc::clone(r.value()))
    }

    pub fn get_by_identifier(&self, domain: &str, id: &str) -> Option<Arc<DeviceEntry>> {
        self.by_identifier
            .get(&format!("{}:{}", domain, id))
            .and_then(|device_id| self.get(&device_id))
    }

    /// Find a device by any of its identifiers, or register a new one
    ///
    /// An existing device gains `config_entry_id` if it did not have it yet.
    pub fn get_or_create(
        &self,
        identifiers: &[DeviceIdentifier],
        config_entry_id: Option<&str>,
        name: Option<&str>,
    ) -> Arc<DeviceEntry> {
        let existing = identifiers
            .iter()
            .find_map(|ident| self.get_by_identifier(ident.domain(), ident.id()));

        if let Some(existing) = existing {
            debug!("Found existing device by identifier: {}", existing.id);
            return match config_entry_id {
                Some(ce) if !existing.config_entries.iter().any(|c| c == ce) => self
                    .update(&existing.id, |e| e.config_entries.push(ce.to_string()))
                    .unwrap_or(existing),
                _ => existing,
            };
        }

        let mut entry = DeviceEntry::new(name);
        entry.identifiers = identifiers.to_vec();
        entry.config_entries = config_entry_id.map(str::to_string).into_iter().collect();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        info!("Registered new device: {:?} ({})", name, entry.id);
        entry
    }

    pub fn update<F>(&self, device_id: &str, f: F) -> Option<Arc<DeviceEntry>>
    where
        F: FnOnce(&mut DeviceEntry),
    {
        let (_, old) = self.by_id.remove(device_id)?;
        self.unindex_identifiers(&old);

        let mut entry = (*old).clone();
        f(&mut entry);
        entry.modified_at = Utc::now();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Some(entry)
    }

    pub fn remove(&self, device_id: &str) -> Option<Arc<DeviceEntry>> {
        let (_, entry) = self.by_id.remove(device_id)?;
        self.unindex_identifiers(&entry);
        info!("Removed device: {}", device_id);
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_reuses_identifier() {
        let devices = DeviceRegistry::new();
        let ident = DeviceIdentifier::new("test", "test_1");

        let first = devices.get_or_create(&[ident.clone()], Some("entry_1"), None);
        let second = devices.get_or_create(&[ident], Some("entry_2"), None);

        assert_eq!(first.id, second.id);
        assert_eq!(devices.len(), 1);
        assert_eq!(second.config_entries, vec!["entry_1", "entry_2"]);
    }

    #[test]
    fn test_update_metadata() {
        let devices = DeviceRegistry::new();
        let device = devices.get_or_create(&[DeviceIdentifier::new("test", "x")], None, Some("X"));
        let updated = devices
            .update(&device.id, |d| {
                d.manufacturer = Some("Acme Inc.".to_string());
                d.area_id = Some("closet".to_string());
            })
            .unwrap();

        assert_eq!(updated.manufacturer.as_deref(), Some("Acme Inc."));
        assert_eq!(devices.get(&device.id).unwrap().area_id.as_deref(), Some("closet"));
        assert_eq!(
            devices.get_by_identifier("test", "x").unwrap().name.as_deref(),
            Some("X")
        );
    }

    #[test]
    fn test_identifier_deserialize() {
        let ident: DeviceIdentifier = serde_json::from_str(r#"["zha", 42]"#).unwrap();
        assert_eq!(ident, DeviceIdentifier::new("zha", "42"));

        let ident: DeviceIdentifier =
            serde_json::from_str(r#"["homekit", "abc", "bridge"]"#).unwrap();
        assert_eq!(ident.id(), "abc:bridge");

        assert!(serde_json::from_str::<DeviceIdentifier>(r#"["only"]"#).is_err());
        assert_eq!(
            serde_json::to_string(&DeviceIdentifier::new("hue", "1")).unwrap(),
            r#"["hue","1"]"#
        );
    }

    #[test]
    fn test_remove_clears_identifier_index() {
        let devices = DeviceRegistry::new();
        let device = devices.get_or_create(&[DeviceIdentifier::new("test", "gone")], None, None);
        devices.remove(&device.id);
        assert!(devices.get_by_identifier("test", "gone").is_none());
        assert!(devices.is_empty());
    }
}
