//! Registries consulted when describing devices to Yandex
//!
//! - Entities (EntityRegistry): device link and directly assigned area
//! - Devices (DeviceRegistry): manufacturer, model, firmware, area
//! - Areas (AreaRegistry): room names
//!
//! Registries are in-memory and safe to share between threads. They can be
//! loaded from and saved to the Home Assistant `.storage/` snapshots.

pub mod storage;

pub mod area_registry;
pub mod device_registry;
pub mod entity_registry;

pub use storage::{Storable, Storage, StorageError, StorageFile, StorageResult};

pub use entity_registry::{
    DisabledBy, EntityEntry, EntityRegistry, EntityRegistryData, EntityRegistryError, HiddenBy,
};

pub use device_registry::{DeviceEntry, DeviceIdentifier, DeviceRegistry, DeviceRegistryData};

pub use area_registry::{AreaEntry, AreaRegistry, AreaRegistryData};

/// All registries bundled together
#[derive(Default)]
pub struct Registries {
    pub entities: EntityRegistry,
    pub devices: DeviceRegistry,
    pub areas: AreaRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every registry found under `<config_dir>/.storage`
    pub async fn load(config_dir: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let storage = Storage::new(config_dir);
        let registries = Self::new();
        registries.entities.load(&storage).await?;
        registries.devices.load(&storage).await?;
        registries.areas.load(&storage).await?;
        Ok(registries)
    }

    /// Whether the entity, or the device it belongs to, is disabled
    ///
    /// Unregistered entities are never disabled.
    pub fn is_disabled(&self, entity_id: &str) -> bool {
        let Some(entry) = self.entities.get(entity_id) else {
            return false;
        };
        entry.is_disabled()
            || entry
                .device_id
                .as_deref()
                .and_then(|device_id| self.devices.get(device_id))
                .is_some_and(|device| device.is_disabled())
    }

    pub async fn save(&self, config_dir: impl AsRef<std::path::Path>) -> StorageResult<()> {
        let storage = Storage::new(config_dir);
        self.entities.save(&storage).await?;
        self.devices.save(&storage).await?;
        self.areas.save(&storage).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_registries_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let registries = Registries::new();

        let area = registries.areas.get_or_create("Кухня");
        let device = registries.devices.get_or_create(
            &[DeviceIdentifier::new("test", "test_2")],
            Some("test_2"),
            None,
        );
        registries.devices.update(&device.id, |d| {
            d.model = Some("Ultra Switch".to_string());
            d.area_id = Some(area.id.clone());
        });
        registries
            .entities
            .get_or_create("switch", "test", "2", Some(&device.id));

        registries.save(temp_dir.path()).await.unwrap();

        let loaded = Registries::load(temp_dir.path()).await.unwrap();
        assert_eq!(loaded.entities.len(), 1);
        assert_eq!(loaded.devices.len(), 1);
        assert_eq!(loaded.areas.len(), 1);

        let entry = loaded.entities.get("switch.test_2").unwrap();
        let device = loaded.devices.get(entry.device_id.as_deref().unwrap()).unwrap();
        assert_eq!(device.model.as_deref(), Some("Ultra Switch"));
        assert_eq!(
            loaded.areas.get(device.area_id.as_deref().unwrap()).unwrap().name,
            "Кухня"
        );
        assert!(loaded.devices.get_by_identifier("test", "test_2").is_some());
    }

    #[test]
    fn test_is_disabled() {
        let registries = Registries::new();
        let device = registries.devices.get_or_create(
            &[DeviceIdentifier::new("test", "plug")],
            Some("plug"),
            None,
        );
        registries
            .entities
            .get_or_create("switch", "test", "plug", Some(&device.id));
        registries.entities.get_or_create("switch", "test", "lamp", None);

        assert!(!registries.is_disabled("switch.test_plug"));
        assert!(!registries.is_disabled("switch.unregistered"));

        registries
            .entities
            .update("switch.test_lamp", |e| e.disabled_by = Some(DisabledBy::User))
            .unwrap();
        assert!(registries.is_disabled("switch.test_lamp"));

        registries
            .devices
            .update(&device.id, |d| d.disabled_by = Some(DisabledBy::Integration));
        assert!(registries.is_disabled("switch.test_plug"));
    }

    #[tokio::test]
    async fn test_load_empty_config_dir() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Registries::load(temp_dir.path()).await.unwrap();
        assert!(loaded.entities.is_empty());
        assert!(loaded.devices.is_empty());
        assert!(loaded.areas.is_empty());
    }
}
