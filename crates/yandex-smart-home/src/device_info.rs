//! Room and hardware metadata resolved from the registries

use serde::{Deserialize, Serialize};
use tracing::trace;
use ysh_registries::{AreaRegistry, DeviceEntry, DeviceRegistry, EntityRegistry};

/// `device_info` block of a device description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
}

impl DeviceInfo {
    /// Metadata of an entity with no registered device
    pub fn bare(entity_id: &str) -> Self {
        Self {
            manufacturer: None,
            model: entity_id.to_string(),
            sw_version: None,
        }
    }

    pub fn from_device(entity_id: &str, device: &DeviceEntry) -> Self {
        let model = match device.model.as_deref() {
            Some(model) if !model.is_empty() => format!("{model} | {entity_id}"),
            _ => entity_id.to_string(),
        };

        Self {
            manufacturer: device.manufacturer.clone(),
            model,
            sw_version: device.sw_version.clone(),
        }
    }
}

/// Registry lookups for one entity
///
/// Every missing record degrades to "no data"; nothing is cached.
pub struct DeviceInfoResolver<'a> {
    pub entities: &'a EntityRegistry,
    pub devices: &'a DeviceRegistry,
    pub areas: &'a AreaRegistry,
}

impl<'a> DeviceInfoResolver<'a> {
    pub fn new(
        entities: &'a EntityRegistry,
        devices: &'a DeviceRegistry,
        areas: &'a AreaRegistry,
    ) -> Self {
        Self {
            entities,
            devices,
            areas,
        }
    }

    /// Resolve `(room, device_info)`
    ///
    /// Room precedence: configured override, entity area, device area.
    pub fn resolve(
        &self,
        entity_id: &str,
        room_override: Option<&str>,
    ) -> (Option<String>, DeviceInfo) {
        let entry = self.entities.get(entity_id);
        let device = entry
            .as_ref()
            .and_then(|e| e.device_id.as_deref())
            .and_then(|device_id| self.devices.get(device_id));

        let area_name = |area_id: Option<&str>| {
            area_id
                .and_then(|id| self.areas.get(id))
                .map(|area| area.name.clone())
        };

        let room = room_override
            .map(str::to_string)
            .or_else(|| area_name(entry.as_ref().and_then(|e| e.area_id.as_deref())))
            .or_else(|| area_name(device.as_ref().and_then(|d| d.area_id.as_deref())));

        let info = match &device {
            Some(device) => DeviceInfo::from_device(entity_id, device),
            None => DeviceInfo::bare(entity_id),
        };

        trace!(entity_id, room = ?room, has_device = device.is_some(), "Resolved device info");
        (room, info)
    }
}
