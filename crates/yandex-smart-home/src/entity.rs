//! Entity adapter: one Home Assistant entity seen as a Yandex device

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, trace, warn};
use ysh_core::domains::{self, media_player};
use ysh_core::{Context, EntityId, ServiceCall, State, StateProvider};
use ysh_registries::{AreaRegistry, DeviceRegistry, EntityRegistry};

use crate::capability;
use crate::config::{Config, EntityConfig};
use crate::consts::*;
use crate::device_info::DeviceInfoResolver;
use crate::error::{ErrorCode, SmartHomeError};
use crate::facet::{Capability, Facet, Property};
use crate::property::{self, CustomEntityProperty};
use crate::schema::{DeviceDescription, DeviceState, FacetState};

/// Device type by entity domain
fn domain_device_type(domain: &str) -> Option<&'static str> {
    let device_type = match domain {
        domains::AUTOMATION => TYPE_OTHER,
        domains::BINARY_SENSOR => TYPE_SENSOR,
        domains::CLIMATE => TYPE_THERMOSTAT,
        domains::COVER => TYPE_OPENABLE_CURTAIN,
        domains::FAN => TYPE_VENTILATION_FAN,
        domains::HUMIDIFIER => TYPE_HUMIDIFIER,
        domains::INPUT_BOOLEAN => TYPE_SWITCH,
        domains::LIGHT => TYPE_LIGHT,
        domains::LOCK => TYPE_OPENABLE,
        domains::MEDIA_PLAYER => TYPE_MEDIA_DEVICE,
        domains::SCENE => TYPE_OTHER,
        domains::SCRIPT => TYPE_OTHER,
        domains::SENSOR => TYPE_SENSOR,
        domains::SWITCH => TYPE_SWITCH,
        domains::VACUUM => TYPE_VACUUM_CLEANER,
        domains::WATER_HEATER => TYPE_COOKING_KETTLE,
        _ => return None,
    };
    Some(device_type)
}

/// Device type by `(domain, device_class)`, checked before the domain table
fn device_class_device_type(domain: &str, device_class: &str) -> Option<&'static str> {
    match (domain, device_class) {
        (domains::MEDIA_PLAYER, media_player::DEVICE_CLASS_TV) => Some(TYPE_MEDIA_DEVICE_TV),
        (domains::MEDIA_PLAYER, media_player::DEVICE_CLASS_RECEIVER) => {
            Some(TYPE_MEDIA_DEVICE_RECEIVER)
        }
        (domains::SWITCH, domains::switch::DEVICE_CLASS_OUTLET) => Some(TYPE_SOCKET),
        _ => None,
    }
}

/// Insert a facet, replacing an earlier one with the same instance in place
fn push_unique<T: Facet + ?Sized>(facets: &mut Vec<Box<T>>, facet: Box<T>, entity_id: &EntityId) {
    match facets.iter().position(|f| f.instance() == facet.instance()) {
        Some(index) => {
            warn!(
                %entity_id,
                facet_type = facet.facet_type(),
                instance = facet.instance(),
                "Duplicate instance, keeping the later one"
            );
            facets[index] = facet;
        }
        None => facets.push(facet),
    }
}

/// A state snapshot with its active capabilities and properties
pub struct YandexEntity {
    config: Arc<Config>,
    state: State,
    capabilities: Vec<Box<dyn Capability>>,
    properties: Vec<Box<dyn Property>>,
}

impl std::fmt::Debug for YandexEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YandexEntity")
            .field("entity_id", &self.state.entity_id)
            .field("state", &self.state.state)
            .field("capabilities", &self.capabilities)
            .field("properties", &self.properties)
            .finish()
    }
}

impl YandexEntity {
    /// Build the adapter and discover its capabilities and properties
    ///
    /// `states` resolves entities referenced by custom properties.
    pub fn new(config: Arc<Config>, state: State, states: &dyn StateProvider) -> Self {
        let entity_id = state.entity_id.clone();
        let domain = state.domain();
        let features = state.supported_features();
        let entity_config = config.entity_config(&entity_id.to_string());

        let mut capabilities: Vec<Box<dyn Capability>> = Vec::new();
        for cap in capability::catalog(&state) {
            if cap.supported(domain, features, entity_config, &state.attributes) {
                push_unique(&mut capabilities, cap, &entity_id);
            }
        }

        let mut properties: Vec<Box<dyn Property>> = Vec::new();
        for prop in property::catalog(&state) {
            if prop.supported(domain, features, entity_config, &state.attributes) {
                push_unique(&mut properties, prop, &entity_id);
            }
        }

        for prop_config in entity_config.map_or(&[][..], |c| c.properties.as_slice()) {
            if let Some(prop) = CustomEntityProperty::from_config(prop_config, &state, states) {
                let prop: Box<dyn Property> = Box::new(prop);
                push_unique(&mut properties, prop, &entity_id);
            }
        }

        trace!(
            %entity_id,
            capabilities = capabilities.len(),
            properties = properties.len(),
            "Discovered facets"
        );

        Self {
            config,
            state,
            capabilities,
            properties,
        }
    }

    /// Build the adapter with an explicit facet set, skipping discovery
    pub fn with_facets(
        config: Arc<Config>,
        state: State,
        capabilities: Vec<Box<dyn Capability>>,
        properties: Vec<Box<dyn Property>>,
    ) -> Self {
        Self {
            config,
            state,
            capabilities,
            properties,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn capabilities(&self) -> &[Box<dyn Capability>] {
        &self.capabilities
    }

    pub fn properties(&self) -> &[Box<dyn Property>] {
        &self.properties
    }

    fn entity_config(&self) -> Option<&EntityConfig> {
        self.config.entity_config(&self.state.entity_id.to_string())
    }

    /// Domains without a device type are never exposed
    pub fn should_expose(&self) -> bool {
        domain_device_type(self.state.domain()).is_some()
            && self.config.should_expose(&self.state.entity_id.to_string())
    }

    pub fn yandex_device_type(&self) -> Option<&str> {
        if let Some(forced) = self.entity_config().and_then(|c| c.device_type.as_deref()) {
            return Some(forced);
        }

        let domain = self.state.domain();
        self.state
            .device_class()
            .and_then(|class| device_class_device_type(domain, class))
            .or_else(|| domain_device_type(domain))
    }

    fn name(&self) -> String {
        let name = self
            .entity_config()
            .and_then(|c| c.name.clone())
            .unwrap_or_else(|| self.state.name());
        let name = name.trim();

        if name.is_empty() {
            self.state.entity_id.to_string()
        } else {
            name.to_string()
        }
    }

    /// Description for the device list; `None` when the entity is not a device
    #[instrument(skip_all, fields(entity_id = %self.state.entity_id))]
    pub fn devices_serialize(
        &self,
        entities: &EntityRegistry,
        devices: &DeviceRegistry,
        areas: &AreaRegistry,
    ) -> Option<DeviceDescription> {
        if self.state.is_unavailable() {
            debug!("Entity is unavailable");
            return None;
        }

        let Some(device_type) = self.yandex_device_type() else {
            debug!("No device type for entity");
            return None;
        };

        if self.capabilities.is_empty() && self.properties.is_empty() {
            debug!("Entity has no capabilities or properties");
            return None;
        }

        let entity_id = self.state.entity_id.to_string();
        let room_override = self.entity_config().and_then(|c| c.room.as_deref());
        let (room, device_info) =
            DeviceInfoResolver::new(entities, devices, areas).resolve(&entity_id, room_override);

        Some(DeviceDescription {
            id: entity_id,
            name: self.name(),
            device_type: device_type.to_string(),
            room,
            capabilities: self.capabilities.iter().map(|c| c.description()).collect(),
            properties: self.properties.iter().map(|p| p.description()).collect(),
            device_info,
        })
    }

    fn capability_states(&self) -> Vec<FacetState> {
        self.capabilities
            .iter()
            .filter(|c| c.retrievable())
            .filter_map(|c| c.state_entry())
            .collect()
    }

    /// Current values for a query
    #[instrument(skip_all, fields(entity_id = %self.state.entity_id))]
    pub fn query_serialize(&self) -> DeviceState {
        if self.state.is_unavailable() {
            return DeviceState::unreachable(self.state.entity_id.to_string());
        }

        let properties = self
            .properties
            .iter()
            .filter(|p| p.retrievable())
            .filter_map(|p| p.state_entry())
            .collect();

        DeviceState::Available {
            id: self.state.entity_id.to_string(),
            capabilities: self.capability_states(),
            properties,
        }
    }

    /// Values to push after `changed_entity_id` changed
    ///
    /// Capabilities are reported as in a query; properties only when bound
    /// to the changed entity.
    #[instrument(skip(self), fields(entity_id = %self.state.entity_id))]
    pub fn notification_serialize(&self, changed_entity_id: &str) -> DeviceState {
        if self.state.is_unavailable() {
            return DeviceState::unreachable(self.state.entity_id.to_string());
        }

        let properties = self
            .properties
            .iter()
            .filter(|p| p.source_entity_id() == changed_entity_id)
            .filter(|p| p.reportable())
            .filter_map(|p| p.state_entry())
            .collect();

        DeviceState::Available {
            id: self.state.entity_id.to_string(),
            capabilities: self.capability_states(),
            properties,
        }
    }

    /// Turn a cloud action into a service call
    #[instrument(skip(self, context, value), fields(entity_id = %self.state.entity_id))]
    pub fn execute(
        &self,
        context: &Context,
        capability_type: &str,
        instance: &str,
        value: &Value,
    ) -> Result<ServiceCall, SmartHomeError> {
        if self.state.is_unavailable() {
            return Err(SmartHomeError::new(
                ErrorCode::DeviceUnreachable,
                format!("{} is unavailable", self.state.entity_id),
            ));
        }

        let capability = self
            .capabilities
            .iter()
            .find(|c| c.facet_type() == capability_type && c.instance() == instance)
            .ok_or_else(|| {
                SmartHomeError::new(
                    ErrorCode::NotSupportedInCurrentMode,
                    format!("unsupported capability {capability_type} {instance}"),
                )
            })?;

        let call = capability.set_state(context, value)?;
        debug!(service = %call.service_id(), "Executing action");
        Ok(call)
    }
}
