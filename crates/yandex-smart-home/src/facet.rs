//! Polymorphic contract shared by capabilities and properties

use std::fmt;

use serde_json::Value;
use ysh_core::{Attributes, Context, EntityId, ServiceCall};

use crate::config::EntityConfig;
use crate::error::SmartHomeError;
use crate::schema::{FacetDescription, FacetState, InstanceValue};

/// A capability or property bound to one entity state
///
/// Implementations hold an immutable state snapshot and never fail while
/// reading it: a value that cannot be derived is `None`.
pub trait Facet: fmt::Debug + Send + Sync {
    /// Schema type tag, e.g. `devices.capabilities.on_off`
    fn facet_type(&self) -> &'static str;

    /// Identifier unique within the facet category of a device
    fn instance(&self) -> &str;

    /// Whether the entity can back this facet
    ///
    /// Pure function of the domain, the `supported_features` bits, the
    /// per-entity config and the current attributes.
    fn supported(
        &self,
        domain: &str,
        features: u32,
        entity_config: Option<&EntityConfig>,
        attributes: &Attributes,
    ) -> bool;

    /// May be reported in a full query
    fn retrievable(&self) -> bool {
        true
    }

    /// May be pushed in a state notification
    fn reportable(&self) -> bool {
        true
    }

    /// Extra `parameters` object of the device description
    fn parameters(&self) -> Option<Value> {
        None
    }

    /// Current value in the Yandex representation
    ///
    /// `None` when the source entity is unavailable or its value cannot be
    /// read. A returned value is never JSON `null`.
    fn get_value(&self) -> Option<Value>;

    /// Entity the value is read from
    fn source_entity_id(&self) -> &EntityId;

    /// `{type, retrievable, reportable, parameters?}` for the device list
    fn description(&self) -> FacetDescription {
        FacetDescription {
            facet_type: self.facet_type().to_string(),
            retrievable: self.retrievable(),
            reportable: self.reportable(),
            parameters: self.parameters(),
        }
    }

    /// `{type, state: {instance, value}}`, or `None` without a value
    fn state_entry(&self) -> Option<FacetState> {
        self.get_value().map(|value| FacetState {
            facet_type: self.facet_type().to_string(),
            state: InstanceValue {
                instance: self.instance().to_string(),
                value,
            },
        })
    }
}

/// A facet the cloud can change
pub trait Capability: Facet {
    /// Describe the service call that applies `value`
    fn set_state(&self, context: &Context, value: &Value) -> Result<ServiceCall, SmartHomeError>;
}

/// A read-only measured value
pub trait Property: Facet {}
