//! Yandex Smart Home adapter
//!
//! Describes Home Assistant entities in the Yandex Smart Home device schema:
//!
//! - Config: per-entity overrides and the exposure filter
//! - Capabilities and properties: what a device can do and measure
//! - YandexEntity: device list, query and notification records for one entity
//! - Handlers: device list and query over a whole state store
//! - Notifier: callback payloads for state changes

pub mod capability;
pub mod config;
pub mod consts;
pub mod device_info;
pub mod entity;
pub mod error;
pub mod facet;
pub mod handlers;
pub mod notifier;
pub mod property;
pub mod schema;

pub use capability::{MuteCapability, OnOffCapability, OscillationCapability, PauseCapability};
pub use config::{Config, EntityConfig, EntityFilter, FilterConfig, NotifierConfig, PropertyConfig};
pub use device_info::{DeviceInfo, DeviceInfoResolver};
pub use entity::YandexEntity;
pub use error::{ConfigError, ConfigResult, ErrorCode, SmartHomeError};
pub use facet::{Capability, Facet, Property};
pub use handlers::{devices_list, devices_query};
pub use notifier::{CallbackBody, CallbackPayload, Notifier};
pub use property::{CustomEntityProperty, FloatInstance, FloatProperty, ValueSource};
pub use schema::{
    DeviceDescription, DeviceState, DevicesResponse, FacetDescription, FacetState, InstanceValue,
};
