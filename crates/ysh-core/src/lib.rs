//! Core types for the Yandex Smart Home bridge
//!
//! This crate provides the entity model shared by the registries, the state
//! store and the Yandex adapter: EntityId, State, Context and ServiceCall,
//! plus the well-known state values, attribute names and domain features.

mod context;
pub mod domains;
mod entity_id;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{EntityId, EntityIdError};
pub use service_call::ServiceCall;
pub use state::{Attributes, State, StateProvider};

pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";
pub const STATE_OPEN: &str = "open";
pub const STATE_CLOSED: &str = "closed";
pub const STATE_LOCKED: &str = "locked";
pub const STATE_UNLOCKED: &str = "unlocked";
pub const STATE_PLAYING: &str = "playing";
pub const STATE_PAUSED: &str = "paused";

/// Sentinel state of an entity that cannot be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

pub const STATE_UNKNOWN: &str = "unknown";

/// Well-known state attribute names
pub mod attributes {
    pub const FRIENDLY_NAME: &str = "friendly_name";
    pub const DEVICE_CLASS: &str = "device_class";
    pub const UNIT_OF_MEASUREMENT: &str = "unit_of_measurement";
    pub const SUPPORTED_FEATURES: &str = "supported_features";
    pub const BATTERY_LEVEL: &str = "battery_level";
    pub const CURRENT_TEMPERATURE: &str = "current_temperature";
    pub const CURRENT_HUMIDITY: &str = "current_humidity";
    pub const MEDIA_VOLUME_MUTED: &str = "is_volume_muted";
    pub const OSCILLATING: &str = "oscillating";
}
