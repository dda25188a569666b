//! Entity state snapshot and the read-side lookup trait

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{attributes, EntityId, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// Attribute map of a state snapshot
pub type Attributes = HashMap<String, serde_json::Value>;

/// Immutable snapshot of an entity's state
///
/// A new snapshot is created on every change; consumers never mutate one in
/// place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub entity_id: EntityId,

    /// The state value (e.g. "on", "23.5", "unavailable")
    pub state: String,

    #[serde(default)]
    pub attributes: Attributes,

    pub last_changed: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,
}

impl State {
    pub fn new(entity_id: EntityId, state: impl Into<String>, attributes: Attributes) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: state.into(),
            attributes,
            last_changed: now,
            last_updated: now,
        }
    }

    /// Build the next snapshot, keeping `last_changed` when the value is the same
    pub fn with_update(&self, new_state: impl Into<String>, new_attributes: Attributes) -> Self {
        let now = Utc::now();
        let new_state = new_state.into();
        let last_changed = if self.state == new_state {
            self.last_changed
        } else {
            now
        };

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed,
            last_updated: now,
        }
    }

    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    pub fn is_unknown(&self) -> bool {
        self.state == STATE_UNKNOWN
    }

    /// Display name: `friendly_name` attribute, else the humanized object id
    pub fn name(&self) -> String {
        self.attributes
            .get(attributes::FRIENDLY_NAME)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.entity_id.humanized_object_id())
    }

    /// Get an attribute value by key, `None` if missing or of another type
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn device_class(&self) -> Option<&str> {
        self.attributes
            .get(attributes::DEVICE_CLASS)
            .and_then(|v| v.as_str())
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attributes
            .get(attributes::UNIT_OF_MEASUREMENT)
            .and_then(|v| v.as_str())
    }

    /// Feature bitmask; 0 when the attribute is missing or malformed
    pub fn supported_features(&self) -> u32 {
        self.attributes
            .get(attributes::SUPPORTED_FEATURES)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps are not part of the value
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

/// Read access to the current states of all entities
pub trait StateProvider {
    fn get_state(&self, entity_id: &str) -> Option<State>;
}

impl StateProvider for HashMap<String, State> {
    fn get_state(&self, entity_id: &str) -> Option<State> {
        self.get(entity_id).cloned()
    }
}
