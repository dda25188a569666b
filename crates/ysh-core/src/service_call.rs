//! Service call produced when a capability is asked to change state

use crate::{Context, EntityId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request to invoke `domain.service` with `service_data`
///
/// Capabilities only describe the call; executing it is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,

    pub service: String,

    pub service_data: Value,

    pub context: Context,
}

impl ServiceCall {
    /// Call targeting a single entity: `service_data = {"entity_id": ...}`
    pub fn for_entity(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity_id: &EntityId,
        context: &Context,
    ) -> Self {
        let mut data = Map::new();
        data.insert("entity_id".to_string(), Value::String(entity_id.to_string()));

        Self {
            domain: domain.into(),
            service: service.into(),
            service_data: Value::Object(data),
            context: context.clone(),
        }
    }

    /// Add a field to the service data
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.service_data {
            map.insert(key.into(), value.into());
        }
        self
    }

    /// Full service identifier (`domain.service`)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Target entity id from the service data, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.service_data.get("entity_id").and_then(|v| v.as_str())
    }
}
