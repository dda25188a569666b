//! Records sent to the Yandex cloud

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device_info::DeviceInfo;
use crate::error::ErrorCode;

/// Full description of an exposed device, as listed by `/user/devices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescription {
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub device_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,

    pub capabilities: Vec<FacetDescription>,

    pub properties: Vec<FacetDescription>,

    pub device_info: DeviceInfo,
}

/// Body of the device list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub devices: Vec<DeviceDescription>,
}

/// Static description of one capability or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetDescription {
    #[serde(rename = "type")]
    pub facet_type: String,

    pub retrievable: bool,

    pub reportable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Current value of one capability or property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetState {
    #[serde(rename = "type")]
    pub facet_type: String,

    pub state: InstanceValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceValue {
    pub instance: String,

    pub value: Value,
}

/// Device record of a query response or a state notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceState {
    Error {
        id: String,
        error_code: ErrorCode,
    },
    Available {
        id: String,
        capabilities: Vec<FacetState>,
        properties: Vec<FacetState>,
    },
}

impl DeviceState {
    pub fn unreachable(id: impl Into<String>) -> Self {
        DeviceState::Error {
            id: id.into(),
            error_code: ErrorCode::DeviceUnreachable,
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        DeviceState::Error {
            id: id.into(),
            error_code: ErrorCode::DeviceNotFound,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DeviceState::Error { id, .. } | DeviceState::Available { id, .. } => id,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            DeviceState::Error { error_code, .. } => Some(*error_code),
            DeviceState::Available { .. } => None,
        }
    }

    /// True for an available device with nothing to report
    pub fn is_empty(&self) -> bool {
        match self {
            DeviceState::Error { .. } => false,
            DeviceState::Available {
                capabilities,
                properties,
                ..
            } => capabilities.is_empty() && properties.is_empty(),
        }
    }
}
