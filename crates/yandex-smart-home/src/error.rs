//! Error types for the Yandex adapter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::consts::{
    ERR_DEVICE_NOT_FOUND, ERR_DEVICE_UNREACHABLE, ERR_INVALID_ACTION, ERR_INVALID_VALUE,
    ERR_NOT_SUPPORTED_IN_CURRENT_MODE,
};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error code reported back to the Yandex cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "DEVICE_UNREACHABLE")]
    DeviceUnreachable,
    #[serde(rename = "DEVICE_NOT_FOUND")]
    DeviceNotFound,
    #[serde(rename = "INVALID_VALUE")]
    InvalidValue,
    #[serde(rename = "INVALID_ACTION")]
    InvalidAction,
    #[serde(rename = "NOT_SUPPORTED_IN_CURRENT_MODE")]
    NotSupportedInCurrentMode,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DeviceUnreachable => ERR_DEVICE_UNREACHABLE,
            ErrorCode::DeviceNotFound => ERR_DEVICE_NOT_FOUND,
            ErrorCode::InvalidValue => ERR_INVALID_VALUE,
            ErrorCode::InvalidAction => ERR_INVALID_ACTION,
            ErrorCode::NotSupportedInCurrentMode => ERR_NOT_SUPPORTED_IN_CURRENT_MODE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A command could not be turned into a service call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct SmartHomeError {
    pub code: ErrorCode,
    pub message: String,
}

impl SmartHomeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors that can occur while loading the integration config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("unknown device type '{0}'")]
    UnknownDeviceType(String),

    #[error("unknown property type '{0}'")]
    UnknownPropertyType(String),

    #[error("invalid entity id '{0}' in entity_config")]
    InvalidEntityId(String),

    #[error("invalid filter glob '{glob}': {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: regex::Error,
    },
}
