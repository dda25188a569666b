//! Yandex Smart Home schema constants
//!
//! These strings are part of the cloud API contract and must not change.

pub const DOMAIN: &str = "yandex_smart_home";

pub const PREFIX_TYPES: &str = "devices.types.";
pub const TYPE_COOKING_KETTLE: &str = "devices.types.cooking.kettle";
pub const TYPE_HUMIDIFIER: &str = "devices.types.humidifier";
pub const TYPE_LIGHT: &str = "devices.types.light";
pub const TYPE_MEDIA_DEVICE: &str = "devices.types.media_device";
pub const TYPE_MEDIA_DEVICE_RECEIVER: &str = "devices.types.media_device.receiver";
pub const TYPE_MEDIA_DEVICE_TV: &str = "devices.types.media_device.tv";
pub const TYPE_MEDIA_DEVICE_TV_BOX: &str = "devices.types.media_device.tv_box";
pub const TYPE_OPENABLE: &str = "devices.types.openable";
pub const TYPE_OPENABLE_CURTAIN: &str = "devices.types.openable.curtain";
pub const TYPE_OTHER: &str = "devices.types.other";
pub const TYPE_PURIFIER: &str = "devices.types.purifier";
pub const TYPE_SENSOR: &str = "devices.types.sensor";
pub const TYPE_SOCKET: &str = "devices.types.socket";
pub const TYPE_SWITCH: &str = "devices.types.switch";
pub const TYPE_THERMOSTAT: &str = "devices.types.thermostat";
pub const TYPE_THERMOSTAT_AC: &str = "devices.types.thermostat.ac";
pub const TYPE_VACUUM_CLEANER: &str = "devices.types.vacuum_cleaner";
pub const TYPE_VENTILATION_FAN: &str = "devices.types.ventilation.fan";

/// Every device type accepted as a forced `type` override
pub const TYPES: &[&str] = &[
    TYPE_COOKING_KETTLE,
    TYPE_HUMIDIFIER,
    TYPE_LIGHT,
    TYPE_MEDIA_DEVICE,
    TYPE_MEDIA_DEVICE_RECEIVER,
    TYPE_MEDIA_DEVICE_TV,
    TYPE_MEDIA_DEVICE_TV_BOX,
    TYPE_OPENABLE,
    TYPE_OPENABLE_CURTAIN,
    TYPE_OTHER,
    TYPE_PURIFIER,
    TYPE_SENSOR,
    TYPE_SOCKET,
    TYPE_SWITCH,
    TYPE_THERMOSTAT,
    TYPE_THERMOSTAT_AC,
    TYPE_VACUUM_CLEANER,
    TYPE_VENTILATION_FAN,
];

pub const CAPABILITIES_ON_OFF: &str = "devices.capabilities.on_off";
pub const CAPABILITIES_TOGGLE: &str = "devices.capabilities.toggle";

pub const ON_OFF_INSTANCE_ON: &str = "on";
pub const TOGGLE_INSTANCE_MUTE: &str = "mute";
pub const TOGGLE_INSTANCE_OSCILLATION: &str = "oscillation";
pub const TOGGLE_INSTANCE_PAUSE: &str = "pause";

pub const PROPERTY_FLOAT: &str = "devices.properties.float";

pub const ERR_DEVICE_NOT_FOUND: &str = "DEVICE_NOT_FOUND";
pub const ERR_DEVICE_UNREACHABLE: &str = "DEVICE_UNREACHABLE";
pub const ERR_INVALID_ACTION: &str = "INVALID_ACTION";
pub const ERR_INVALID_VALUE: &str = "INVALID_VALUE";
pub const ERR_NOT_SUPPORTED_IN_CURRENT_MODE: &str = "NOT_SUPPORTED_IN_CURRENT_MODE";

pub const CONF_ENTITY_CONFIG: &str = "entity_config";
pub const CONF_FILTER: &str = "filter";
pub const CONF_NOTIFIER: &str = "notifier";
pub const CONF_NAME: &str = "name";
pub const CONF_ROOM: &str = "room";
pub const CONF_TYPE: &str = "type";
pub const CONF_ENTITY_PROPERTIES: &str = "properties";
pub const CONF_ENTITY_PROPERTY_TYPE: &str = "type";
pub const CONF_ENTITY_PROPERTY_ENTITY: &str = "entity";
pub const CONF_ENTITY_PROPERTY_ATTRIBUTE: &str = "attribute";
