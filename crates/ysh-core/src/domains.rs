//! Entity domain names and their `supported_features` bits
//!
//! Bit values follow the Home Assistant entity feature enums.

pub const AUTOMATION: &str = "automation";
pub const BINARY_SENSOR: &str = "binary_sensor";
pub const CAMERA: &str = "camera";
pub const CLIMATE: &str = "climate";
pub const COVER: &str = "cover";
pub const FAN: &str = "fan";
pub const GROUP: &str = "group";
pub const HUMIDIFIER: &str = "humidifier";
pub const INPUT_BOOLEAN: &str = "input_boolean";
pub const LIGHT: &str = "light";
pub const LOCK: &str = "lock";
pub const MEDIA_PLAYER: &str = "media_player";
pub const SCENE: &str = "scene";
pub const SCRIPT: &str = "script";
pub const SENSOR: &str = "sensor";
pub const SWITCH: &str = "switch";
pub const VACUUM: &str = "vacuum";
pub const WATER_HEATER: &str = "water_heater";

/// Domain used for generic on/off services (`homeassistant.turn_on`)
pub const HOMEASSISTANT: &str = "homeassistant";

pub mod media_player {
    pub const PAUSE: u32 = 1;
    pub const SEEK: u32 = 2;
    pub const VOLUME_SET: u32 = 4;
    pub const VOLUME_MUTE: u32 = 8;
    pub const TURN_ON: u32 = 128;
    pub const TURN_OFF: u32 = 256;
    pub const STOP: u32 = 4096;
    pub const PLAY: u32 = 16384;

    pub const DEVICE_CLASS_TV: &str = "tv";
    pub const DEVICE_CLASS_RECEIVER: &str = "receiver";
}

pub mod cover {
    pub const OPEN: u32 = 1;
    pub const CLOSE: u32 = 2;
    pub const SET_POSITION: u32 = 4;
    pub const STOP: u32 = 8;
}

pub mod vacuum {
    pub const TURN_ON: u32 = 1;
    pub const TURN_OFF: u32 = 2;
    pub const PAUSE: u32 = 4;
    pub const STOP: u32 = 8;
    pub const RETURN_HOME: u32 = 16;
    pub const START: u32 = 8192;
}

pub mod fan {
    pub const SET_SPEED: u32 = 1;
    pub const OSCILLATE: u32 = 2;
    pub const DIRECTION: u32 = 4;
}

pub mod climate {
    pub const TURN_OFF: u32 = 128;
    pub const TURN_ON: u32 = 256;
}

pub mod switch {
    pub const DEVICE_CLASS_OUTLET: &str = "outlet";
}

/// `true` if every bit of `flags` is set in `features`
pub fn has_features(features: u32, flags: u32) -> bool {
    features & flags == flags
}
