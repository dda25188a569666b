//! Built-in capabilities: on/off and toggles

use serde_json::Value;
use ysh_core::domains::{self, has_features};
use ysh_core::{
    attributes, Attributes, Context, EntityId, ServiceCall, State, STATE_CLOSED, STATE_LOCKED,
    STATE_OFF, STATE_ON, STATE_OPEN, STATE_PAUSED, STATE_PLAYING, STATE_UNLOCKED,
};

use crate::config::EntityConfig;
use crate::consts::{
    CAPABILITIES_ON_OFF, CAPABILITIES_TOGGLE, ON_OFF_INSTANCE_ON, TOGGLE_INSTANCE_MUTE,
    TOGGLE_INSTANCE_OSCILLATION, TOGGLE_INSTANCE_PAUSE,
};
use crate::error::{ErrorCode, SmartHomeError};
use crate::facet::{Capability, Facet};

/// Builds one capability variant around a state snapshot
type Constructor = fn(&State) -> Box<dyn Capability>;

fn on_off(state: &State) -> Box<dyn Capability> {
    Box::new(OnOffCapability::new(state.clone()))
}

fn pause(state: &State) -> Box<dyn Capability> {
    Box::new(PauseCapability::new(state.clone()))
}

fn mute(state: &State) -> Box<dyn Capability> {
    Box::new(MuteCapability::new(state.clone()))
}

fn oscillation(state: &State) -> Box<dyn Capability> {
    Box::new(OscillationCapability::new(state.clone()))
}

/// Built-in capabilities in output order
const CATALOG: &[Constructor] = &[on_off, pause, mute, oscillation];

/// Instantiate every built-in capability for a state, supported or not
pub fn catalog(state: &State) -> Vec<Box<dyn Capability>> {
    CATALOG.iter().map(|construct| construct(state)).collect()
}

/// Every built-in capability takes a boolean; anything else is `INVALID_VALUE`
fn expect_bool(value: &Value) -> Result<bool, SmartHomeError> {
    value.as_bool().ok_or_else(|| {
        SmartHomeError::new(
            ErrorCode::InvalidValue,
            format!("expected a boolean, got {value}"),
        )
    })
}

/// Binary power state
///
/// Covers map to open/closed, locks to unlocked/locked. Media players are
/// on unless `off` or `standby`, vacuums while cleaning and climate devices
/// in any HVAC mode but `off`.
#[derive(Debug, Clone)]
pub struct OnOffCapability {
    state: State,
}

impl OnOffCapability {
    /// Wrap a state snapshot of the controlled entity
    pub fn new(state: State) -> Self {
        Self { state }
    }

    /// Service call targeting this entity
    fn call(&self, context: &Context, domain: &str, service: &str) -> ServiceCall {
        ServiceCall::for_entity(domain, service, &self.state.entity_id, context)
    }
}

impl Facet for OnOffCapability {
    fn facet_type(&self) -> &'static str {
        CAPABILITIES_ON_OFF
    }

    fn instance(&self) -> &str {
        ON_OFF_INSTANCE_ON
    }

    fn supported(
        &self,
        domain: &str,
        features: u32,
        _entity_config: Option<&EntityConfig>,
        _attributes: &Attributes,
    ) -> bool {
        use ysh_core::domains::{climate, cover, media_player, vacuum};

        // Binary domains always; the rest need a feature bit

        match domain {
            domains::SWITCH
            | domains::LIGHT
            | domains::FAN
            | domains::INPUT_BOOLEAN
            | domains::HUMIDIFIER
            | domains::AUTOMATION
            | domains::SCRIPT
            | domains::SCENE
            | domains::GROUP
            | domains::WATER_HEATER
            | domains::LOCK => true,
            domains::COVER => has_features(features, cover::OPEN | cover::CLOSE),
            domains::MEDIA_PLAYER => {
                features & (media_player::TURN_ON | media_player::TURN_OFF) != 0
            }
            domains::VACUUM => {
                features & (vacuum::TURN_ON | vacuum::TURN_OFF | vacuum::START) != 0
            }
            domains::CLIMATE => features & (climate::TURN_ON | climate::TURN_OFF) != 0,
            _ => false,
        }
    }

    /// Scripts and scenes have no persistent on/off state
    fn retrievable(&self) -> bool {
        !matches!(self.state.domain(), domains::SCRIPT | domains::SCENE)
    }

    fn get_value(&self) -> Option<Value> {
        let state = self.state.state.as_str();
        if self.state.is_unavailable() || self.state.is_unknown() {
            return None;
        }

        let on = match self.state.domain() {
            domains::COVER => match state {
                STATE_OPEN => true,
                STATE_CLOSED => false,
                _ => return None,
            },
            domains::LOCK => match state {
                STATE_UNLOCKED => true,
                STATE_LOCKED => false,
                _ => return None,
            },
            domains::MEDIA_PLAYER => !matches!(state, STATE_OFF | "standby"),
            domains::VACUUM => match state {
                STATE_ON | "cleaning" => true,
                STATE_OFF | "docked" | "idle" | STATE_PAUSED | "returning" => false,
                _ => return None,
            },
            domains::CLIMATE => state != STATE_OFF,
            _ => match state {
                STATE_ON => true,
                STATE_OFF => false,
                _ => return None,
            },
        };

        Some(Value::Bool(on))
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Capability for OnOffCapability {
    /// `turn_on`/`turn_off` in the entity's own domain, with per-domain
    /// service names for covers, locks, vacuums and groups
    ///
    /// Turning a scene off is `INVALID_ACTION`.
    fn set_state(&self, context: &Context, value: &Value) -> Result<ServiceCall, SmartHomeError> {
        use ysh_core::domains::vacuum;

        let on = expect_bool(value)?;
        let domain = self.state.domain();

        let call = match domain {
            domains::COVER => {
                self.call(context, domain, if on { "open_cover" } else { "close_cover" })
            }
            domains::LOCK => self.call(context, domain, if on { "unlock" } else { "lock" }),
            domains::VACUUM => {
                let features = self.state.supported_features();
                let service = match on {
                    true if has_features(features, vacuum::START) => "start",
                    false if has_features(features, vacuum::RETURN_HOME) => "return_to_base",
                    true => "turn_on",
                    false => "turn_off",
                };
                self.call(context, domain, service)
            }
            domains::GROUP => self.call(
                context,
                domains::HOMEASSISTANT,
                if on { "turn_on" } else { "turn_off" },
            ),
            domains::SCENE if !on => {
                return Err(SmartHomeError::new(
                    ErrorCode::InvalidAction,
                    "a scene can only be activated",
                ))
            }
            _ => self.call(context, domain, if on { "turn_on" } else { "turn_off" }),
        };

        Ok(call)
    }
}

/// Pause toggle for players, vacuums and stoppable covers
///
/// A player is paused whenever it is not playing, a vacuum only in the
/// `paused` state. Covers have no paused state: the toggle is write-only
/// and always stops the cover.
#[derive(Debug, Clone)]
pub struct PauseCapability {
    state: State,
}

impl PauseCapability {
    pub fn new(state: State) -> Self {
        Self { state }
    }
}

impl Facet for PauseCapability {
    fn facet_type(&self) -> &'static str {
        CAPABILITIES_TOGGLE
    }

    fn instance(&self) -> &str {
        TOGGLE_INSTANCE_PAUSE
    }

    fn supported(
        &self,
        domain: &str,
        features: u32,
        _entity_config: Option<&EntityConfig>,
        _attributes: &Attributes,
    ) -> bool {
        use ysh_core::domains::{cover, media_player, vacuum};

        match domain {
            domains::MEDIA_PLAYER => has_features(features, media_player::PAUSE),
            domains::VACUUM => has_features(features, vacuum::PAUSE),
            domains::COVER => has_features(features, cover::STOP),
            _ => false,
        }
    }

    /// Not for covers
    fn retrievable(&self) -> bool {
        self.state.domain() != domains::COVER
    }

    fn get_value(&self) -> Option<Value> {
        if self.state.is_unavailable() {
            return None;
        }

        let paused = match self.state.domain() {
            domains::MEDIA_PLAYER => self.state.state != STATE_PLAYING,
            domains::VACUUM => self.state.state == STATE_PAUSED,
            _ => false,
        };
        Some(Value::Bool(paused))
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Capability for PauseCapability {
    fn set_state(&self, context: &Context, value: &Value) -> Result<ServiceCall, SmartHomeError> {
        let pause = expect_bool(value)?;
        let domain = self.state.domain();

        let service = match domain {
            domains::MEDIA_PLAYER if pause => "media_pause",
            domains::MEDIA_PLAYER => "media_play",
            domains::VACUUM if pause => "pause",
            domains::VACUUM => "start",
            domains::COVER => "stop_cover",
            _ => {
                return Err(SmartHomeError::new(
                    ErrorCode::NotSupportedInCurrentMode,
                    format!("pause is not supported for {domain}"),
                ))
            }
        };

        Ok(ServiceCall::for_entity(
            domain,
            service,
            &self.state.entity_id,
            context,
        ))
    }
}

/// Mute toggle for media players
///
/// Value comes from `is_volume_muted`; players that never report it can
/// still be muted but are not queried.
#[derive(Debug, Clone)]
pub struct MuteCapability {
    state: State,
}

impl MuteCapability {
    pub fn new(state: State) -> Self {
        Self { state }
    }
}

impl Facet for MuteCapability {
    fn facet_type(&self) -> &'static str {
        CAPABILITIES_TOGGLE
    }

    fn instance(&self) -> &str {
        TOGGLE_INSTANCE_MUTE
    }

    fn supported(
        &self,
        domain: &str,
        features: u32,
        _entity_config: Option<&EntityConfig>,
        _attributes: &Attributes,
    ) -> bool {
        domain == domains::MEDIA_PLAYER
            && has_features(features, domains::media_player::VOLUME_MUTE)
    }

    fn retrievable(&self) -> bool {
        self.state
            .attributes
            .contains_key(attributes::MEDIA_VOLUME_MUTED)
    }

    fn get_value(&self) -> Option<Value> {
        if self.state.is_unavailable() {
            return None;
        }
        self.state
            .attribute::<bool>(attributes::MEDIA_VOLUME_MUTED)
            .map(Value::Bool)
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Capability for MuteCapability {
    /// `media_player.volume_mute` with `is_volume_muted`
    fn set_state(&self, context: &Context, value: &Value) -> Result<ServiceCall, SmartHomeError> {
        let mute = expect_bool(value)?;
        Ok(ServiceCall::for_entity(
            domains::MEDIA_PLAYER,
            "volume_mute",
            &self.state.entity_id,
            context,
        )
        .with_data(attributes::MEDIA_VOLUME_MUTED, mute))
    }
}

/// Oscillation toggle for fans, read from the `oscillating` attribute
#[derive(Debug, Clone)]
pub struct OscillationCapability {
    state: State,
}

impl OscillationCapability {
    pub fn new(state: State) -> Self {
        Self { state }
    }
}

impl Facet for OscillationCapability {
    fn facet_type(&self) -> &'static str {
        CAPABILITIES_TOGGLE
    }

    fn instance(&self) -> &str {
        TOGGLE_INSTANCE_OSCILLATION
    }

    fn supported(
        &self,
        domain: &str,
        features: u32,
        _entity_config: Option<&EntityConfig>,
        _attributes: &Attributes,
    ) -> bool {
        domain == domains::FAN && has_features(features, domains::fan::OSCILLATE)
    }

    fn get_value(&self) -> Option<Value> {
        if self.state.is_unavailable() {
            return None;
        }
        self.state
            .attribute::<bool>(attributes::OSCILLATING)
            .map(Value::Bool)
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Capability for OscillationCapability {
    /// `fan.oscillate` with `oscillating`
    fn set_state(&self, context: &Context, value: &Value) -> Result<ServiceCall, SmartHomeError> {
        let oscillating = expect_bool(value)?;
        Ok(ServiceCall::for_entity(
            domains::FAN,
            "oscillate",
            &self.state.entity_id,
            context,
        )
        .with_data(attributes::OSCILLATING, oscillating))
    }
}
