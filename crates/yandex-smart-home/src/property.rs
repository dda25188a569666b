//! Built-in float properties and user-declared custom properties

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Number, Value};
use tracing::warn;
use ysh_core::domains;
use ysh_core::{attributes, Attributes, EntityId, State, StateProvider};

use crate::config::{EntityConfig, PropertyConfig};
use crate::consts::PROPERTY_FLOAT;
use crate::facet::{Facet, Property};

/// Quantity reported by a `devices.properties.float` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatInstance {
    Temperature,
    Humidity,
    Pressure,
    Co2Level,
    BatteryLevel,
    Voltage,
    Amperage,
    Power,
    Illumination,
}

/// Unknown float property instance name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownInstance(pub String);

/// Conversion from the source unit to the reported Yandex unit
#[derive(Debug, Clone, Copy, PartialEq)]
enum Conversion {
    Identity,
    Scale(f64),
    FahrenheitToCelsius,
}

impl Conversion {
    fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::Identity => value,
            Conversion::Scale(factor) => value * factor,
            Conversion::FahrenheitToCelsius => (value - 32.0) * 5.0 / 9.0,
        }
    }
}

impl FloatInstance {
    /// Catalog order
    pub const ALL: [FloatInstance; 9] = [
        FloatInstance::Temperature,
        FloatInstance::Humidity,
        FloatInstance::Pressure,
        FloatInstance::Co2Level,
        FloatInstance::BatteryLevel,
        FloatInstance::Voltage,
        FloatInstance::Amperage,
        FloatInstance::Power,
        FloatInstance::Illumination,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FloatInstance::Temperature => "temperature",
            FloatInstance::Humidity => "humidity",
            FloatInstance::Pressure => "pressure",
            FloatInstance::Co2Level => "co2_level",
            FloatInstance::BatteryLevel => "battery_level",
            FloatInstance::Voltage => "voltage",
            FloatInstance::Amperage => "amperage",
            FloatInstance::Power => "power",
            FloatInstance::Illumination => "illumination",
        }
    }

    /// Sensor `device_class` naming this quantity
    pub fn device_class(&self) -> &'static str {
        match self {
            FloatInstance::Temperature => "temperature",
            FloatInstance::Humidity => "humidity",
            FloatInstance::Pressure => "pressure",
            FloatInstance::Co2Level => "carbon_dioxide",
            FloatInstance::BatteryLevel => "battery",
            FloatInstance::Voltage => "voltage",
            FloatInstance::Amperage => "current",
            FloatInstance::Power => "power",
            FloatInstance::Illumination => "illuminance",
        }
    }

    /// Units that identify a sensor without a device class
    ///
    /// Battery has none since `%` already means humidity.
    fn units(&self) -> &'static [&'static str] {
        match self {
            FloatInstance::Temperature => &["°C", "°F", "K"],
            FloatInstance::Humidity => &["%"],
            FloatInstance::Pressure => &["Pa", "hPa", "kPa", "mbar", "bar", "mmHg", "atm"],
            FloatInstance::Co2Level => &["ppm"],
            FloatInstance::BatteryLevel => &[],
            FloatInstance::Voltage => &["V"],
            FloatInstance::Amperage => &["A"],
            FloatInstance::Power => &["W"],
            FloatInstance::Illumination => &["lx"],
        }
    }

    /// Attribute carrying this quantity on non-sensor entities
    fn attribute(&self) -> Option<&'static str> {
        match self {
            FloatInstance::Temperature => Some(attributes::CURRENT_TEMPERATURE),
            FloatInstance::Humidity => Some(attributes::CURRENT_HUMIDITY),
            FloatInstance::BatteryLevel => Some(attributes::BATTERY_LEVEL),
            _ => None,
        }
    }

    fn yandex_unit(&self, unit: Option<&str>) -> (&'static str, Conversion) {
        match (self, unit) {
            (FloatInstance::Temperature, Some("°F")) => {
                ("unit.temperature.celsius", Conversion::FahrenheitToCelsius)
            }
            (FloatInstance::Temperature, Some("K")) => {
                ("unit.temperature.kelvin", Conversion::Identity)
            }
            (FloatInstance::Temperature, _) => ("unit.temperature.celsius", Conversion::Identity),
            (FloatInstance::Pressure, Some("mmHg")) => {
                ("unit.pressure.mmhg", Conversion::Identity)
            }
            (FloatInstance::Pressure, Some("atm")) => {
                ("unit.pressure.atm", Conversion::Identity)
            }
            (FloatInstance::Pressure, Some("bar")) => {
                ("unit.pressure.bar", Conversion::Identity)
            }
            (FloatInstance::Pressure, Some("mbar")) => {
                ("unit.pressure.bar", Conversion::Scale(0.001))
            }
            (FloatInstance::Pressure, Some("hPa")) => {
                ("unit.pressure.pascal", Conversion::Scale(100.0))
            }
            (FloatInstance::Pressure, Some("kPa")) => {
                ("unit.pressure.pascal", Conversion::Scale(1000.0))
            }
            (FloatInstance::Pressure, _) => ("unit.pressure.pascal", Conversion::Identity),
            (FloatInstance::Humidity | FloatInstance::BatteryLevel, _) => {
                ("unit.percent", Conversion::Identity)
            }
            (FloatInstance::Co2Level, _) => ("unit.ppm", Conversion::Identity),
            (FloatInstance::Voltage, _) => ("unit.volt", Conversion::Identity),
            (FloatInstance::Amperage, _) => ("unit.ampere", Conversion::Identity),
            (FloatInstance::Power, _) => ("unit.watt", Conversion::Identity),
            (FloatInstance::Illumination, _) => ("unit.illumination.lux", Conversion::Identity),
        }
    }
}

impl fmt::Display for FloatInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FloatInstance {
    type Err = UnknownInstance;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FloatInstance::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| UnknownInstance(s.to_string()))
    }
}

/// Where a property reads its number from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    State,
    Attribute(String),
}

/// A float property bound to one entity state
#[derive(Debug, Clone)]
pub struct FloatProperty {
    instance: FloatInstance,
    state: State,
    source: ValueSource,
}

impl FloatProperty {
    /// Sensors report through their state; other domains through an attribute
    pub fn new(instance: FloatInstance, state: State) -> Self {
        let source = match instance.attribute() {
            Some(attr) if state.domain() != domains::SENSOR => {
                ValueSource::Attribute(attr.to_string())
            }
            _ => ValueSource::State,
        };
        Self::with_source(instance, state, source)
    }

    pub fn with_source(instance: FloatInstance, state: State, source: ValueSource) -> Self {
        Self {
            instance,
            state,
            source,
        }
    }

    pub fn float_instance(&self) -> FloatInstance {
        self.instance
    }

    fn source_unit(&self) -> Option<&str> {
        match self.source {
            ValueSource::State => self.state.unit_of_measurement(),
            ValueSource::Attribute(_) => None,
        }
    }

    fn raw_value(&self) -> Option<f64> {
        match &self.source {
            ValueSource::State => self.state.state.trim().parse().ok(),
            ValueSource::Attribute(attr) => match self.state.attributes.get(attr)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            },
        }
    }
}

impl Facet for FloatProperty {
    fn facet_type(&self) -> &'static str {
        PROPERTY_FLOAT
    }

    fn instance(&self) -> &str {
        self.instance.as_str()
    }

    fn supported(
        &self,
        domain: &str,
        _features: u32,
        _entity_config: Option<&EntityConfig>,
        attributes: &Attributes,
    ) -> bool {
        if domain == domains::SENSOR {
            let device_class = attributes
                .get(ysh_core::attributes::DEVICE_CLASS)
                .and_then(|v| v.as_str());
            let unit = attributes
                .get(ysh_core::attributes::UNIT_OF_MEASUREMENT)
                .and_then(|v| v.as_str());

            return match device_class {
                Some(class) => class == self.instance.device_class(),
                None => unit.is_some_and(|u| self.instance.units().contains(&u)),
            };
        }

        self.instance
            .attribute()
            .is_some_and(|attr| attributes.contains_key(attr))
    }

    fn parameters(&self) -> Option<Value> {
        let (unit, _) = self.instance.yandex_unit(self.source_unit());
        Some(json!({"instance": self.instance.as_str(), "unit": unit}))
    }

    fn get_value(&self) -> Option<Value> {
        if self.state.is_unavailable() || self.state.is_unknown() {
            return None;
        }

        let raw = self.raw_value()?;
        let (_, conversion) = self.instance.yandex_unit(self.source_unit());
        let value = (conversion.apply(raw) * 100.0).round() / 100.0;
        Number::from_f64(value).map(Value::Number)
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Property for FloatProperty {}

/// A float property declared in `entity_config`, bound to any entity
#[derive(Debug, Clone)]
pub struct CustomEntityProperty {
    inner: FloatProperty,
}

impl CustomEntityProperty {
    pub fn new(instance: FloatInstance, state: State, attribute: Option<String>) -> Self {
        let source = attribute.map_or(ValueSource::State, ValueSource::Attribute);
        Self {
            inner: FloatProperty::with_source(instance, state, source),
        }
    }

    /// Resolve the bound entity; `None` when it has no state
    pub fn from_config(
        config: &PropertyConfig,
        own_state: &State,
        states: &dyn StateProvider,
    ) -> Option<Self> {
        let state = match &config.entity {
            Some(entity_id) => match states.get_state(&entity_id.to_string()) {
                Some(state) => state,
                None => {
                    warn!(
                        entity_id = %own_state.entity_id,
                        source = %entity_id,
                        instance = %config.instance,
                        "Custom property source entity not found"
                    );
                    return None;
                }
            },
            None => own_state.clone(),
        };

        Some(Self::new(config.instance, state, config.attribute.clone()))
    }
}

impl Facet for CustomEntityProperty {
    fn facet_type(&self) -> &'static str {
        self.inner.facet_type()
    }

    fn instance(&self) -> &str {
        self.inner.instance()
    }

    fn supported(
        &self,
        _domain: &str,
        _features: u32,
        _entity_config: Option<&EntityConfig>,
        _attributes: &Attributes,
    ) -> bool {
        true
    }

    fn parameters(&self) -> Option<Value> {
        self.inner.parameters()
    }

    fn get_value(&self) -> Option<Value> {
        self.inner.get_value()
    }

    fn source_entity_id(&self) -> &EntityId {
        self.inner.source_entity_id()
    }
}

impl Property for CustomEntityProperty {}

/// Instantiate every built-in property for a state, supported or not
pub fn catalog(state: &State) -> Vec<Box<dyn Property>> {
    FloatInstance::ALL
        .into_iter()
        .map(|instance| Box::new(FloatProperty::new(instance, state.clone())) as Box<dyn Property>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn state(id: &str, value: &str, attrs: Value) -> State {
        let attributes = match attrs {
            Value::Object(map) => map.into_iter().collect(),
            _ => Attributes::new(),
        };
        State::new(id.parse().unwrap(), value, attributes)
    }

    fn supported(prop: &dyn Property, s: &State) -> bool {
        prop.supported(s.domain(), s.supported_features(), None, &s.attributes)
    }

    fn supported_instances(s: &State) -> Vec<String> {
        catalog(s)
            .into_iter()
            .filter(|p| supported(p.as_ref(), s))
            .map(|p| p.instance().to_string())
            .collect()
    }

    #[test]
    fn test_instance_names() {
        assert_eq!("co2_level".parse::<FloatInstance>(), Ok(FloatInstance::Co2Level));
        assert_eq!(FloatInstance::BatteryLevel.to_string(), "battery_level");
        assert!("smell".parse::<FloatInstance>().is_err());
    }

    #[test]
    fn test_sensor_by_device_class() {
        let s = state(
            "sensor.temp",
            "21.5",
            json!({"device_class": "temperature", "unit_of_measurement": "°C"}),
        );
        assert_eq!(supported_instances(&s), ["temperature"]);

        let s = state("sensor.v", "220", json!({"device_class": "voltage"}));
        assert_eq!(supported_instances(&s), ["voltage"]);

        let s = state(
            "sensor.bat",
            "77",
            json!({"device_class": "battery", "unit_of_measurement": "%"}),
        );
        assert_eq!(supported_instances(&s), ["battery_level"]);
    }

    #[test]
    fn test_sensor_by_unit() {
        let s = state("sensor.h", "40", json!({"unit_of_measurement": "%"}));
        assert_eq!(supported_instances(&s), ["humidity"]);

        let s = state("sensor.lux", "300", json!({"unit_of_measurement": "lx"}));
        assert_eq!(supported_instances(&s), ["illumination"]);

        let s = state("sensor.plain", "13", json!({}));
        assert!(supported_instances(&s).is_empty());
    }

    #[test]
    fn test_attribute_sources() {
        let s = state(
            "climate.hall",
            "heat",
            json!({"current_temperature": 22, "current_humidity": "45", "battery_level": 90}),
        );
        assert_eq!(supported_instances(&s), ["temperature", "humidity", "battery_level"]);

        let values: Vec<_> = catalog(&s)
            .into_iter()
            .filter(|p| supported(p.as_ref(), &s))
            .map(|p| p.get_value())
            .collect();
        assert_eq!(values, [Some(json!(22.0)), Some(json!(45.0)), Some(json!(90.0))]);
    }

    #[test]
    fn test_value_parsing() {
        let value = |v: &str| {
            FloatProperty::new(FloatInstance::Voltage, state("sensor.v", v, json!({}))).get_value()
        };
        assert_eq!(value("220"), Some(json!(220.0)));
        assert_eq!(value(" 3.14159 "), Some(json!(3.14)));
        assert_eq!(value("abc"), None);
        assert_eq!(value("NaN"), None);
        assert_eq!(value("inf"), None);
        assert_eq!(value("1e307"), None);
        assert_eq!(value("-1e307"), None);
        assert_eq!(value("unavailable"), None);
        assert_eq!(value("unknown"), None);
    }

    #[test]
    fn test_unit_conversion() {
        let prop = FloatProperty::new(
            FloatInstance::Temperature,
            state("sensor.t", "212", json!({"unit_of_measurement": "°F"})),
        );
        assert_eq!(prop.get_value(), Some(json!(100.0)));
        assert_eq!(
            prop.parameters(),
            Some(json!({"instance": "temperature", "unit": "unit.temperature.celsius"}))
        );

        let prop = FloatProperty::new(
            FloatInstance::Pressure,
            state("sensor.p", "1013", json!({"unit_of_measurement": "hPa"})),
        );
        assert_eq!(prop.get_value(), Some(json!(101300.0)));
        let huge = FloatProperty::new(
            FloatInstance::Pressure,
            state("sensor.p", "1e306", json!({"unit_of_measurement": "hPa"})),
        );
        assert_eq!(huge.get_value(), None);
        assert_eq!(
            prop.parameters(),
            Some(json!({"instance": "pressure", "unit": "unit.pressure.pascal"}))
        );

        let prop = FloatProperty::new(
            FloatInstance::Pressure,
            state("sensor.p", "760", json!({"unit_of_measurement": "mmHg"})),
        );
        assert_eq!(
            prop.parameters().unwrap()["unit"],
            json!("unit.pressure.mmhg")
        );
    }

    #[test]
    fn test_custom_property_from_config() {
        let own = state("switch.kettle", "on", json!({"current_power": 1800}));
        let mut states = HashMap::new();
        states.insert(
            "sensor.kettle_temp".to_string(),
            state("sensor.kettle_temp", "87", json!({})),
        );

        let config = PropertyConfig::new(FloatInstance::Temperature)
            .with_entity("sensor.kettle_temp".parse().unwrap());
        let prop = CustomEntityProperty::from_config(&config, &own, &states).unwrap();
        assert!(supported(&prop, &own));
        assert_eq!(prop.source_entity_id().to_string(), "sensor.kettle_temp");
        assert_eq!(prop.get_value(), Some(json!(87.0)));

        let config = PropertyConfig::new(FloatInstance::Power).with_attribute("current_power");
        let prop = CustomEntityProperty::from_config(&config, &own, &states).unwrap();
        assert_eq!(prop.source_entity_id().to_string(), "switch.kettle");
        assert_eq!(prop.get_value(), Some(json!(1800.0)));

        let config = PropertyConfig::new(FloatInstance::Humidity)
            .with_entity("sensor.missing".parse().unwrap());
        assert!(CustomEntityProperty::from_config(&config, &own, &states).is_none());
    }

    #[test]
    fn test_custom_property_unavailable_source() {
        let prop = CustomEntityProperty::new(
            FloatInstance::Humidity,
            state("sensor.h", "unavailable", json!({})),
            None,
        );
        assert_eq!(prop.get_value(), None);
        assert!(prop.description().reportable);
    }
}
