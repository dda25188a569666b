//! Device list, query and notification records of YandexEntity
//!
//! Covers registry metadata resolution, config overrides and the
//! retrievable/reportable filtering of a mixed capability/property set.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use ysh_core::{Attributes, Context, EntityId, ServiceCall, State};
use ysh_registries::{DeviceIdentifier, Registries};

use yandex_smart_home::consts::{
    CAPABILITIES_TOGGLE, TOGGLE_INSTANCE_PAUSE, TYPE_MEDIA_DEVICE, TYPE_MEDIA_DEVICE_TV,
    TYPE_OPENABLE, TYPE_SWITCH,
};
use yandex_smart_home::{
    Capability, Config, CustomEntityProperty, EntityConfig, Facet, FloatInstance, FloatProperty,
    OnOffCapability, Property, SmartHomeError, YandexEntity,
};

fn state(id: &str, value: &str, attrs: Value) -> State {
    let attributes: Attributes = match attrs {
        Value::Object(map) => map.into_iter().collect(),
        _ => Attributes::new(),
    };
    State::new(id.parse().unwrap(), value, attributes)
}

fn entity(config: Config, s: State) -> YandexEntity {
    YandexEntity::new(Arc::new(config), s, &HashMap::<String, State>::new())
}

/// Pause toggle bound to an input_boolean
#[derive(Debug)]
struct InputBooleanPause {
    state: State,
    retrievable: bool,
}

impl Facet for InputBooleanPause {
    fn facet_type(&self) -> &'static str {
        CAPABILITIES_TOGGLE
    }

    fn instance(&self) -> &str {
        TOGGLE_INSTANCE_PAUSE
    }

    fn supported(&self, _: &str, _: u32, _: Option<&EntityConfig>, _: &Attributes) -> bool {
        true
    }

    fn retrievable(&self) -> bool {
        self.retrievable
    }

    fn get_value(&self) -> Option<Value> {
        if self.state.is_unavailable() {
            return None;
        }
        Some(Value::Bool(self.state.state == "on"))
    }

    fn source_entity_id(&self) -> &EntityId {
        &self.state.entity_id
    }
}

impl Capability for InputBooleanPause {
    fn set_state(&self, context: &Context, _value: &Value) -> Result<ServiceCall, SmartHomeError> {
        Ok(ServiceCall::for_entity(
            "input_boolean",
            "toggle",
            &self.state.entity_id,
            context,
        ))
    }
}

/// Property wrapper overriding the retrievable/reportable flags
#[derive(Debug)]
struct Flagged<P> {
    inner: P,
    retrievable: bool,
    reportable: bool,
}

impl<P> Flagged<P> {
    fn new(inner: P) -> Self {
        Self {
            inner,
            retrievable: true,
            reportable: true,
        }
    }
}

impl<P: Property> Facet for Flagged<P> {
    fn facet_type(&self) -> &'static str {
        self.inner.facet_type()
    }

    fn instance(&self) -> &str {
        self.inner.instance()
    }

    fn supported(&self, d: &str, f: u32, c: Option<&EntityConfig>, a: &Attributes) -> bool {
        self.inner.supported(d, f, c, a)
    }

    fn retrievable(&self) -> bool {
        self.retrievable
    }

    fn reportable(&self) -> bool {
        self.reportable
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

impl<P: Property> Property for Flagged<P> {}

/// Knobs of the mixed `switch.test` fixture
struct Fixture {
    pause_state: &'static str,
    pause_retrievable: bool,
    temperature_retrievable: bool,
    voltage_state: &'static str,
    voltage_reportable: bool,
    humidity_state: &'static str,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            pause_state: "off",
            pause_retrievable: true,
            temperature_retrievable: true,
            voltage_state: "220",
            voltage_reportable: true,
            humidity_state: "95",
        }
    }
}

impl Fixture {
    fn build(self) -> YandexEntity {
        let switch = state("switch.test", "on", json!({}));

        let temperature = FloatProperty::new(
            FloatInstance::Temperature,
            state(
                "sensor.temp",
                "5",
                json!({"unit_of_measurement": "°C", "device_class": "temperature"}),
            ),
        );
        let voltage = FloatProperty::new(
            FloatInstance::Voltage,
            state(
                "sensor.voltage",
                self.voltage_state,
                json!({"unit_of_measurement": "V", "device_class": "voltage"}),
            ),
        );
        let humidity = CustomEntityProperty::new(
            FloatInstance::Humidity,
            state(
                "sensor.humidity",
                self.humidity_state,
                json!({"unit_of_measurement": "%", "device_class": "humidity"}),
            ),
            None,
        );

        let capabilities: Vec<Box<dyn Capability>> = vec![
            Box::new(OnOffCapability::new(switch.clone())),
            Box::new(InputBooleanPause {
                state: state("input_boolean.pause", self.pause_state, json!({})),
                retrievable: self.pause_retrievable,
            }),
        ];
        let properties: Vec<Box<dyn Property>> = vec![
            Box::new(Flagged {
                retrievable: self.temperature_retrievable,
                ..Flagged::new(temperature)
            }),
            Box::new(Flagged {
                reportable: self.voltage_reportable,
                ..Flagged::new(voltage)
            }),
            Box::new(humidity),
        ];

        YandexEntity::with_facets(Arc::new(Config::new()), switch, capabilities, properties)
    }
}

fn on_off(value: bool) -> Value {
    json!({"type": "devices.capabilities.on_off", "state": {"instance": "on", "value": value}})
}

fn pause(value: bool) -> Value {
    json!({"type": "devices.capabilities.toggle", "state": {"instance": "pause", "value": value}})
}

fn float(instance: &str, value: f64) -> Value {
    json!({"type": "devices.properties.float", "state": {"instance": instance, "value": value}})
}

fn record(capabilities: Vec<Value>, properties: Vec<Value>) -> Value {
    json!({"id": "switch.test", "capabilities": capabilities, "properties": properties})
}

#[test]
fn test_devices_serialize_state() {
    let registries = Registries::new();
    let describe = |e: &YandexEntity| {
        e.devices_serialize(&registries.entities, &registries.devices, &registries.areas)
    };

    let unavailable = entity(Config::new(), state("switch.test", "unavailable", json!({})));
    assert!(describe(&unavailable).is_none());
    let bare_sensor = entity(Config::new(), state("sensor.test", "13", json!({})));
    assert!(describe(&bare_sensor).is_none());

    let switch = entity(Config::new(), state("switch.test_1", "on", json!({})));
    let description = describe(&switch).unwrap();
    assert_eq!(description.id, "switch.test_1");
    assert_eq!(description.name, "test 1");
    assert_eq!(description.device_type, TYPE_SWITCH);
    assert_eq!(description.room, None);
    let value = serde_json::to_value(&description).unwrap();
    assert!(value.get("room").is_none());
    assert_eq!(value["device_info"], json!({"model": "switch.test_1"}));
    assert_eq!(
        value["capabilities"],
        json!([{"type": "devices.capabilities.on_off", "retrievable": true, "reportable": true}])
    );
    assert_eq!(value["properties"], json!([]));

    let config = Config::new().with_entity_config(
        "switch.test_1",
        EntityConfig {
            name: Some("Тест".into()),
            device_type: Some(TYPE_OPENABLE.into()),
            room: Some("Кухня".into()),
            ..Default::default()
        },
    );
    let description = describe(&entity(config, state("switch.test_1", "on", json!({})))).unwrap();
    assert_eq!(description.id, "switch.test_1");
    assert_eq!(description.name, "Тест");
    assert_eq!(description.room.as_deref(), Some("Кухня"));
    assert_eq!(description.device_type, TYPE_OPENABLE);
}

#[test]
fn test_devices_serialize_device() {
    let registries = Registries::new();
    let describe = |e: &YandexEntity| {
        e.devices_serialize(&registries.entities, &registries.devices, &registries.areas)
            .unwrap()
    };
    let kitchen = registries.areas.get_or_create("Кухня");
    let closet = registries.areas.get_or_create("Кладовка");

    // Manufacturer only
    let device = registries.devices.get_or_create(
        &[DeviceIdentifier::new("test", "test_1")],
        Some("test_1"),
        None,
    );
    registries
        .devices
        .update(&device.id, |d| d.manufacturer = Some("Acme Inc.".into()));
    registries
        .entities
        .get_or_create("switch", "test", "1", Some(&device.id));

    let description = describe(&entity(Config::new(), state("switch.test_1", "on", json!({}))));
    assert_eq!(description.id, "switch.test_1");
    assert_eq!(
        serde_json::to_value(&description.device_info).unwrap(),
        json!({"model": "switch.test_1", "manufacturer": "Acme Inc."})
    );

    // Full metadata, room from the device area
    let device = registries.devices.get_or_create(
        &[DeviceIdentifier::new("test", "test_2")],
        Some("test_2"),
        None,
    );
    registries.devices.update(&device.id, |d| {
        d.manufacturer = Some("Acme Inc.".into());
        d.model = Some("Ultra Switch".into());
        d.sw_version = Some("0.1".into());
        d.area_id = Some(closet.id.clone());
    });
    registries
        .entities
        .get_or_create("switch", "test", "2", Some(&device.id));

    let switch_2 = state("switch.test_2", "on", json!({}));
    let description = describe(&entity(Config::new(), switch_2.clone()));
    assert_eq!(description.id, "switch.test_2");
    assert_eq!(description.room.as_deref(), Some("Кладовка"));
    assert_eq!(
        serde_json::to_value(&description.device_info).unwrap(),
        json!({
            "manufacturer": "Acme Inc.",
            "model": "Ultra Switch | switch.test_2",
            "sw_version": "0.1"
        })
    );

    let config = Config::new().with_entity_config(
        "switch.test_2",
        EntityConfig {
            room: Some("Комната".into()),
            ..Default::default()
        },
    );
    let description = describe(&entity(config, switch_2));
    assert_eq!(description.room.as_deref(), Some("Комната"));

    // Bare device, room from the entity area
    let device = registries.devices.get_or_create(
        &[DeviceIdentifier::new("test", "test_3")],
        Some("test_3"),
        None,
    );
    let entry = registries
        .entities
        .get_or_create("switch", "test", "3", Some(&device.id));
    registries
        .entities
        .update(&entry.entity_id, |e| e.area_id = Some(kitchen.id.clone()))
        .unwrap();

    let description = describe(&entity(Config::new(), state("switch.test_3", "on", json!({}))));
    assert_eq!(description.id, "switch.test_3");
    assert_eq!(description.room.as_deref(), Some("Кухня"));
    assert_eq!(
        serde_json::to_value(&description.device_info).unwrap(),
        json!({"model": "switch.test_3"})
    );
}

#[test]
fn test_should_expose() {
    assert!(!entity(Config::new(), state("group.all_locks", "on", json!({}))).should_expose());
    assert!(!entity(Config::new(), state("fake.unsupported", "on", json!({}))).should_expose());

    let config = || Config::new().with_should_expose(|id| id != "switch.not_expose");
    assert!(entity(config(), state("switch.test", "on", json!({}))).should_expose());
    assert!(!entity(config(), state("switch.not_expose", "on", json!({}))).should_expose());
}

#[test]
fn test_device_type() {
    let e = entity(Config::new(), state("media_player.tv", "on", json!({})));
    assert_eq!(e.yandex_device_type(), Some(TYPE_MEDIA_DEVICE));

    let e = entity(
        Config::new(),
        state("media_player.tv", "on", json!({"device_class": "tv"})),
    );
    assert_eq!(e.yandex_device_type(), Some(TYPE_MEDIA_DEVICE_TV));
}

#[test]
fn test_unavailable_short_circuit() {
    let e = entity(Config::new(), state("switch.unavailable", "unavailable", json!({})));
    let unreachable = json!({"id": "switch.unavailable", "error_code": "DEVICE_UNREACHABLE"});

    assert_eq!(serde_json::to_value(e.query_serialize()).unwrap(), unreachable);
    assert_eq!(serde_json::to_value(e.notification_serialize("")).unwrap(), unreachable);
}

#[test]
fn test_query_serialize() {
    let e = Fixture::default().build();
    assert_eq!(
        serde_json::to_value(e.query_serialize()).unwrap(),
        record(
            vec![on_off(true), pause(false)],
            vec![float("temperature", 5.0), float("voltage", 220.0), float("humidity", 95.0)],
        )
    );
}

#[test]
fn test_notification_serialize_by_source() {
    let e = Fixture::default().build();
    let notify = |changed: &str| serde_json::to_value(e.notification_serialize(changed)).unwrap();

    assert_eq!(notify("switch.test"), record(vec![on_off(true), pause(false)], vec![]));
    assert_eq!(
        notify("sensor.voltage"),
        record(vec![on_off(true), pause(false)], vec![float("voltage", 220.0)])
    );
    assert_eq!(
        notify("sensor.humidity"),
        record(vec![on_off(true), pause(false)], vec![float("humidity", 95.0)])
    );
    assert_eq!(notify(""), record(vec![on_off(true), pause(false)], vec![]));
}

#[test]
fn test_notification_skips_unreportable() {
    let e = Fixture {
        voltage_reportable: false,
        ..Default::default()
    }
    .build();

    assert_eq!(
        serde_json::to_value(e.notification_serialize("sensor.voltage")).unwrap(),
        record(vec![on_off(true), pause(false)], vec![])
    );
}

#[test]
fn test_query_skips_unretrievable() {
    let e = Fixture {
        pause_retrievable: false,
        temperature_retrievable: false,
        ..Default::default()
    }
    .build();

    assert_eq!(
        serde_json::to_value(e.query_serialize()).unwrap(),
        record(
            vec![on_off(true)],
            vec![float("voltage", 220.0), float("humidity", 95.0)],
        )
    );
}

#[test]
fn test_query_skips_unavailable_sources() {
    let e = Fixture {
        pause_state: "unavailable",
        voltage_state: "unavailable",
        humidity_state: "unavailable",
        ..Default::default()
    }
    .build();

    assert_eq!(
        serde_json::to_value(e.query_serialize()).unwrap(),
        record(vec![on_off(true)], vec![float("temperature", 5.0)])
    );
}

#[test]
fn test_execute_dispatches_to_capability() {
    let e = Fixture::default().build();
    let ctx = Context::new();

    let call = e
        .execute(&ctx, CAPABILITIES_TOGGLE, TOGGLE_INSTANCE_PAUSE, &json!(true))
        .unwrap();
    assert_eq!(call.service_id(), "input_boolean.toggle");
    assert_eq!(call.entity_id(), Some("input_boolean.pause"));
}

#[test]
fn test_query_omits_overflowing_reading() {
    let e = entity(
        Config::new(),
        state(
            "sensor.v",
            "1e307",
            json!({"device_class": "voltage", "unit_of_measurement": "V"}),
        ),
    );

    assert_eq!(
        serde_json::to_value(e.query_serialize()).unwrap(),
        json!({"id": "sensor.v", "capabilities": [], "properties": []})
    );
}
