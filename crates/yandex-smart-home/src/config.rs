//! Integration configuration
//!
//! Parses the `yandex_smart_home:` section of configuration.yaml into a
//! read-only [`Config`] shared by every adapter.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;
use ysh_core::EntityId;

use crate::consts::{DOMAIN, PREFIX_TYPES, TYPES};
use crate::error::{ConfigError, ConfigResult};
use crate::property::FloatInstance;

/// Exposure predicate over entity ids
pub type ExposePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A property declared by the user and bound to an arbitrary entity
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConfig {
    pub instance: FloatInstance,

    /// Source entity; the adapter's own entity when absent
    pub entity: Option<EntityId>,

    /// Read this attribute instead of the state value
    pub attribute: Option<String>,
}

impl PropertyConfig {
    pub fn new(instance: FloatInstance) -> Self {
        Self {
            instance,
            entity: None,
            attribute: None,
        }
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

/// Per-entity overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityConfig {
    pub name: Option<String>,
    pub room: Option<String>,

    /// Forced device type, always in the full `devices.types.*` form
    pub device_type: Option<String>,

    pub properties: Vec<PropertyConfig>,
}

/// Credentials for pushing state notifications to the skill callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub skill_id: String,
    pub oauth_token: String,
    pub user_id: String,
}

/// Include/exclude rules in the Home Assistant `filter:` format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include_domains: Vec<String>,
    #[serde(default)]
    pub include_entities: Vec<String>,
    #[serde(default)]
    pub include_entity_globs: Vec<String>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
    #[serde(default)]
    pub exclude_entities: Vec<String>,
    #[serde(default)]
    pub exclude_entity_globs: Vec<String>,
}

/// Compiled entity filter
///
/// Rules are checked in order: included entity, excluded entity, included
/// glob, excluded glob, included domain, excluded domain. When nothing
/// matches the entity is exposed only if no include rule was given.
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    include_domains: HashSet<String>,
    include_entities: HashSet<String>,
    include_globs: Vec<Regex>,
    exclude_domains: HashSet<String>,
    exclude_entities: HashSet<String>,
    exclude_globs: Vec<Regex>,
}

impl EntityFilter {
    pub fn new(config: &FilterConfig) -> ConfigResult<Self> {
        Ok(Self {
            include_domains: config.include_domains.iter().cloned().collect(),
            include_entities: config.include_entities.iter().cloned().collect(),
            include_globs: compile_globs(&config.include_entity_globs)?,
            exclude_domains: config.exclude_domains.iter().cloned().collect(),
            exclude_entities: config.exclude_entities.iter().cloned().collect(),
            exclude_globs: compile_globs(&config.exclude_entity_globs)?,
        })
    }

    fn has_includes(&self) -> bool {
        !self.include_domains.is_empty()
            || !self.include_entities.is_empty()
            || !self.include_globs.is_empty()
    }

    fn has_excludes(&self) -> bool {
        !self.exclude_domains.is_empty()
            || !self.exclude_entities.is_empty()
            || !self.exclude_globs.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_includes() && !self.has_excludes()
    }

    pub fn matches(&self, entity_id: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        if self.include_entities.contains(entity_id) {
            return true;
        }
        if self.exclude_entities.contains(entity_id) {
            return false;
        }
        if self.include_globs.iter().any(|g| g.is_match(entity_id)) {
            return true;
        }
        if self.exclude_globs.iter().any(|g| g.is_match(entity_id)) {
            return false;
        }

        let domain = entity_id.split_once('.').map_or(entity_id, |(d, _)| d);
        if self.include_domains.contains(domain) {
            return true;
        }
        if self.exclude_domains.contains(domain) {
            return false;
        }

        !self.has_includes()
    }
}

/// Translate a `*`/`?` glob into an anchored regex
fn compile_globs(globs: &[String]) -> ConfigResult<Vec<Regex>> {
    globs
        .iter()
        .map(|glob| {
            let pattern = regex::escape(glob)
                .replace(r"\*", ".*")
                .replace(r"\?", ".");
            Regex::new(&format!("^{pattern}$")).map_err(|source| ConfigError::InvalidGlob {
                glob: glob.clone(),
                source,
            })
        })
        .collect()
}

/// Integration configuration
#[derive(Clone)]
pub struct Config {
    entity_config: HashMap<String, EntityConfig>,
    notifier: Option<NotifierConfig>,
    should_expose: ExposePredicate,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entity_config", &self.entity_config)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entity_config: HashMap::new(),
            notifier: None,
            should_expose: Arc::new(|_| true),
        }
    }
}

impl Config {
    /// Empty config exposing every entity
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_config(
        mut self,
        entity_id: impl Into<String>,
        config: EntityConfig,
    ) -> Self {
        self.entity_config.insert(entity_id.into(), config);
        self
    }

    pub fn with_should_expose<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.should_expose = Arc::new(predicate);
        self
    }

    pub fn with_filter(self, filter: EntityFilter) -> Self {
        self.with_should_expose(move |entity_id| filter.matches(entity_id))
    }

    pub fn with_notifier(mut self, notifier: NotifierConfig) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn should_expose(&self, entity_id: &str) -> bool {
        (self.should_expose)(entity_id)
    }

    pub fn entity_config(&self, entity_id: &str) -> Option<&EntityConfig> {
        self.entity_config.get(entity_id)
    }

    pub fn notifier(&self) -> Option<&NotifierConfig> {
        self.notifier.as_ref()
    }

    /// Entities whose custom properties read from `source`
    pub fn entities_bound_to<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entity_config
            .iter()
            .filter(move |(_, cfg)| {
                cfg.properties
                    .iter()
                    .any(|p| p.entity.as_ref().is_some_and(|e| e == source))
            })
            .map(|(entity_id, _)| entity_id.as_str())
    }

    /// Load from `configuration.yaml` in a config directory
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = config_dir.as_ref().join("configuration.yaml");
        let content = std::fs::read_to_string(&path)
            .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;

        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let yaml: Value = serde_yaml::from_str(content)?;
        Self::from_yaml(&yaml)
    }

    /// Build from a parsed configuration.yaml; a missing section yields defaults
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        let section = yaml
            .get(DOMAIN)
            .cloned()
            .filter(|v| !v.is_null())
            .unwrap_or(Value::Mapping(serde_yaml::Mapping::new()));

        let raw: RawConfig = serde_yaml::from_value(section)?;
        let mut config = Config::new();

        if let Some(filter) = raw.filter {
            config = config.with_filter(EntityFilter::new(&filter)?);
        }
        if let Some(notifier) = raw.notifier {
            config = config.with_notifier(notifier);
        }

        for (entity_id, entity_config) in raw.entity_config {
            if entity_id.parse::<EntityId>().is_err() {
                return Err(ConfigError::InvalidEntityId(entity_id));
            }
            let entity_config = entity_config.validate()?;
            config.entity_config.insert(entity_id, entity_config);
        }

        debug!(
            entities = config.entity_config.len(),
            notifier = config.notifier.is_some(),
            "Loaded yandex_smart_home config"
        );
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    filter: Option<FilterConfig>,

    #[serde(default)]
    entity_config: HashMap<String, RawEntityConfig>,

    #[serde(default)]
    notifier: Option<NotifierConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntityConfig {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    room: Option<String>,

    #[serde(rename = "type", default)]
    device_type: Option<String>,

    #[serde(default)]
    properties: Vec<RawPropertyConfig>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyConfig {
    #[serde(rename = "type")]
    property_type: String,

    #[serde(default)]
    entity: Option<String>,

    #[serde(default)]
    attribute: Option<String>,
}

impl RawEntityConfig {
    fn validate(self) -> ConfigResult<EntityConfig> {
        let device_type = self.device_type.map(normalize_device_type).transpose()?;
        let properties = self
            .properties
            .into_iter()
            .map(RawPropertyConfig::validate)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(EntityConfig {
            name: self.name,
            room: self.room,
            device_type,
            properties,
        })
    }
}

impl RawPropertyConfig {
    fn validate(self) -> ConfigResult<PropertyConfig> {
        let instance = self
            .property_type
            .parse::<FloatInstance>()
            .map_err(|_| ConfigError::UnknownPropertyType(self.property_type.clone()))?;
        let entity = self
            .entity
            .map(|e| e.parse::<EntityId>().map_err(|_| ConfigError::InvalidEntityId(e)))
            .transpose()?;

        Ok(PropertyConfig {
            instance,
            entity,
            attribute: self.attribute,
        })
    }
}

/// Accept both `openable` and `devices.types.openable`
fn normalize_device_type(value: String) -> ConfigResult<String> {
    let full = if value.starts_with(PREFIX_TYPES) {
        value
    } else {
        format!("{PREFIX_TYPES}{value}")
    };

    if TYPES.contains(&full.as_str()) {
        Ok(full)
    } else {
        Err(ConfigError::UnknownDeviceType(full))
    }
}
