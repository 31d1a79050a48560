//! World configuration.
//!
//! Every bound is fixed for the lifetime of a world; storage is pre-sized
//! from these values and never grows past them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Capacity bounds for a [`crate::World`].
///
/// Missing fields in TOML fall back to their defaults:
///
/// ```
/// let config = grove_ecs::WorldConfig::from_toml_str("max_entities = 64").unwrap();
/// assert_eq!(config.max_entities, 64);
/// assert_eq!(config.max_groups, grove_ecs::WorldConfig::DEFAULT_MAX_GROUPS);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Entity id domain; also the sparse capacity of every store and group.
    pub max_entities: usize,
    /// Distinct component types per world.
    pub max_component_types: usize,
    /// Components each store can hold at once.
    pub max_components: usize,
    /// Live cached groups.
    pub max_groups: usize,
    /// Registered systems.
    pub max_systems: usize,
}

impl WorldConfig {
    pub const DEFAULT_MAX_ENTITIES: usize = 1024;
    pub const DEFAULT_MAX_COMPONENT_TYPES: usize = 64;
    pub const DEFAULT_MAX_COMPONENTS: usize = 512;
    pub const DEFAULT_MAX_GROUPS: usize = 64;
    pub const DEFAULT_MAX_SYSTEMS: usize = 128;

    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject bounds no world can be built with.
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("max_entities", self.max_entities),
            ("max_component_types", self.max_component_types),
            ("max_components", self.max_components),
            ("max_groups", self.max_groups),
            ("max_systems", self.max_systems),
        ];
        if let Some((name, _)) = bounds.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        // Entity ids are u32 and the set marker takes the top value.
        if self.max_entities >= u32::MAX as usize {
            return Err(Error::Config(format!(
                "max_entities must be below {}",
                u32::MAX
            )));
        }
        Ok(())
    }

    #[must_use]
    pub const fn with_max_entities(mut self, value: usize) -> Self {
        self.max_entities = value;
        self
    }

    #[must_use]
    pub const fn with_max_component_types(mut self, value: usize) -> Self {
        self.max_component_types = value;
        self
    }

    #[must_use]
    pub const fn with_max_components(mut self, value: usize) -> Self {
        self.max_components = value;
        self
    }

    #[must_use]
    pub const fn with_max_groups(mut self, value: usize) -> Self {
        self.max_groups = value;
        self
    }

    #[must_use]
    pub const fn with_max_systems(mut self, value: usize) -> Self {
        self.max_systems = value;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: Self::DEFAULT_MAX_ENTITIES,
            max_component_types: Self::DEFAULT_MAX_COMPONENT_TYPES,
            max_components: Self::DEFAULT_MAX_COMPONENTS,
            max_groups: Self::DEFAULT_MAX_GROUPS,
            max_systems: Self::DEFAULT_MAX_SYSTEMS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.max_entities, 1024);
        assert_eq!(config.max_component_types, 64);
        assert_eq!(config.max_components, 512);
        assert_eq!(config.max_groups, 64);
        assert_eq!(config.max_systems, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = WorldConfig::from_toml_str(
            r#"
            max_entities = 4
            max_groups = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.max_entities, 4);
        assert_eq!(config.max_groups, 2);
        assert_eq!(config.max_components, WorldConfig::DEFAULT_MAX_COMPONENTS);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = WorldConfig::default().with_max_systems(3);
        let text = config.to_toml_string().unwrap();
        assert_eq!(WorldConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            WorldConfig::from_toml_str("max_entities = 0"),
            Err(Error::Config(message)) if message.contains("max_entities")
        ));
        assert!(matches!(
            WorldConfig::from_toml_str("max_entities = \"many\""),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            WorldConfig::from_toml_str("max_widgets = 3"),
            Err(Error::Config(_))
        ));
        assert!(
            WorldConfig::default()
                .with_max_entities(u32::MAX as usize)
                .validate()
                .is_err()
        );
    }
}
