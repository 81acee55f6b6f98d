use serde::{Deserialize, Serialize};

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Label used for the world's tracing span.
    pub name: String,
    /// Whether joining and leaving fire [`AddedToWorld`](crate::AddedToWorld)
    /// and [`RemovedFromWorld`](crate::RemovedFromWorld).
    pub lifecycle_events: bool,
    /// Maximum number of entities. 0 = unlimited.
    pub max_entities: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            lifecycle_events: true,
            max_entities: 0,
        }
    }
}

impl WorldConfig {
    /// Set the world's name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable lifecycle events.
    pub fn with_lifecycle_events(mut self, enabled: bool) -> Self {
        self.lifecycle_events = enabled;
        self
    }

    /// Set the maximum number of entities (0 = unlimited).
    pub fn with_max_entities(mut self, max: usize) -> Self {
        self.max_entities = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = WorldConfig::default();
        assert_eq!(config.name, "world");
        assert!(config.lifecycle_events);
        assert_eq!(config.max_entities, 0);
    }

    #[test]
    fn config_builder_chain() {
        let config = WorldConfig::default()
            .with_name("arena")
            .with_lifecycle_events(false)
            .with_max_entities(16);
        assert_eq!(config.name, "arena");
        assert!(!config.lifecycle_events);
        assert_eq!(config.max_entities, 16);
    }

    #[test]
    fn config_missing_fields_use_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{"name":"lobby"}"#).unwrap();
        assert_eq!(config.name, "lobby");
        assert!(config.lifecycle_events);
        assert_eq!(config.max_entities, 0);
    }

    #[test]
    fn config_json_shape() {
        let json = serde_json::to_value(WorldConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "world",
                "lifecycle_events": true,
                "max_entities": 0
            })
        );
    }
}
