use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable selecting whether records use a flat schema.
pub const ENV_USE_FLAT_SCHEMA: &str = "ROW_TO_PUBSUB_USE_FLAT_SCHEMA";

/// Environment variable enabling publish time extraction from `event_timestamp`.
pub const ENV_TIMESTAMP_ATTRIBUTE_ENABLED: &str = "ROW_TO_PUBSUB_TIMESTAMP_ATTRIBUTE_ENABLED";

const TIMESTAMP_ATTRIBUTE_KEY: &str = "timestampAttributeKey";
const PAYLOAD_FIELD: &str = "payload";
const ATTRIBUTES_FIELD: &str = "attributes";

/// Converter configuration. Built once and never changed for the life of a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Only flat schemas are supported; a converter refuses to build when this is false.
    pub use_flat_schema: bool,
    /// Read `event_timestamp` from every record and use it as the publish time.
    pub timestamp_attribute_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_flat_schema: true,
            timestamp_attribute_enabled: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flat_schema(mut self, use_flat_schema: bool) -> Self {
        self.use_flat_schema = use_flat_schema;
        self
    }

    pub fn with_timestamp_attribute(mut self, enabled: bool) -> Self {
        self.timestamp_attribute_enabled = enabled;
        self
    }

    /// Reads the configuration from the process environment. Unset variables keep their
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_USE_FLAT_SCHEMA) {
            config.use_flat_schema = parse_bool(ENV_USE_FLAT_SCHEMA, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMESTAMP_ATTRIBUTE_ENABLED) {
            config.timestamp_attribute_enabled =
                parse_bool(ENV_TIMESTAMP_ATTRIBUTE_ENABLED, &value)?;
        }
        Ok(config)
    }

    /// Derives the configuration from a table definition.
    ///
    /// The definition is a JSON object with an optional `schema` (array of `{"name": ..}`
    /// columns) and optional `properties`. A schema holding both a `payload` and an
    /// `attributes` column describes a nested message, not a flat one. A non-empty
    /// `properties.timestampAttributeKey` turns on publish time extraction.
    pub fn from_table_properties(table: &serde_json::Value) -> Result<Self> {
        let table = table.as_object().ok_or_else(|| {
            Error::ConfigurationError("table definition must be a JSON object".to_string())
        })?;

        let mut has_payload = false;
        let mut has_attributes = false;
        if let Some(schema) = table.get("schema") {
            let columns = schema.as_array().ok_or_else(|| {
                Error::ConfigurationError("table schema must be an array of columns".to_string())
            })?;
            for column in columns {
                match column.get("name").and_then(|n| n.as_str()) {
                    Some(PAYLOAD_FIELD) => has_payload = true,
                    Some(ATTRIBUTES_FIELD) => has_attributes = true,
                    Some(_) => {}
                    None => {
                        return Err(Error::ConfigurationError(format!(
                            "table schema column without a name: {column}"
                        )))
                    }
                }
            }
        }

        let timestamp_attribute_enabled = table
            .get("properties")
            .and_then(|p| p.get(TIMESTAMP_ATTRIBUTE_KEY))
            .and_then(|k| k.as_str())
            .is_some_and(|k| !k.is_empty());

        Ok(Self {
            use_flat_schema: !(has_payload && has_attributes),
            timestamp_attribute_enabled,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(Error::ConfigurationError(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::new();
        assert!(config.use_flat_schema);
        assert!(!config.timestamp_attribute_enabled);
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_flat_schema(false)
            .with_timestamp_attribute(true);
        assert!(!config.use_flat_schema);
        assert!(config.timestamp_attribute_enabled);
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let config: Config = serde_json::from_str(r#"{"timestampAttributeEnabled": true}"#).unwrap();
        assert_eq!(config, Config::new().with_timestamp_attribute(true));

        let config: Config = serde_json::from_str(r#"{"useFlatSchema": false}"#).unwrap();
        assert!(!config.use_flat_schema);
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_USE_FLAT_SCHEMA, "TRUE"),
            (ENV_TIMESTAMP_ATTRIBUTE_ENABLED, " 1 "),
        ]);
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert!(config.use_flat_schema);
        assert!(config.timestamp_attribute_enabled);

        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_lookup_rejects_invalid_bool() {
        let err = Config::from_lookup(|k| {
            (k == ENV_TIMESTAMP_ATTRIBUTE_ENABLED).then(|| "maybe".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
        assert!(err.to_string().contains(ENV_TIMESTAMP_ATTRIBUTE_ENABLED));
    }

    #[test]
    fn test_from_table_properties_flat_with_timestamp() {
        let table = json!({
            "schema": [{"name": "id"}, {"name": "name"}, {"name": "event_timestamp"}],
            "properties": {"timestampAttributeKey": "ts"}
        });
        let config = Config::from_table_properties(&table).unwrap();
        assert!(config.use_flat_schema);
        assert!(config.timestamp_attribute_enabled);
    }

    #[test]
    fn test_from_table_properties_nested_schema() {
        let table = json!({
            "schema": [{"name": "event_timestamp"}, {"name": "attributes"}, {"name": "payload"}],
            "properties": {"timestampAttributeKey": ""}
        });
        let config = Config::from_table_properties(&table).unwrap();
        assert!(!config.use_flat_schema);
        assert!(!config.timestamp_attribute_enabled);
    }

    #[test]
    fn test_from_table_properties_invalid() {
        assert!(Config::from_table_properties(&json!([])).is_err());
        assert!(Config::from_table_properties(&json!({"schema": {}})).is_err());
        assert!(Config::from_table_properties(&json!({"schema": [{"type": "INT64"}]})).is_err());
        assert_eq!(
            Config::from_table_properties(&json!({})).unwrap(),
            Config::default()
        );
    }
}
