//! Configuration for JSON Schema reference naming
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jsonschema.toml)
//! - Environment variables (JSONSCHEMA__*)
//! - An untyped settings document (`from_node`)
//!
//! ## Example config file (jsonschema.toml):
//! ```toml
//! definitionPointer = "#/components/schemas"
//! alphanumericOnlyRefs = true
//! keepNamespaces = false
//! useJsonName = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::graph::SourceLocation;

/// Root used when no definition pointer is configured
pub const DEFAULT_POINTER: &str = "#/definitions";

/// Options that shape generated `$ref` pointers and property names.
///
/// Lowercase aliases accept keys from environment variables, which the
/// config loader lowercases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonSchemaConfig {
    /// Root of every non-inlined pointer
    #[serde(default = "default_definition_pointer", alias = "definitionpointer")]
    pub definition_pointer: String,

    /// Strip non-alphanumeric characters from pointer names
    #[serde(default, alias = "alphanumericonlyrefs")]
    pub alphanumeric_only_refs: bool,

    /// Prefix pointer names with the PascalCase namespace
    #[serde(default, alias = "keepnamespaces")]
    pub keep_namespaces: bool,

    /// Use a member's `jsonName` trait as its property name
    #[serde(default, alias = "usejsonname")]
    pub use_json_name: bool,
}

fn default_definition_pointer() -> String {
    DEFAULT_POINTER.to_string()
}

impl Default for JsonSchemaConfig {
    fn default() -> Self {
        Self {
            definition_pointer: default_definition_pointer(),
            alphanumeric_only_refs: false,
            keep_namespaces: false,
            use_json_name: false,
        }
    }
}

impl JsonSchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["jsonschema.toml", ".jsonschema.toml", "config/jsonschema.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "shape-projection", "shape-projection") {
            let xdg_config = config_dir.config_dir().join("jsonschema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (JSONSCHEMA__*)
        builder = builder.add_source(
            Environment::with_prefix("JSONSCHEMA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Deserialize from an untyped settings document
    pub fn from_node(node: &serde_json::Value) -> Result<Self> {
        serde_path_to_error::deserialize(node).map_err(|e| {
            let key = e.path().to_string();
            ProjectionError::MalformedConfiguration {
                context: "jsonschema".to_string(),
                key,
                message: e.into_inner().to_string(),
                location: SourceLocation::none(),
            }
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The definition pointer, always ending in `/`
    pub fn root_pointer(&self) -> String {
        if self.definition_pointer.ends_with('/') {
            self.definition_pointer.clone()
        } else {
            format!("{}/", self.definition_pointer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = JsonSchemaConfig::default();
        assert_eq!(config.definition_pointer, "#/definitions");
        assert_eq!(config.root_pointer(), "#/definitions/");
        assert!(!config.alphanumeric_only_refs);
        assert!(!config.keep_namespaces);
    }

    #[test]
    fn test_root_pointer_is_not_doubled() {
        let config = JsonSchemaConfig {
            definition_pointer: "#/components/schemas/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.root_pointer(), "#/components/schemas/");
    }

    #[test]
    fn test_from_node_uses_defaults_for_missing_keys() {
        let config = JsonSchemaConfig::from_node(&json!({"keepNamespaces": true})).unwrap();
        assert!(config.keep_namespaces);
        assert_eq!(config.definition_pointer, DEFAULT_POINTER);
    }

    #[test]
    fn test_from_node_reports_bad_key() {
        let err = JsonSchemaConfig::from_node(&json!({"alphanumericOnlyRefs": "yes"})).unwrap_err();
        assert!(matches!(err, ProjectionError::MalformedConfiguration { key, .. } if key == "alphanumericOnlyRefs"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "definitionPointer = \"#/components/schemas\"").unwrap();
        writeln!(file, "alphanumericOnlyRefs = true").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = JsonSchemaConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.root_pointer(), "#/components/schemas/");
        assert!(config.alphanumeric_only_refs);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jsonschema.toml");
        let path = path.to_str().unwrap();

        let config = JsonSchemaConfig {
            keep_namespaces: true,
            use_json_name: true,
            ..Default::default()
        };
        config.save(path).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("keepNamespaces = true"));
        assert_eq!(JsonSchemaConfig::load_from(Some(path)).unwrap(), config);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(JsonSchemaConfig::load_from(Some("/nonexistent/jsonschema.toml")).is_err());
    }
}
