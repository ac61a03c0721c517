// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serialization configuration.
//!
//! Supports both programmatic and TOML file configuration:
//!
//! ```toml
//! portable_version = 1
//! byte_order = "big_endian"
//!
//! [[class_definitions]]
//! factory_id = 1
//! class_id = 2
//! fields = [
//!     { index = 0, name = "id", field_type = "long" },
//!     { index = 1, name = "owner", field_type = "portable", factory_id = 1, class_id = 3 },
//! ]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::class_def::ClassDefinitionRecord;
use crate::cursor::ByteOrder;
use crate::error::SchemaError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        SchemaError::Config(err.to_string())
    }
}

/// Serialization service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SerializationConfig {
    /// Version stamped on classes that declare none.
    #[serde(default)]
    pub portable_version: i32,

    /// Byte order of fixed-width integers on the wire.
    #[serde(default)]
    pub byte_order: ByteOrder,

    /// Treat every non-Portable field tag as malformed during schema discovery.
    #[serde(default)]
    pub strict_schema_discovery: bool,

    /// Class definitions registered when the context starts.
    #[serde(default)]
    pub class_definitions: Vec<ClassDefinitionRecord>,
}

impl SerializationConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_portable_version(mut self, version: i32) -> Self {
        self.portable_version = version;
        self
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_strict_schema_discovery(mut self, strict: bool) -> Self {
        self.strict_schema_discovery = strict;
        self
    }

    pub fn add_class_definition(&mut self, record: ClassDefinitionRecord) {
        self.class_definitions.push(record);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.portable_version < 0 {
            return Err(ConfigError::Invalid(format!(
                "portable_version must be >= 0, got {}",
                self.portable_version
            )));
        }

        let mut seen = HashSet::new();
        for (i, record) in self.class_definitions.iter().enumerate() {
            let version = record.version.unwrap_or(self.portable_version);
            if !seen.insert((record.factory_id, record.class_id, version)) {
                return Err(ConfigError::Invalid(format!(
                    "class definition {} duplicates factory {} class {} version {}",
                    i, record.factory_id, record.class_id, version
                )));
            }
            record
                .clone()
                .into_class_definition()
                .map_err(|e| ConfigError::Invalid(format!("class definition {}: {}", i, e)))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    const SAMPLE: &str = r#"
portable_version = 2
byte_order = "little_endian"

[[class_definitions]]
factory_id = 1
class_id = 2
fields = [
    { index = 0, name = "id", field_type = "long" },
    { index = 1, name = "owner", field_type = "portable", factory_id = 1, class_id = 3 },
]
"#;

    #[test]
    fn defaults() {
        let config = SerializationConfig::default();
        assert_eq!(config.portable_version, 0);
        assert_eq!(config.byte_order, ByteOrder::BigEndian);
        assert!(!config.strict_schema_discovery);
        assert!(config.class_definitions.is_empty());
    }

    #[test]
    fn parse_toml() {
        let config = SerializationConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.portable_version, 2);
        assert_eq!(config.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.class_definitions.len(), 1);

        let cd = config.class_definitions[0]
            .clone()
            .into_class_definition()
            .unwrap();
        assert_eq!(cd.version(), None);
        assert_eq!(cd.field_type("owner"), Some(FieldType::Portable));
        assert_eq!(cd.field_class_id("owner"), Some(3));
        assert_eq!(cd.field("id").unwrap().factory_id(), 0);
    }

    #[test]
    fn empty_toml_is_default() {
        let config = SerializationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SerializationConfig::default());
    }

    #[test]
    fn negative_version_is_invalid() {
        let err = SerializationConfig::from_toml_str("portable_version = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn duplicate_identity_is_invalid() {
        let mut config = SerializationConfig::default();
        let record = ClassDefinitionRecord {
            factory_id: 1,
            class_id: 1,
            version: None,
            fields: Vec::new(),
        };
        config.add_class_definition(record.clone());
        config.add_class_definition(ClassDefinitionRecord {
            version: Some(0),
            ..record
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_field_order_is_invalid() {
        let toml = r#"
[[class_definitions]]
factory_id = 1
class_id = 2
fields = [{ index = 1, name = "id", field_type = "int" }]
"#;
        let err = SerializationConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("field index mismatch"));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serialization.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = SerializationConfig::from_file(&path).unwrap();
        assert_eq!(config.portable_version, 2);

        let missing = SerializationConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn config_error_maps_into_schema_error() {
        let err: SchemaError = ConfigError::Invalid("bad".into()).into();
        assert_eq!(err, SchemaError::Config("Invalid configuration: bad".into()));
    }
}
