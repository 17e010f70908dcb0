//! Configuration for the core crate
//!
//! This module provides configuration options for tables, including row
//! coercion rules, query logging thresholds and the log level.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::error::ConfigError;

/// Row validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accept numeric text such as `"30"` for `int` and `float` columns
    pub coerce_numeric_strings: bool,

    /// Reject input keys that are not schema columns
    pub reject_unknown_fields: bool,

    /// Additional chrono formats tried when parsing timestamps
    pub datetime_formats: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            coerce_numeric_strings: true,
            reject_unknown_fields: false,
            datetime_formats: Vec::new(),
        }
    }
}

/// Query and bulk-operation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Queries and dedupes slower than this are logged at info level
    pub slow_query_threshold: Duration,

    /// Treat a double-quoted token that names no column as a text literal
    pub quoted_identifiers_as_text: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            slow_query_threshold: Duration::from_millis(100),
            quoted_identifiers_as_text: true,
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Row validation configuration
    pub validation: ValidationConfig,

    /// Query configuration
    pub query: QueryConfig,

    /// Log level
    pub log_level: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            validation: ValidationConfig::default(),
            query: QueryConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl TableConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Create a development configuration
    pub fn development() -> Self {
        let mut config = Self::default();
        config.log_level = "debug".to_string();
        config
    }

    /// Create a strict configuration: no lax coercions, no extra fields
    pub fn strict() -> Self {
        let mut config = Self::default();
        config.validation.coerce_numeric_strings = false;
        config.validation.reject_unknown_fields = true;
        config.query.quoted_identifiers_as_text = false;
        config
    }

    /// Create a testing configuration
    pub fn testing() -> Self {
        let mut config = Self::development();
        config.query.slow_query_threshold = Duration::from_millis(10);
        config
    }
}
