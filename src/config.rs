//! Configuration for the validation engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (dto-schema.toml)
//! - Environment variables (DTO_SCHEMA__*)
//!
//! ## Example config file (dto-schema.toml):
//! ```toml
//! [limits]
//! max_depth = 128
//!
//! [output]
//! format = "compact"
//!
//! [checks]
//! builtins = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::schema::DEFAULT_MAX_DEPTH;

/// Main configuration for the engine and the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Validation limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Check registry settings
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// Validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// How deep validation descends into nested data before giving up
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format for error trees (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    /// Render a value in this format
    pub fn render<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

/// Check registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Register the built-in checks on every new schema
    #[serde(default = "default_true")]
    pub builtins: bool,
}

// Default value functions
fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_true() -> bool {
    true
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self { builtins: true }
    }
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "dto-schema.toml",
            ".dto-schema.toml",
            "config/dto-schema.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "dto-schema", "dto-schema") {
            let xdg_config = config_dir.config_dir().join("dto-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (DTO_SCHEMA__*)
        builder = builder.add_source(
            Environment::with_prefix("DTO_SCHEMA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
