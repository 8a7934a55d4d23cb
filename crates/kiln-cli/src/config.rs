//! Build configuration (kiln.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KilnConfig {
    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub init: InitConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Classpath and runtime location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    /// Directories and archives, highest precedence first
    #[serde(default)]
    pub classpath: Vec<String>,

    /// Runtime home, used when `KILN_HOME` is not set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

/// Pre-analysis initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InitConfig {
    /// Cluster entry points, in initialization order
    #[serde(default)]
    pub triggers: Vec<String>,

    /// Fail when a dependency cycle has no trigger
    #[serde(default)]
    pub strict: bool,

    /// Types taking part in initialization
    #[serde(default)]
    pub types: Vec<TypeConfig>,
}

/// A type taking part in initialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeConfig {
    /// Fully-qualified type name
    pub name: String,

    /// Types initialized before this one
    #[serde(default)]
    pub requires: Vec<String>,

    /// Types first-touched from this type's initializer
    #[serde(default)]
    pub touches: Vec<String>,
}

/// Analysis phase settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    /// Types analysis starts from
    #[serde(default)]
    pub roots: Vec<String>,

    /// Worker threads (defaults to the number of CPUs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl KilnConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse and validate config text.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: KilnConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross references between triggers and declared types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut declared = HashSet::new();
        for ty in &self.init.types {
            if ty.name.trim().is_empty() {
                return Err(ConfigError::Invalid("type with an empty name".to_string()));
            }
            if !declared.insert(ty.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "type '{}' declared twice",
                    ty.name
                )));
            }
        }

        for ty in &self.init.types {
            for dep in ty.requires.iter().chain(&ty.touches) {
                if !declared.contains(dep.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "type '{}' references undeclared type '{}'",
                        ty.name, dep
                    )));
                }
            }
        }

        for trigger in &self.init.triggers {
            if !declared.contains(trigger.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "trigger '{}' is not a declared type",
                    trigger
                )));
            }
        }

        if self.analysis.workers == Some(0) {
            return Err(ConfigError::Invalid(
                "analysis.workers must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Classpath entries resolved against `base_dir`, in declaration order.
    pub fn classpath(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.image
            .classpath
            .iter()
            .map(|entry| base_dir.join(entry))
            .collect()
    }
}
