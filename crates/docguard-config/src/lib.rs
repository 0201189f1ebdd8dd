//! Configuration management for docguard
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (DOCGUARD_* prefix)
//! 3. docguard.local.toml (gitignored, local overrides)
//! 4. docguard.toml (git-tracked, project config)
//! 5. ~/.config/docguard/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use docguard::Mode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Log levels accepted in `[logging] level`.
pub const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Main docguard configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocguardConfig {
    pub evaluation: EvaluationConfig,
    pub cache: CacheConfig,
    pub declarations: DeclarationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Mode for rule sets that declare none.
    pub default_mode: Mode,
    /// Log every decision.
    pub audit: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::default(),
            audit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Snapshot location for the `file` backend.
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            path: PathBuf::from(".docguard/rules.json"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CacheBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationsConfig {
    pub path: PathBuf,
}

impl Default for DeclarationsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("declarations.toml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DocguardConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Check values the type system cannot.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cache.backend == CacheBackend::File && self.cache.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "cache.path must be set for the file backend".to_string(),
            ));
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown logging.level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Resolve relative paths to absolute
    pub fn resolve_paths(&mut self, base_dir: impl AsRef<Path>) {
        let base = base_dir.as_ref();

        if self.cache.path.is_relative() && !self.cache.path.as_os_str().is_empty() {
            self.cache.path = base.join(&self.cache.path);
        }

        if self.declarations.path.is_relative() {
            self.declarations.path = base.join(&self.declarations.path);
        }
    }

    /// Render as TOML, in the layout the config files use.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
