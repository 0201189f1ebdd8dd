//! Configuration loader with multi-source merging

use crate::{DocguardConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "DOCGUARD".to_string(),
            user_config: true,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "DOCGUARD")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/docguard/config.toml.
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<DocguardConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        let defaults = DocguardConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config
        if self.user_config {
            if let Ok(user_config_file) = Paths::new().user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(toml_file(user_config_file));
                }
            }
        }

        // 3. Project config (docguard.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(toml_file(project_config_file));
        }

        // 4. Local config (docguard.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(toml_file(local_config_file));
        }

        // 5. Environment variables: DOCGUARD_EVALUATION__DEFAULT_MODE=and
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut docguard_config: DocguardConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        docguard_config.validate()?;
        docguard_config.resolve_paths(&self.project_dir);

        Ok(docguard_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> DocguardConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn toml_file(path: PathBuf) -> impl config::Source + Send + Sync + 'static {
    config::File::from(path)
        .required(false)
        .format(config::FileFormat::Toml)
}
