//! Layered configuration loading.
//!
//! Files are merged lowest precedence first: the user file under the
//! platform config directory, then `rewind.toml` and `rewind.local.toml` in
//! the project directory. Environment variables override every file.

use crate::{ConfigError, RewindConfig};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Git-tracked project settings.
const PROJECT_FILE: &str = "rewind.toml";
/// Untracked per-checkout overrides.
const LOCAL_FILE: &str = "rewind.local.toml";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "REWIND".to_string(),
            user_file: user_config_file(),
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "REWIND")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Replace the user-level file, or skip it with `None`
    pub fn with_user_file(mut self, path: Option<PathBuf>) -> Self {
        self.user_file = path;
        self
    }

    /// Files consulted by [`load`](Self::load), lowest precedence first.
    ///
    /// Missing files are skipped at load time.
    pub fn layers(&self) -> Vec<PathBuf> {
        self.user_file
            .iter()
            .cloned()
            .chain([
                self.project_dir.join(PROJECT_FILE),
                self.project_dir.join(LOCAL_FILE),
            ])
            .collect()
    }

    /// Merge defaults, every present file and the environment
    pub fn load(self) -> Result<RewindConfig> {
        let defaults = config::Config::try_from(&RewindConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        for file in self.layers().into_iter().filter(|path| path.exists()) {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // REWIND_WINDOW__WINDOW_MS=60000
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Load a single TOML file, bypassing the layered sources
    pub fn load_file(path: impl AsRef<Path>) -> Result<RewindConfig, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// `config.toml` in the platform config directory (`~/.config/rewind` on
/// Linux), or `None` when no home directory can be determined.
fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "Rewind", "rewind").map(|dirs| dirs.config_dir().join("config.toml"))
}
