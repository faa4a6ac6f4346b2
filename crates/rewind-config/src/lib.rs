//! Configuration management for rewind
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (REWIND_* prefix, `__` between nested keys)
//! 2. rewind.local.toml (gitignored, local overrides)
//! 3. rewind.toml (git-tracked, project config)
//! 4. ~/.config/rewind/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The loaded [`RewindConfig`] is validated into a
//! [`TimeWindowConfig`](rewind_types::TimeWindowConfig) before use.

use anyhow::Result;
use rewind_types::{StartPosition, TimeWindowConfig, TopicPartition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

/// Main rewind configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    pub window: WindowConfig,
    pub partition: PartitionConfig,
}

/// How far back to start and how long each record read may take
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// `"committed"` or `"newest"`
    pub start: StartPosition,
    pub window_ms: u64,
    pub probe_deadline_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: StartPosition::Committed,
            window_ms: 0,
            probe_deadline_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    pub topic: String,
    pub partition: u32,
}

impl RewindConfig {
    /// Load configuration with `project_dir` holding `rewind.toml`
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Check values that deserialize fine but cannot drive a resolution
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partition.topic.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "partition.topic",
                reason: "must not be empty",
            });
        }
        if self.window.probe_deadline_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "window.probe_deadline_ms",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Validate and convert into the resolver's input
    pub fn time_window(&self) -> Result<TimeWindowConfig, ConfigError> {
        self.validate()?;
        Ok(TimeWindowConfig::new(
            self.window.start,
            Duration::from_millis(self.window.window_ms),
            TopicPartition::new(self.partition.topic.clone(), self.partition.partition),
        )
        .with_probe_deadline(Duration::from_millis(self.window.probe_deadline_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> RewindConfig {
        RewindConfig {
            window: WindowConfig {
                start: StartPosition::Newest,
                window_ms: 100_000,
                ..Default::default()
            },
            partition: PartitionConfig {
                topic: "events".to_string(),
                partition: 3,
            },
        }
    }

    #[test]
    fn test_default_config() {
        let config = RewindConfig::default();
        assert_eq!(config.window.start, StartPosition::Committed);
        assert_eq!(config.window.window_ms, 0);
        assert_eq!(config.window.probe_deadline_ms, 5_000);
        assert!(config.partition.topic.is_empty());
    }

    #[test]
    fn test_time_window_conversion() {
        let window = configured().time_window().expect("valid config");
        assert_eq!(window.start, StartPosition::Newest);
        assert_eq!(window.window, Duration::from_secs(100));
        assert_eq!(window.partition, TopicPartition::new("events", 3));
        assert_eq!(window.probe_deadline, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_topic_rejected() {
        let mut config = configured();
        config.partition.topic = "  ".to_string();
        assert!(matches!(
            config.time_window(),
            Err(ConfigError::Invalid {
                key: "partition.topic",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_probe_deadline_rejected() {
        let mut config = configured();
        config.window.probe_deadline_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "window.probe_deadline_ms",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "invalid `window.probe_deadline_ms`: must be greater than zero"
        );
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(
            temp_dir.path().join("rewind.toml"),
            "[window]\nstart = \"newest\"\nwindow_ms = 30000\n\n[partition]\ntopic = \"orders\"\npartition = 2\n",
        )
        .expect("Failed to write config");

        let window = RewindConfig::load_from_dir(temp_dir.path())
            .expect("Failed to load config")
            .time_window()
            .expect("valid config");

        assert_eq!(window.start, StartPosition::Newest);
        assert_eq!(window.window, Duration::from_secs(30));
        assert_eq!(window.partition, TopicPartition::new("orders", 2));
    }
}
