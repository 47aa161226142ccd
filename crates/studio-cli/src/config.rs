//! Studio configuration
//!
//! Read from a JSON file; every key is optional and falls back to the
//! engine defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use studio_engine::{SequencerOptions, SessionOptions, StoreOptions};

/// Session housekeeping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds without access before a session is closed
    pub stale_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_timeout_secs: 300,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub sequencer: SequencerOptions,
    pub store: StoreOptions,
    pub session: SessionConfig,
}

impl StudioConfig {
    /// Load configuration from disk
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents).map_err(ConfigError::Parse)?;
        config.check()?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.sequencer.min_delay_ms > self.sequencer.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "sequencer.min_delay_ms ({}) exceeds sequencer.max_delay_ms ({})",
                self.sequencer.min_delay_ms, self.sequencer.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            store: self.store.clone(),
            sequencer: self.sequencer.clone(),
        }
    }

    pub fn stale_timeout(&self) -> Duration {
        Duration::from_secs(self.session.stale_timeout_secs)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StudioConfig::load(&dir.path().join("studio.json")).await.unwrap();
        assert_eq!(config.sequencer.min_delay_ms, 500);
        assert_eq!(config.sequencer.max_delay_ms, 2000);
        assert!(!config.store.allow_self_loops);
        assert_eq!(config.stale_timeout(), Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(
            &path,
            r#"{ "sequencer": { "seed": 7, "completion_delay_ms": 250 }, "store": { "cascade_edge_removal": true } }"#,
        )
        .unwrap();

        let config = StudioConfig::load(&path).await.unwrap();
        assert_eq!(config.sequencer.seed, Some(7));
        assert_eq!(config.sequencer.completion_delay_ms, 250);
        assert_eq!(config.sequencer.test_delay_ms, 1500);
        assert!(config.store.cascade_edge_removal);
        assert_eq!(config.store.undo_depth, 100);

        let options = config.session_options();
        assert_eq!(options.sequencer.seed, Some(7));
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = StudioConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[tokio::test]
    async fn test_inverted_delay_bounds_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studio.json");
        std::fs::write(&path, r#"{ "sequencer": { "min_delay_ms": 3000 } }"#).unwrap();

        let result = StudioConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
