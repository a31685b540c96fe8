use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HazardError, Result};

const MAX_DELAY_MS: u64 = 10 * 60 * 1000;

/// How the one-time-initialization guards of a [`Services`](crate::Services)
/// context relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardMode {
    /// Every cell initializes under one process-wide guard. A slow
    /// initializer stalls callers of every other cell.
    #[default]
    Shared,
    /// Each cell has its own guard; only callers of the same cell wait.
    Isolated,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub logger_delay_ms: u64,
    pub duke_delay_ms: u64,
    pub guard: GuardMode,
}

impl Default for HazardConfig {
    fn default() -> Self {
        HazardConfig {
            logger_delay_ms: 3_000,
            duke_delay_ms: 10_000,
            guard: GuardMode::Shared,
        }
    }
}

impl HazardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HazardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| HazardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("logger_delay_ms", self.logger_delay_ms),
            ("duke_delay_ms", self.duke_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(HazardError::invalid_config(
                    field,
                    format!("{value} ms exceeds the {MAX_DELAY_MS} ms ceiling"),
                ));
            }
        }
        Ok(())
    }

    pub fn logger_delay(&self) -> Duration {
        Duration::from_millis(self.logger_delay_ms)
    }

    pub fn duke_delay(&self) -> Duration {
        Duration::from_millis(self.duke_delay_ms)
    }

    /// Short delays for tests and quick runs.
    pub fn fast(guard: GuardMode) -> Self {
        HazardConfig {
            logger_delay_ms: 100,
            duke_delay_ms: 400,
            guard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_demo_timings() {
        let config = HazardConfig::default();
        assert_eq!(config.logger_delay(), Duration::from_secs(3));
        assert_eq!(config.duke_delay(), Duration::from_secs(10));
        assert_eq!(config.guard, GuardMode::Shared);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = HazardConfig::from_toml_str("duke_delay_ms = 250\nguard = \"isolated\"").unwrap();
        assert_eq!(config.duke_delay_ms, 250);
        assert_eq!(config.logger_delay_ms, 3_000);
        assert_eq!(config.guard, GuardMode::Isolated);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = HazardConfig::from_toml_str("guard = \"sometimes\"").unwrap_err();
        assert!(matches!(err, HazardError::Config(_)));
    }

    #[test]
    fn test_delay_ceiling() {
        let err = HazardConfig::from_toml_str("logger_delay_ms = 600001").unwrap_err();
        match err {
            HazardError::InvalidConfig { field, .. } => assert_eq!(field, "logger_delay_ms"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(HazardConfig::from_toml_str("logger_delay_ms = 600000").is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logger_delay_ms = 5").unwrap();
        writeln!(file, "duke_delay_ms = 7").unwrap();

        let config = HazardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logger_delay(), Duration::from_millis(5));
        assert_eq!(config.duke_delay(), Duration::from_millis(7));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HazardConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, HazardError::Io { .. }));
    }
}
