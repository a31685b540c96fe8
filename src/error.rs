use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HazardError>;

#[derive(Error, Debug)]
pub enum HazardError {
    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl HazardError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
