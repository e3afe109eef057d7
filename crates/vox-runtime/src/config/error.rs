//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format feature.
    #[error("Unsupported or disabled configuration file format: .{0}")]
    UnsupportedFormat(String),

    /// The merged sources do not deserialize into a
    /// [`SkillConfig`](super::SkillConfig), e.g. an unknown log level.
    #[error("Failed to extract configuration: {0}")]
    Extract(#[from] figment::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
