//! Runtime error types.

use thiserror::Error;
use vox_framework::{InvokeError, RegistrationError};

use crate::config::ConfigError;

/// Errors that can occur while building or running a skill.
#[derive(Error, Debug)]
pub enum SkillError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An intent registration was rejected.
    #[error("Intent registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// An invocation failed.
    #[error("Invocation failed: {0}")]
    Invoke(#[from] InvokeError),
}

impl SkillError {
    /// Returns the invocation error, if this is one.
    pub fn as_invoke(&self) -> Option<&InvokeError> {
        match self {
            Self::Invoke(error) => Some(error),
            _ => None,
        }
    }
}

/// Result type for skill operations.
pub type SkillResult<T> = Result<T, SkillError>;
