//! Configuration module for Vox skills.
//!
//! Layered loading with figment (files, `VOX_*` environment variables,
//! programmatic overrides) and validation of the result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BinderConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SkillConfig, SkillInfo,
    SpanEventConfig,
};
pub use validation::validate_config;
