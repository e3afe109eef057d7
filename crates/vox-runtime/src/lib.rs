//! Vox Runtime - configuration, logging and the skill application object.
//!
//! This crate provides:
//! - Layered configuration loading with figment ([`config`])
//! - Logging setup on `tracing-subscriber` ([`logging`])
//! - The [`Skill`] object that owns an intent registry and serves requests
//!
//! ```ignore
//! use vox_runtime::Skill;
//!
//! let skill = Skill::builder()
//!     .collect_registered()
//!     .build()?;
//!
//! // Called by the transport layer for every request
//! let response = skill.handle(request).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod skill;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, SkillConfig, load_config};
pub use error::{SkillError, SkillResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use skill::{Skill, SkillBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
