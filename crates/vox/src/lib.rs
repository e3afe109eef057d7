//! # Vox
//!
//! Build voice skills from plain Rust functions.
//!
//! ## Overview
//!
//! A voice platform resolves an utterance to an *intent* with named *slots*.
//! Vox takes the intent invocation request, converts each slot's raw values
//! into the native type a handler parameter declares, and calls the handler:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────────────────────┐
//! │ InvokeRequest│────▶│ IntentRegistry   │────▶│ BoundIntent "WEATHER"     │──▶ Response
//! │  (slots)     │     │  (name lookup)   │     │  convert ▸ bind ▸ call fn │
//! └──────────────┘     └──────────────────┘     └───────────────────────────┘
//! ```
//!
//! - **Core**: request and response envelopes, entity converters ([`core`])
//! - **Framework**: converter resolution, argument binding, registry ([`framework`])
//! - **Runtime**: configuration, logging, the [`Skill`](runtime::Skill) object ([`runtime`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vox::prelude::*;
//!
//! #[intent("WEATHER__CURRENT")]
//! async fn current(location: String, date: Option<NaiveDate>) -> String {
//!     match date {
//!         Some(date) => format!("Sunny in {location} on {date}"),
//!         None => format!("Sunny in {location}"),
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let skill = Skill::builder().collect_registered().build()?;
//!     let response = skill.handle(request).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: Load `vox.toml` configuration files (default)
//! - `yaml-config`: Load `vox.yaml` configuration files
//! - `json-log`: JSON log output

pub use vox_core as core;
pub use vox_framework as framework;
pub use vox_runtime as runtime;

pub use vox_macros::intent;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use vox::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use vox_runtime::{Skill, SkillBuilder, SkillError};

    // Registration
    pub use crate::intent;
    pub use vox_framework::{ErrorHandler, Handler, Intent, IntentRegistry};

    // Handler parameters and results
    pub use vox_core::chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
    pub use vox_core::{
        AttributeV2, Context, InvokeRequest, Response, ResponseType, Session, TimeRange,
        TimeSet,
    };
    pub use vox_framework::{ConversionError, InvokeError, Rank};
}
