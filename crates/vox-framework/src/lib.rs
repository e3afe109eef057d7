//! # Vox Framework
//!
//! Binds the slots of an intent invocation to the parameters of a plain Rust
//! function.
//!
//! This layer provides:
//! - Converter resolution from a parameter's type ([`ConverterSpec`])
//! - Argument binding with silent and strict failure policies ([`BoundIntent`])
//! - Handler traits for async and blocking functions ([`Handler`], [`ErrorHandler`])
//! - The intent registry and its link-time collection slice ([`IntentRegistry`], [`INTENTS`])
//!
//! # Example
//!
//! ```rust,ignore
//! use vox_framework::{Handler, Intent, IntentRegistry};
//!
//! async fn forecast(location: String, date: Option<NaiveDate>) -> String {
//!     format!("Sunny in {location}")
//! }
//!
//! let mut registry = IntentRegistry::new();
//! registry.register(
//!     Intent::new("WEATHER__FORECAST")
//!         .params(["location", "date"])
//!         .handler(Handler::asynchronous(forecast)),
//! )?;
//!
//! let response = registry.invoke(request).await?;
//! ```

pub mod binder;
pub mod converter;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod registry;
pub mod value;

pub use binder::{BindPolicy, BoundIntent, ParamBinding};
pub use converter::{Converter, ConverterSpec, CustomConverter, ScalarType};
pub use error::{
    ConversionError, EmptySlot, InvokeError, InvokeResult, RegistrationError, RegistrationResult,
};
pub use extractor::{ArgSource, ArgSpec, BoundArgs, IntentArg, Rank, SlotType};
pub use handler::{
    AsyncIntentFn, BlockingIntentFn, ErrorHandler, Handler, HandlerId, HandlerKind,
    IntoResponse,
};
pub use registry::{INTENTS, Intent, IntentFactory, IntentRegistry};
pub use value::{BoundArg, RawArg, RawElement, SlotValue};

pub use linkme;
pub use tower::BoxError;
