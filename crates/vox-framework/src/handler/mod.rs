//! Handler system for the Vox framework.
//!
//! - **Traits** ([`traits`]) – [`AsyncIntentFn`] and [`BlockingIntentFn`],
//!   implemented for functions of 0-16 [`IntentArg`](crate::IntentArg)
//!   parameters
//! - **Response** ([`response`]) – [`IntoResponse`] for handler return values
//! - **Erased** ([`erased`]) – [`Handler`] and [`ErrorHandler`], the
//!   type-erased forms stored by the registry
//!
//! ```rust,ignore
//! use vox::prelude::*;
//!
//! // Awaited on the calling task.
//! async fn greet(name: String) -> String {
//!     format!("Hello, {name}!")
//! }
//!
//! // Run on the blocking worker pool.
//! fn lookup(city: String) -> Result<Response, std::io::Error> {
//!     let forecast = std::fs::read_to_string(format!("/var/forecasts/{city}"))?;
//!     Ok(Response::tell(forecast))
//! }
//!
//! let greet = Handler::asynchronous(greet);
//! let lookup = Handler::blocking(lookup);
//! ```

pub mod erased;
pub mod response;
pub mod traits;

pub use erased::{ErrorHandler, Handler, HandlerId, HandlerKind};
pub use response::IntoResponse;
pub use traits::{AsyncIntentFn, BlockingIntentFn};
