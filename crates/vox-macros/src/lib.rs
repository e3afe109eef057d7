//! Procedural macros for the Vox skill SDK.
//!
//! - `#[intent("NAME")]` - Registers a function as the handler of an intent
//!
//! ```rust,ignore
//! use vox::prelude::*;
//!
//! #[intent("WEATHER__CURRENT")]
//! async fn current_weather(location: String, date: Option<NaiveDate>) -> String {
//!     format!("Sunny in {location}")
//! }
//!
//! let mut registry = IntentRegistry::new();
//! registry.collect_registered()?;
//! ```

mod intent;

use proc_macro::TokenStream;

/// Registers a function as the handler of an intent.
///
/// The function is left unchanged, so it can still be called directly. A
/// link-time registration is appended that `IntentRegistry::collect_registered`
/// picks up; parameter names become the attribute names looked up in the
/// request.
///
/// `async fn`s are awaited on the calling task, plain `fn`s run on the
/// blocking worker pool.
///
/// # Options
///
/// - `silent = false` - Raise conversion failures instead of delivering them
///   (default: the registry's policy)
/// - `error_handler = path` - Function called with `(parameter, error)` in
///   place of the handler when a parameter fails to convert. Must be `async`
///   exactly when the handler is.
///
/// In silent mode without an error handler the failure goes to the handler
/// itself, which needs a parameter that can hold it: declare the parameter
/// as `Result<T, ConversionError>` (or `Option<Result<..>>`). A parameter
/// declared as a plain `T` cannot, and its failure is still returned as
/// `InvokeError::Conversion`.
///
/// # Example
///
/// ```rust,ignore
/// async fn on_bad_date(parameter: String, error: ConversionError) -> Response {
///     Response::ask(format!("Sorry, which {parameter}?"))
/// }
///
/// #[intent("CALENDAR__DAY", error_handler = on_bad_date)]
/// async fn day(date: NaiveDate) -> String {
///     date.format("%A").to_string()
/// }
///
/// #[intent("CALENDAR__COUNT", silent = false)]
/// fn count(dates: Vec<NaiveDate>) -> String {
///     dates.len().to_string()
/// }
/// ```
#[proc_macro_attribute]
pub fn intent(attr: TokenStream, item: TokenStream) -> TokenStream {
    match intent::expand(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
