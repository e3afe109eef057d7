//! Argument binding.
//!
//! A [`BoundIntent`] is an intent whose parameters have been resolved against
//! its handler at registration. Every invocation then runs the same steps:
//!
//! 1. **Extract** each parameter's raw data from the request, by name for
//!    attributes and by type for the contextual objects.
//! 2. **Convert** it with the precomputed converter. Absent data is never
//!    converted, and failures are kept as values.
//! 3. **Validate**: the first failure, in declaration order, decides the
//!    outcome according to the intent's [`BindPolicy`] and error handler.
//! 4. **Invoke** the handler, or the error handler in its place.

use std::sync::Arc;

use tracing::{Instrument, Level, debug, span, trace};
use vox_core::{InvokeRequest, Response};

use crate::converter::Converter;
use crate::error::{ConversionError, InvokeError};
use crate::extractor::{ArgSource, ArgSpec, BoundArgs};
use crate::handler::{ErrorHandler, Handler};
use crate::value::{BoundArg, RawArg, SlotValue};

/// What happens when a parameter fails to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindPolicy {
    /// The failure is delivered as a value, to the error handler if there is
    /// one and to the handler otherwise.
    #[default]
    Silent,
    /// The failure aborts the call with [`InvokeError::Conversion`].
    Strict,
}

impl BindPolicy {
    pub fn from_silent(silent: bool) -> Self {
        if silent { Self::Silent } else { Self::Strict }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }
}

/// A handler parameter with its resolved converter.
#[derive(Clone)]
pub struct ParamBinding {
    name: Arc<str>,
    source: ArgSource,
    converter: Converter,
    converter_name: String,
}

impl ParamBinding {
    pub(crate) fn new(name: &str, spec: &ArgSpec) -> Self {
        Self {
            name: Arc::from(name),
            source: spec.source,
            converter: spec.converter.resolve(),
            converter_name: spec.converter.name(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> ArgSource {
        self.source
    }

    pub fn converter_name(&self) -> &str {
        &self.converter_name
    }

    fn extract(&self, request: &Arc<InvokeRequest>) -> Option<RawArg> {
        let context = &request.context;
        match self.source {
            ArgSource::Request => Some(RawArg::Request(Arc::clone(request))),
            ArgSource::Context => Some(RawArg::Context(Arc::clone(context))),
            ArgSource::Session => Some(RawArg::Session(Arc::clone(&request.session))),
            ArgSource::Attributes => context
                .attribute(&self.name)
                .filter(|values| !values.is_empty())
                .map(|values| RawArg::strings(values.iter().cloned())),
            ArgSource::AttributesV2 => context
                .attribute_v2(&self.name)
                .filter(|entries| !entries.is_empty())
                .map(|entries| RawArg::Attributes(entries.to_vec())),
        }
    }

    fn bind(&self, request: &Arc<InvokeRequest>) -> BoundArg {
        let Some(raw) = self.extract(request) else {
            trace!(parameter = %self.name, "No value in request");
            return BoundArg::Absent;
        };

        match (self.converter)(&raw) {
            Ok(value) => BoundArg::Value(value),
            Err(error) => {
                debug!(
                    parameter = %self.name,
                    converter = %self.converter_name,
                    error = %error,
                    "Conversion failed"
                );
                BoundArg::Failed(error)
            }
        }
    }
}

/// The outcome of binding a request.
#[derive(Debug)]
enum Binding {
    Call(BoundArgs),
    Recover {
        parameter: String,
        error: ConversionError,
    },
}

// ============================================================================
// BoundIntent
// ============================================================================

/// A registered intent, ready to be invoked.
#[derive(Clone)]
pub struct BoundIntent {
    name: String,
    params: Vec<ParamBinding>,
    handler: Handler,
    error_handler: Option<ErrorHandler>,
    policy: BindPolicy,
}

impl BoundIntent {
    pub(crate) fn new(
        name: String,
        params: Vec<ParamBinding>,
        handler: Handler,
        error_handler: Option<ErrorHandler>,
        policy: BindPolicy,
    ) -> Self {
        Self {
            name,
            params,
            handler,
            error_handler,
            policy,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamBinding] {
        &self.params
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn error_handler(&self) -> Option<&ErrorHandler> {
        self.error_handler.as_ref()
    }

    pub fn policy(&self) -> BindPolicy {
        self.policy
    }

    /// Binds `request` and calls the handler.
    pub async fn invoke(&self, request: Arc<InvokeRequest>) -> Result<Response, InvokeError> {
        let span = span!(Level::DEBUG, "invoke", intent = %self.name);
        async move {
            match self.bind(&request)? {
                Binding::Call(args) => {
                    trace!("Calling handler");
                    self.handler.call(args).await
                }
                Binding::Recover { parameter, error } => match &self.error_handler {
                    Some(error_handler) => {
                        debug!(parameter = %parameter, "Routing to error handler");
                        error_handler.call(parameter, error).await
                    }
                    None => Err(InvokeError::Conversion { parameter, error }),
                },
            }
        }
        .instrument(span)
        .await
    }

    /// Calls the handler with already converted values, skipping extraction
    /// and conversion.
    ///
    /// Values are matched to parameters by position.
    pub async fn call_direct(&self, values: Vec<SlotValue>) -> Result<Response, InvokeError> {
        if values.len() != self.params.len() {
            return Err(InvokeError::ArgumentCount {
                expected: self.params.len(),
                given: values.len(),
            });
        }

        let args = self
            .params
            .iter()
            .zip(values)
            .map(|(param, value)| (Arc::clone(&param.name), BoundArg::Value(value)))
            .collect();
        self.handler.call(BoundArgs::new(args)).await
    }

    fn bind(&self, request: &Arc<InvokeRequest>) -> Result<Binding, InvokeError> {
        let bound: Vec<_> = self
            .params
            .iter()
            .map(|param| (Arc::clone(&param.name), param.bind(request)))
            .collect();

        let failure = bound.iter().find_map(|(name, arg)| match arg {
            BoundArg::Failed(error) => Some((name.to_string(), error.clone())),
            _ => None,
        });

        match failure {
            None => Ok(Binding::Call(BoundArgs::new(bound))),
            Some((parameter, error)) => match self.policy {
                BindPolicy::Strict => Err(InvokeError::Conversion { parameter, error }),
                BindPolicy::Silent if self.error_handler.is_some() => {
                    Ok(Binding::Recover { parameter, error })
                }
                BindPolicy::Silent => Ok(Binding::Call(BoundArgs::new(bound))),
            },
        }
    }
}

impl std::fmt::Debug for BoundIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<_> = self
            .params
            .iter()
            .map(|param| (param.name(), param.converter_name()))
            .collect();
        f.debug_struct("BoundIntent")
            .field("name", &self.name)
            .field("params", &params)
            .field("handler", &self.handler)
            .field("error_handler", &self.error_handler)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vox_core::Context;

    fn intent(names: &[&str], handler: Handler, policy: BindPolicy) -> BoundIntent {
        let params = names
            .iter()
            .zip(handler.arg_specs())
            .map(|(name, spec)| ParamBinding::new(name, spec))
            .collect();
        BoundIntent::new("TEST".to_string(), params, handler, None, policy)
    }

    fn request(context: Context) -> Arc<InvokeRequest> {
        Arc::new(InvokeRequest::new(context, Default::default()))
    }

    async fn describe(date: Option<NaiveDate>, days: Vec<NaiveDate>) -> String {
        format!("{date:?} {}", days.len())
    }

    #[tokio::test]
    async fn test_absent_and_empty_attributes() {
        let intent = intent(
            &["date", "days"],
            Handler::asynchronous(describe),
            BindPolicy::Silent,
        );

        let context = Context::new("TEST").with_attribute("days", Vec::<String>::new());
        let response = intent.invoke(request(context)).await.unwrap();
        assert_eq!(response.text, "None 0");

        let response = intent.invoke(request(Context::new("TEST"))).await.unwrap();
        assert_eq!(response.text, "None 0");
    }

    #[tokio::test]
    async fn test_absent_typed_attribute_list() {
        async fn count(cities: Vec<vox_core::AttributeV2<String>>) -> String {
            cities.len().to_string()
        }

        let intent = intent(&["cities"], Handler::asynchronous(count), BindPolicy::Strict);
        let response = intent.invoke(request(Context::new("TEST"))).await.unwrap();
        assert_eq!(response.text, "0");

        let context = Context::new("TEST").with_attribute_v2("cities", Vec::new());
        let response = intent.invoke(request(context)).await.unwrap();
        assert_eq!(response.text, "0");
    }

    #[test]
    fn test_first_failure_wins() {
        async fn two(
            a: Result<NaiveDate, ConversionError>,
            b: Result<NaiveDate, ConversionError>,
        ) -> String {
            format!("{} {}", a.is_err(), b.is_err())
        }

        let mut bound = intent(&["a", "b"], Handler::asynchronous(two), BindPolicy::Silent);
        bound.error_handler = Some(ErrorHandler::blocking(|_, _| "recovered"));

        let context = Context::new("TEST")
            .with_attribute("a", ["bad"])
            .with_attribute("b", ["worse"]);
        let Ok(Binding::Recover { parameter, error }) = bound.bind(&request(context)) else {
            panic!("expected the error handler to be selected");
        };
        assert_eq!(parameter, "a");
        assert_eq!(error.raw(), &serde_json::json!("bad"));
    }

    #[tokio::test]
    async fn test_call_direct_checks_count() {
        let intent = intent(
            &["date", "days"],
            Handler::asynchronous(describe),
            BindPolicy::Silent,
        );
        let error = intent
            .call_direct(vec![SlotValue::Date(NaiveDate::MIN)])
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            InvokeError::ArgumentCount {
                expected: 2,
                given: 1
            }
        ));
    }
}
