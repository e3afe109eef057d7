//! Intent registration.
//!
//! An [`Intent`] describes one registration: the intent name, the names of
//! the handler's parameters, the handler itself and how conversion failures
//! are treated. [`IntentRegistry::register`] validates it and resolves every
//! parameter's converter once, so that invocation only runs precomputed
//! bindings.
//!
//! # Manual registration
//!
//! ```rust,ignore
//! async fn weather(location: String, date: Option<NaiveDate>) -> String { ... }
//!
//! let mut registry = IntentRegistry::new();
//! registry.register(
//!     Intent::new("WEATHER__CURRENT")
//!         .params(["location", "date"])
//!         .handler(Handler::asynchronous(weather)),
//! )?;
//! ```
//!
//! # Link-time registration
//!
//! The `#[intent]` attribute macro appends an [`IntentFactory`] to the
//! [`INTENTS`] slice; [`IntentRegistry::collect_registered`] registers every
//! entry.
//!
//! # Tower Service Integration
//!
//! `IntentRegistry` implements `tower::Service<InvokeRequest>`, so timeouts
//! and cancellation can be stacked on top as ordinary layers:
//!
//! ```rust,ignore
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(registry);
//! ```

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use linkme::distributed_slice;
use tower::Service;
use tracing::{debug, info, trace};
use vox_core::{InvokeRequest, Response};

use crate::binder::{BindPolicy, BoundIntent, ParamBinding};
use crate::error::{InvokeError, RegistrationError, RegistrationResult};
use crate::handler::{ErrorHandler, Handler};

/// Builds an intent registration; collected from [`INTENTS`].
pub type IntentFactory = fn() -> Intent;

/// Registrations contributed by `#[intent]`.
#[distributed_slice]
pub static INTENTS: [IntentFactory];

// ============================================================================
// Intent
// ============================================================================

/// An intent registration, validated by [`IntentRegistry::register`].
#[derive(Debug, Clone)]
pub struct Intent {
    name: String,
    params: Vec<String>,
    handler: Option<Handler>,
    error_handler: Option<ErrorHandler>,
    policy: Option<BindPolicy>,
}

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            handler: None,
            error_handler: None,
            policy: None,
        }
    }

    /// Names the handler's parameters, in declaration order.
    ///
    /// Attribute parameters are looked up in the request by these names.
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets the handler called in place of the intent's handler when a
    /// parameter fails to convert.
    ///
    /// Must be of the same [`HandlerKind`](crate::HandlerKind) as the
    /// handler. Ignored in strict mode.
    pub fn error_handler(mut self, error_handler: ErrorHandler) -> Self {
        self.error_handler = Some(error_handler);
        self
    }

    /// Chooses between silent and strict binding.
    ///
    /// Intents that never call this use the registry's default.
    pub fn silent(mut self, silent: bool) -> Self {
        self.policy = Some(BindPolicy::from_silent(silent));
        self
    }

    pub fn strict(self) -> Self {
        self.silent(false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn bind(self, default_policy: BindPolicy) -> RegistrationResult<BoundIntent> {
        if self.name.is_empty() {
            return Err(RegistrationError::EmptyIntentName);
        }
        let Some(handler) = self.handler else {
            return Err(RegistrationError::MissingHandler(self.name));
        };

        let specs = handler.arg_specs();
        if self.params.len() > specs.len() {
            return Err(RegistrationError::UnexpectedParameter {
                intent: self.name,
                given: self.params.len(),
                arity: specs.len(),
            });
        }

        let mut seen = HashSet::new();
        let mut params = Vec::with_capacity(specs.len());
        for (index, spec) in specs.iter().enumerate() {
            let name = match self.params.get(index) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    return Err(RegistrationError::UnnamedParameter {
                        intent: self.name,
                        index,
                    });
                }
            };
            if !seen.insert(name.as_str()) {
                return Err(RegistrationError::DuplicateParameter {
                    intent: self.name.clone(),
                    name: name.clone(),
                });
            }
            params.push(ParamBinding::new(name, spec));
        }

        if let Some(error_handler) = &self.error_handler
            && error_handler.kind() != handler.kind()
        {
            return Err(RegistrationError::ErrorHandlerMismatch {
                intent: self.name,
                handler: handler.kind(),
                error_handler: error_handler.kind(),
            });
        }

        Ok(BoundIntent::new(
            self.name,
            params,
            handler,
            self.error_handler,
            self.policy.unwrap_or(default_policy),
        ))
    }
}

// ============================================================================
// IntentRegistry
// ============================================================================

#[derive(Clone, Default)]
struct RegistryInner {
    intents: HashMap<String, Arc<BoundIntent>>,
    default_policy: BindPolicy,
}

/// Maps intent names to their bound handlers.
///
/// Registration takes `&mut self` and is meant to happen at startup. Cloning
/// is cheap and clones share the registered intents until one of them is
/// modified.
#[derive(Clone, Default)]
pub struct IntentRegistry {
    inner: Arc<RegistryInner>,
}

impl IntentRegistry {
    /// Creates an empty registry binding silently by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy of intents registered without an explicit one.
    pub fn with_default_silent(mut self, silent: bool) -> Self {
        self.inner_mut().default_policy = BindPolicy::from_silent(silent);
        self
    }

    fn inner_mut(&mut self) -> &mut RegistryInner {
        Arc::make_mut(&mut self.inner)
    }

    pub fn default_policy(&self) -> BindPolicy {
        self.inner.default_policy
    }

    /// Validates and registers an intent.
    ///
    /// Registering the same handler again under the same name is a no-op; a
    /// different handler is rejected with
    /// [`RegistrationError::DuplicateIntent`]. See [`HandlerId`] for when two
    /// handlers count as the same.
    ///
    /// [`HandlerId`]: crate::HandlerId
    pub fn register(&mut self, intent: Intent) -> RegistrationResult<()> {
        let bound = intent.bind(self.inner.default_policy)?;

        if let Some(existing) = self.inner.intents.get(bound.name()) {
            if existing.handler().id() == bound.handler().id() {
                trace!(intent = %bound.name(), "Intent already registered");
                return Ok(());
            }
            return Err(RegistrationError::DuplicateIntent(bound.name().to_string()));
        }

        debug!(
            intent = %bound.name(),
            handler = bound.handler().name(),
            kind = %bound.handler().kind(),
            params = bound.params().len(),
            policy = ?bound.policy(),
            "Registered intent"
        );
        self.inner_mut()
            .intents
            .insert(bound.name().to_string(), Arc::new(bound));
        Ok(())
    }

    /// Registers every intent contributed through `#[intent]`.
    ///
    /// Stops at the first invalid registration.
    pub fn collect_registered(&mut self) -> RegistrationResult<()> {
        for factory in INTENTS {
            self.register(factory())?;
        }
        info!(count = INTENTS.len(), "Collected registered intents");
        Ok(())
    }

    /// Removes every registered intent.
    pub fn reset(&mut self) {
        self.inner_mut().intents.clear();
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BoundIntent>> {
        self.inner.intents.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.intents.contains_key(name)
    }

    /// Registered intent names, sorted.
    pub fn intent_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.inner.intents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.intents.is_empty()
    }

    /// Dispatches a request to the intent named by its context.
    pub async fn invoke(&self, request: InvokeRequest) -> Result<Response, InvokeError> {
        let Some(intent) = self.get(request.intent()) else {
            return Err(InvokeError::UnknownIntent(request.intent().to_string()));
        };
        intent.invoke(Arc::new(request)).await
    }
}

impl std::fmt::Debug for IntentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRegistry")
            .field("intents", &self.intent_names())
            .field("default_policy", &self.inner.default_policy)
            .finish()
    }
}

impl Service<InvokeRequest> for IntentRegistry {
    type Response = Response;
    type Error = InvokeError;
    type Future = Pin<Box<dyn Future<Output = Result<Response, InvokeError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: InvokeRequest) -> Self::Future {
        let registry = self.clone();
        Box::pin(async move { registry.invoke(request).await })
    }
}
