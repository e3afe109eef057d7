//! Error types for the Vox framework.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tower::BoxError;

use crate::handler::HandlerKind;

// ============================================================================
// ConversionError
// ============================================================================

/// A slot value that could not be converted to its parameter's type.
///
/// Carries the underlying error, the raw value that was rejected and the
/// name of the converter that rejected it. In silent mode this is handed to
/// the handler as a value (see [`IntentArg`](crate::IntentArg) for
/// `Result<T, ConversionError>` parameters) or to the intent's error handler.
#[derive(Debug, Clone, Error)]
#[error("converter '{converter}' rejected {raw}: {source}")]
pub struct ConversionError {
    converter: Cow<'static, str>,
    raw: Value,
    source: Arc<dyn StdError + Send + Sync>,
}

impl ConversionError {
    pub fn new(
        converter: impl Into<Cow<'static, str>>,
        raw: Value,
        error: impl Into<BoxError>,
    ) -> Self {
        let error: BoxError = error.into();
        Self {
            converter: converter.into(),
            raw,
            source: Arc::from(error),
        }
    }

    /// Name of the converter that failed (e.g. `"to_date"`).
    pub fn converter(&self) -> &str {
        &self.converter
    }

    /// The raw value that was rejected.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The underlying error.
    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.source
    }

    /// Downcasts the underlying error to a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

/// Raised when a converter is handed no value at all.
#[derive(Debug, Clone, Copy, Error)]
#[error("no value to convert")]
pub struct EmptySlot;

// ============================================================================
// RegistrationError
// ============================================================================

/// Configuration errors detected when an intent is registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("intent name must not be empty")]
    EmptyIntentName,

    #[error("intent '{0}' has no handler")]
    MissingHandler(String),

    /// The handler takes more parameters than names were supplied, or a
    /// supplied name is empty.
    #[error("intent '{intent}': parameter #{index} has no name")]
    UnnamedParameter { intent: String, index: usize },

    /// More names were supplied than the handler takes parameters.
    #[error("intent '{intent}': {given} parameter names for a handler taking {arity}")]
    UnexpectedParameter {
        intent: String,
        given: usize,
        arity: usize,
    },

    #[error("intent '{intent}': parameter '{name}' is declared twice")]
    DuplicateParameter { intent: String, name: String },

    #[error("intent '{0}' is already registered with a different handler")]
    DuplicateIntent(String),

    #[error("intent '{intent}': {handler} handler cannot use a {error_handler} error handler")]
    ErrorHandlerMismatch {
        intent: String,
        handler: HandlerKind,
        error_handler: HandlerKind,
    },
}

// ============================================================================
// InvokeError
// ============================================================================

/// Errors raised while invoking an intent.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("no handler registered for intent '{0}'")]
    UnknownIntent(String),

    /// A parameter could not be converted and the failure could not be
    /// delivered to the handler (strict mode, or a parameter type that does
    /// not accept failures).
    #[error("parameter '{parameter}': {error}")]
    Conversion {
        parameter: String,
        #[source]
        error: ConversionError,
    },

    /// A required parameter had no value in the request.
    #[error("missing argument '{parameter}'")]
    MissingArgument { parameter: String },

    /// A bound value does not fit the parameter's declared type.
    #[error("argument '{parameter}' is not a {expected}")]
    Argument {
        parameter: String,
        expected: &'static str,
    },

    #[error("handler takes {expected} arguments, {given} given")]
    ArgumentCount { expected: usize, given: usize },

    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// A blocking handler panicked on the worker pool.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A blocking handler was cancelled before it finished.
    #[error("handler was cancelled")]
    Cancelled,
}

impl InvokeError {
    /// Returns the conversion failure if this error was caused by one.
    pub fn as_conversion(&self) -> Option<&ConversionError> {
        match self {
            Self::Conversion { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns the handler's own error if this error came from the handler.
    pub fn as_handler_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match self {
            Self::Handler(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Result type for invocation.
pub type InvokeResult<T> = Result<T, InvokeError>;
