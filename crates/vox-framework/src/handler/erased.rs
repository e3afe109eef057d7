//! Type-erased handlers.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::trace;
use vox_core::Response;

use super::response::IntoResponse;
use super::traits::{AsyncIntentFn, BlockingIntentFn};
use crate::error::{ConversionError, InvokeError};
use crate::extractor::{ArgSpec, BoundArgs};

type AsyncCall =
    Arc<dyn Fn(BoundArgs) -> BoxFuture<'static, Result<Response, InvokeError>> + Send + Sync>;
type BlockingCall = Arc<dyn Fn(BoundArgs) -> Result<Response, InvokeError> + Send + Sync>;

type AsyncRecover = Arc<
    dyn Fn(String, ConversionError) -> BoxFuture<'static, Result<Response, InvokeError>>
        + Send
        + Sync,
>;
type BlockingRecover =
    Arc<dyn Fn(String, ConversionError) -> Result<Response, InvokeError> + Send + Sync>;

/// Whether a handler is awaited or run on the blocking pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Blocking,
    Async,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blocking => "blocking",
            Self::Async => "async",
        })
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Identity of the function behind a [`Handler`].
///
/// A zero-sized function type (a fn item or a closure without captures) has
/// a single value, so its type is the identity. Fn pointers and capturing
/// closures share types across different functions; they are identified by
/// the handler instance instead, which its clones keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerId {
    Type(TypeId),
    Instance(usize),
}

impl HandlerId {
    fn of<F: 'static, C: ?Sized>(call: &Arc<C>) -> Self {
        if std::mem::size_of::<F>() == 0 {
            Self::Type(TypeId::of::<F>())
        } else {
            Self::Instance(Arc::as_ptr(call).cast::<()>() as usize)
        }
    }
}

#[derive(Clone)]
enum Call {
    Async(AsyncCall),
    Blocking(BlockingCall),
}

/// A type-erased intent handler.
///
/// Remembers the [`HandlerId`] of the function it was built from, so that
/// registering the same function twice can be recognised as a no-op.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    name: &'static str,
    specs: Vec<ArgSpec>,
    call: Call,
}

impl Handler {
    /// Wraps an `async fn`; calls are awaited on the caller's task.
    pub fn asynchronous<F, T>(f: F) -> Self
    where
        F: AsyncIntentFn<T>,
        T: 'static,
    {
        let call: AsyncCall = Arc::new(move |args| f.clone().call(args));
        Self {
            id: HandlerId::of::<F, _>(&call),
            name: type_name::<F>(),
            specs: F::arg_specs(),
            call: Call::Async(call),
        }
    }

    /// Wraps a plain `fn`; calls run on the blocking worker pool.
    pub fn blocking<F, T>(f: F) -> Self
    where
        F: BlockingIntentFn<T>,
        T: 'static,
    {
        let call: BlockingCall = Arc::new(move |args| f.clone().call(args));
        Self {
            id: HandlerId::of::<F, _>(&call),
            name: type_name::<F>(),
            specs: F::arg_specs(),
            call: Call::Blocking(call),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self.call {
            Call::Async(_) => HandlerKind::Async,
            Call::Blocking(_) => HandlerKind::Blocking,
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Type name of the wrapped function, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn arity(&self) -> usize {
        self.specs.len()
    }

    pub fn arg_specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    /// Calls the handler with already bound arguments.
    pub async fn call(&self, args: BoundArgs) -> Result<Response, InvokeError> {
        match &self.call {
            Call::Async(call) => call(args).await,
            Call::Blocking(call) => {
                let call = Arc::clone(call);
                trace!(handler = self.name, "Running handler on the blocking pool");
                run_blocking(move || call(args)).await
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("arity", &self.specs.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ErrorHandler
// ============================================================================

#[derive(Clone)]
enum Recover {
    Async(AsyncRecover),
    Blocking(BlockingRecover),
}

/// A type-erased conversion error handler.
///
/// Receives the name of the first parameter that failed to convert together
/// with the failure, and produces the response in place of the intent's
/// handler.
#[derive(Clone)]
pub struct ErrorHandler {
    name: &'static str,
    recover: Recover,
}

impl ErrorHandler {
    pub fn asynchronous<F, Fut, R>(f: F) -> Self
    where
        F: Fn(String, ConversionError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self {
            name: type_name::<F>(),
            recover: Recover::Async(Arc::new(move |parameter, error| {
                let fut = f(parameter, error);
                Box::pin(async move { fut.await.into_response() })
            })),
        }
    }

    pub fn blocking<F, R>(f: F) -> Self
    where
        F: Fn(String, ConversionError) -> R + Send + Sync + 'static,
        R: IntoResponse,
    {
        Self {
            name: type_name::<F>(),
            recover: Recover::Blocking(Arc::new(move |parameter, error| {
                f(parameter, error).into_response()
            })),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self.recover {
            Recover::Async(_) => HandlerKind::Async,
            Recover::Blocking(_) => HandlerKind::Blocking,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn call(
        &self,
        parameter: String,
        error: ConversionError,
    ) -> Result<Response, InvokeError> {
        match &self.recover {
            Recover::Async(recover) => recover(parameter, error).await,
            Recover::Blocking(recover) => {
                let recover = Arc::clone(recover);
                run_blocking(move || recover(parameter, error)).await
            }
        }
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Runs a blocking call on tokio's blocking pool.
///
/// The call is not stopped if the awaiting task is dropped.
async fn run_blocking<F>(f: F) -> Result<Response, InvokeError>
where
    F: FnOnce() -> Result<Response, InvokeError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(InvokeError::Panicked(panic_message(e.into_panic()))),
        Err(_) => Err(InvokeError::Cancelled),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
