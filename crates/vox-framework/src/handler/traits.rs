//! Handler traits for the Vox framework.
//!
//! Implemented via blanket implementations for functions of different
//! arities. A function qualifies when every parameter implements
//! [`IntentArg`] and its return value implements [`IntoResponse`].
//!
//! The two traits only differ in how the function is run: an
//! [`AsyncIntentFn`] returns a future that is awaited on the caller's task,
//! a [`BlockingIntentFn`] is a plain function that the binder moves onto the
//! blocking worker pool.

use std::future::Future;

use futures::future::BoxFuture;
use vox_core::Response;

use super::response::IntoResponse;
use crate::error::InvokeError;
use crate::extractor::{ArgSpec, BoundArgs, IntentArg};

/// An `async fn` usable as an intent handler.
pub trait AsyncIntentFn<T>: Clone + Send + Sync + 'static {
    /// Binding rules of the parameters, in declaration order.
    fn arg_specs() -> Vec<ArgSpec>;

    fn call(self, args: BoundArgs) -> BoxFuture<'static, Result<Response, InvokeError>>;
}

/// A plain `fn` usable as an intent handler.
pub trait BlockingIntentFn<T>: Clone + Send + Sync + 'static {
    /// Binding rules of the parameters, in declaration order.
    fn arg_specs() -> Vec<ArgSpec>;

    fn call(self, args: BoundArgs) -> Result<Response, InvokeError>;
}

// ============================================================================
// Implementations for functions
// ============================================================================

/// Macro to generate handler implementations for functions with different arities.
macro_rules! impl_intent_fn {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> AsyncIntentFn<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoResponse,
            $( $ty: IntentArg, )*
        {
            fn arg_specs() -> Vec<ArgSpec> {
                vec![$(ArgSpec::of::<$ty>(),)*]
            }

            fn call(self, mut args: BoundArgs) -> BoxFuture<'static, Result<Response, InvokeError>> {
                Box::pin(async move {
                    $(
                        let $ty = args.take::<$ty>()?;
                    )*

                    (self)($($ty,)*).await.into_response()
                })
            }
        }

        #[allow(non_snake_case, unused_mut, unused_variables)]
        impl<F, Res, $($ty,)*> BlockingIntentFn<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Res + Clone + Send + Sync + 'static,
            Res: IntoResponse,
            $( $ty: IntentArg, )*
        {
            fn arg_specs() -> Vec<ArgSpec> {
                vec![$(ArgSpec::of::<$ty>(),)*]
            }

            fn call(self, mut args: BoundArgs) -> Result<Response, InvokeError> {
                $(
                    let $ty = args.take::<$ty>()?;
                )*

                (self)($($ty,)*).into_response()
            }
        }
    };
}

// Generate implementations for 0-16 parameters
impl_intent_fn!();
impl_intent_fn!(T1);
impl_intent_fn!(T1, T2);
impl_intent_fn!(T1, T2, T3);
impl_intent_fn!(T1, T2, T3, T4);
impl_intent_fn!(T1, T2, T3, T4, T5);
impl_intent_fn!(T1, T2, T3, T4, T5, T6);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_intent_fn!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_intent_fn!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_intent_fn!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);
