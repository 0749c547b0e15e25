//! # Handler
//!
//! The callback a dispatcher invokes for an event name.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|event: &MyEvent| -> HandlerResult { ... }`
//! 2. **Struct implementation**: `impl Handler<MyEvent> for MyHandler`, which
//!    may `.await` inside `call`
//!
//! Handlers registered on one dispatcher are never run concurrently with each
//! other: every event passes through a single dispatch point. A slow handler
//! therefore delays every later event of that dispatcher.

use crate::{error::BoxError, event::Event};
use std::{future::Future, pin::Pin};

/// What a handler returns. Errors are forwarded to the dispatcher's error
/// callback and never stop dispatching.
pub type HandlerResult = Result<(), BoxError>;

/// An async callback registered under an event name.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle events of type `{E}`",
    label = "missing `Handler<{E}>` implementation",
    note = "Implement `Handler<{E}>` or pass a closure `Fn(&{E}) -> HandlerResult`."
)]
pub trait Handler<E: Event>: Send + Sync + 'static {
    /// Handle one event.
    fn call(&self, event: &E) -> impl Future<Output = HandlerResult> + Send;
}

/// Object-safe version of [`Handler`].
///
/// Registration tables store `Arc<dyn DynHandler<E>>`.
pub trait DynHandler<E: Event>: Send + Sync + 'static {
    /// Handle one event (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        event: &'a E,
    ) -> Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;
}

impl<E: Event, H: Handler<E>> DynHandler<E> for H {
    fn call_dyn<'a>(
        &'a self,
        event: &'a E,
    ) -> Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>> {
        Box::pin(self.call(event))
    }
}

// Blanket impl for synchronous closures
impl<E, F> Handler<E> for F
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, event: &E) -> impl Future<Output = HandlerResult> + Send {
        std::future::ready((self)(event))
    }
}
