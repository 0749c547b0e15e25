//! The dispatcher interface shared by both strategies.

use crate::{shutdown::ShutdownSignal, source::EventSource};
use std::sync::Arc;
use tributary_core::{DispatchError, DynHandler, Event, Handler};

/// Which resource a dispatcher should economise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    /// One task reads every source. Memory and task count stay flat as
    /// sources come and go; each wake-up scans the connected sources.
    #[default]
    LowFootprint,
    /// One forwarder task per source feeding a shared channel. Costs a task
    /// per source, avoids the scan.
    LowLatency,
}

/// Reads events from any number of sources and invokes the handler registered
/// under each event's name.
///
/// Implementations run every handler from a single task, so handlers of one
/// dispatcher never run concurrently. Dropping a dispatcher closes it.
pub trait Dispatcher<E: Event>: Send + Sync {
    /// Register `handler` under `name`, replacing any previous handler.
    ///
    /// Fails with [`DispatchError::Closed`] once the dispatcher is closed.
    fn register(&self, name: &str, handler: Arc<dyn DynHandler<E>>) -> Result<(), DispatchError>;

    /// Remove the handler for `name`. Returns whether one existed.
    fn deregister(&self, name: &str) -> bool;

    /// Start reading events from `source`.
    ///
    /// The returned signal resolves when the dispatcher closes; every caller
    /// gets the same signal. Fails with [`DispatchError::Closed`] once the
    /// dispatcher is closed.
    fn connect(&self, source: EventSource<E>) -> Result<ShutdownSignal, DispatchError>;

    /// Close the dispatcher. Idempotent.
    ///
    /// Events already pulled from a source may still be handled after this
    /// returns; nothing further is read.
    fn close(&self) -> Result<(), DispatchError>;

    /// Whether [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;

    /// The strategy backing this dispatcher.
    fn priority(&self) -> Priority;
}

/// Generic conveniences over [`Dispatcher`].
pub trait DispatcherExt<E: Event>: Dispatcher<E> {
    /// Register any [`Handler`] (including a closure) under `name`.
    fn on<H: Handler<E>>(&self, name: &str, handler: H) -> Result<(), DispatchError> {
        self.register(name, Arc::new(handler))
    }

    /// Connect anything convertible into an [`EventSource`].
    fn attach(&self, source: impl Into<EventSource<E>>) -> Result<ShutdownSignal, DispatchError> {
        self.connect(source.into())
    }
}

impl<E: Event, D: Dispatcher<E> + ?Sized> DispatcherExt<E> for D {}
