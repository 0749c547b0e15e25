//! Dispatch core shared by every strategy.
//!
//! [`DispatchCore`] owns the state a dispatcher needs regardless of how it
//! multiplexes its sources: the closed flag and shutdown broadcast, the
//! registration table and the two callbacks. Strategies hold it as an
//! `Arc` and funnel every received event into [`DispatchCore::dispatch`].

use crate::{
    shutdown::{Shutdown, ShutdownSignal},
    table::HandlerTable,
};
use std::sync::Arc;
use tributary_core::{DispatchError, DynHandler, Event};

/// Called with every event before it is routed.
pub type EventCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Called with every handler failure.
pub type ErrorCallback = Arc<dyn Fn(DispatchError) + Send + Sync>;

/// Shared dispatcher state and the routing step.
pub struct DispatchCore<E: Event> {
    shutdown: Shutdown,
    table: HandlerTable<E>,
    on_event: EventCallback<E>,
    on_error: ErrorCallback,
}

impl<E: Event> DispatchCore<E> {
    /// Create a core with no-op callbacks.
    pub fn new() -> Self {
        Self::with_callbacks(Arc::new(|_: &E| {}), Arc::new(|_: DispatchError| {}))
    }

    /// Create a core with the given callbacks.
    pub fn with_callbacks(on_event: EventCallback<E>, on_error: ErrorCallback) -> Self {
        Self {
            shutdown: Shutdown::new(),
            table: HandlerTable::new(),
            on_event,
            on_error,
        }
    }

    /// Replace the event callback.
    pub fn on_event(mut self, callback: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_event = Arc::new(callback);
        self
    }

    /// Replace the error callback.
    pub fn on_error(mut self, callback: impl Fn(DispatchError) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(callback);
        self
    }

    /// Register `handler` under `name`, replacing any previous one.
    pub fn register(
        &self,
        name: &str,
        handler: Arc<dyn DynHandler<E>>,
    ) -> Result<(), DispatchError> {
        // Fails once `close` has sealed the table.
        if self.table.insert(name, handler)?.is_some() {
            tracing::debug!(event = name, "handler replaced");
        }
        Ok(())
    }

    /// Remove the handler for `name`. Returns whether one existed.
    pub fn deregister(&self, name: &str) -> bool {
        self.table.remove(name)
    }

    /// Close the core: broadcast shutdown and drop every handler.
    ///
    /// Returns `true` for the call that actually closed it.
    pub fn close(&self) -> bool {
        // Seal before broadcasting: anyone who sees the shutdown must also
        // see registration rejected.
        if !self.table.seal() {
            return false;
        }
        self.shutdown.fire();
        tracing::debug!("dispatcher closed");
        true
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.table.is_sealed()
    }

    /// A signal that resolves when the core closes.
    pub fn signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.table.len()
    }

    /// Whether a handler is registered for `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Route one event.
    ///
    /// Events without a matching handler are dropped silently. A handler
    /// error goes to the error callback and never stops the caller's loop.
    pub async fn dispatch(&self, event: E) {
        (self.on_event)(&event);

        let Some(handler) = self.table.get(event.name()) else {
            tracing::trace!(event = event.name(), "no handler registered");
            return;
        };

        if let Err(source) = handler.call_dyn(&event).await {
            (self.on_error)(DispatchError::handler(event.name(), source));
        }
    }
}

impl<E: Event> Default for DispatchCore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for DispatchCore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchCore")
            .field("closed", &self.is_closed())
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
