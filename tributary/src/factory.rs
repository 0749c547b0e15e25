//! Dispatcher construction.
//!
//! [`create`] turns a [`DispatcherOptions`] into a running dispatcher,
//! choosing the strategy from [`Priority`]:
//!
//! | priority                    | strategy                  |
//! |-----------------------------|---------------------------|
//! | `LowFootprint` (default)    | [`MultiplexDispatcher`]   |
//! | `LowLatency`                | [`FanInDispatcher`]       |

use std::sync::Arc;
use tributary_core::{DispatchError, Event};
use tributary_std::{
    DispatchCore, Dispatcher, ErrorCallback, EventCallback, FanInDispatcher, IdlePolicy,
    MultiplexDispatcher, Priority,
};

/// Options for [`create`].
///
/// Unset callbacks default to no-ops, so the dispatcher never checks for
/// their absence.
pub struct DispatcherOptions<E: Event> {
    on_event: Option<EventCallback<E>>,
    on_error: Option<ErrorCallback>,
    priority: Priority,
    idle: IdlePolicy,
}

impl<E: Event> DispatcherOptions<E> {
    /// Options with every default applied.
    pub fn new() -> Self {
        Self {
            on_event: None,
            on_error: None,
            priority: Priority::default(),
            idle: IdlePolicy::default(),
        }
    }

    /// Called with every event before it is routed.
    pub fn with_on_event(mut self, callback: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_event = Some(Arc::new(callback));
        self
    }

    /// Called with every handler failure.
    pub fn with_on_error(
        mut self,
        callback: impl Fn(DispatchError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Choose the strategy.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// What a low-footprint dispatcher does once every source has ended.
    /// Ignored by the low-latency strategy.
    pub fn with_idle_policy(mut self, idle: IdlePolicy) -> Self {
        self.idle = idle;
        self
    }

    /// The configured priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The configured idle policy.
    pub fn idle_policy(&self) -> IdlePolicy {
        self.idle
    }

    fn into_core(self) -> (DispatchCore<E>, Priority, IdlePolicy) {
        let on_event = self.on_event.unwrap_or_else(|| Arc::new(|_: &E| {}));
        let on_error = self
            .on_error
            .unwrap_or_else(|| Arc::new(|_: DispatchError| {}));
        (
            DispatchCore::with_callbacks(on_event, on_error),
            self.priority,
            self.idle,
        )
    }
}

impl<E: Event> Default for DispatcherOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> std::fmt::Debug for DispatcherOptions<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherOptions")
            .field("on_event", &self.on_event.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("priority", &self.priority)
            .field("idle", &self.idle)
            .finish()
    }
}

/// Build a dispatcher from `options`.
///
/// The dispatcher's consumption task starts immediately.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
///
/// # Example
///
/// ```rust
/// use tributary::{DispatcherOptions, Priority, create, prelude::*};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), DispatchError> {
/// let dispatcher = create::<String>(DispatcherOptions::new().with_priority(Priority::LowLatency));
/// dispatcher.on("ping", |_: &String| -> HandlerResult { Ok(()) })?;
///
/// let (tx, rx) = tokio::sync::mpsc::channel(8);
/// let shutdown = dispatcher.attach(rx)?;
/// tx.send("ping".to_string()).await.unwrap();
///
/// dispatcher.close()?;
/// shutdown.wait().await;
/// # Ok(())
/// # }
/// ```
pub fn create<E: Event>(options: DispatcherOptions<E>) -> Box<dyn Dispatcher<E>> {
    let (core, priority, idle) = options.into_core();
    let core = Arc::new(core);
    tracing::debug!(?priority, "creating dispatcher");
    match priority {
        Priority::LowFootprint => Box::new(MultiplexDispatcher::new(core, idle)),
        Priority::LowLatency => Box::new(FanInDispatcher::new(core)),
    }
}
