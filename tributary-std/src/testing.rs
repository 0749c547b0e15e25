//! Testing utilities for tributary.
//!
//! # Features
//!
//! - [`RecordingHandler`]: a handler that records every event it receives
//! - [`FailingHandler`]: a handler that always fails
//! - [`ErrorCollector`]: an error callback that keeps what it was given
//! - [`EventLog`]: an event callback that keeps the names it saw
//! - [`eventually`]: poll a condition until it holds or a timeout passes

use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tributary_core::{DispatchError, ErrorKind, Event, Handler, HandlerResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every event it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<MyEvent>::new();
/// dispatcher.on("ping", recorder.clone())?;
///
/// // ... send events ...
///
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingHandler<E> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone> RecordingHandler<E> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A copy of the recorded events, in arrival order.
    pub fn events(&self) -> Vec<E> {
        lock(&self.events).clone()
    }

    /// Number of recorded events.
    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl<E: Clone> Default for RecordingHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingHandler<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

impl<E: Event + Clone> Handler<E> for RecordingHandler<E> {
    async fn call(&self, event: &E) -> HandlerResult {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

// ============================================================================
// Failing Handler
// ============================================================================

/// A handler that fails every call with a fixed message.
#[derive(Clone)]
pub struct FailingHandler {
    message: String,
    calls: Arc<AtomicUsize>,
}

impl FailingHandler {
    /// Create a handler failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: Event> Handler<E> for FailingHandler {
    async fn call(&self, _event: &E) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.message.clone().into())
    }
}

// ============================================================================
// Error Collector
// ============================================================================

/// Collects the errors passed to a dispatcher's error callback.
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<DispatchError>>>,
}

impl ErrorCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback feeding this collector.
    pub fn callback(&self) -> impl Fn(DispatchError) + Send + Sync + use<> {
        let errors = Arc::clone(&self.errors);
        move |error| lock(&errors).push(error)
    }

    /// Number of collected errors.
    pub fn count(&self) -> usize {
        lock(&self.errors).len()
    }

    /// Kinds of the collected errors, in arrival order.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        lock(&self.errors).iter().map(DispatchError::kind).collect()
    }

    /// Each collected error rendered with its source chain, joined by `": "`.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.errors)
            .iter()
            .map(|error| {
                let mut message = error.to_string();
                let mut source = std::error::Error::source(error);
                while let Some(cause) = source {
                    message.push_str(": ");
                    message.push_str(&cause.to_string());
                    source = cause.source();
                }
                message
            })
            .collect()
    }

    /// Remove and return every collected error.
    pub fn take(&self) -> Vec<DispatchError> {
        std::mem::take(&mut *lock(&self.errors))
    }
}

// ============================================================================
// Event Log
// ============================================================================

/// Records the names of events passed to a dispatcher's event callback.
#[derive(Clone, Default)]
pub struct EventLog {
    names: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback feeding this log.
    pub fn callback<E: Event>(&self) -> impl Fn(&E) + Send + Sync + use<E> {
        let names = Arc::clone(&self.names);
        move |event: &E| lock(&names).push(event.name().to_owned())
    }

    /// Names seen so far, in arrival order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.names).clone()
    }

    /// Number of events seen.
    pub fn count(&self) -> usize {
        lock(&self.names).len()
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Poll `condition` every few milliseconds for up to two seconds.
///
/// Returns whether the condition became true.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    eventually_within(Duration::from_secs(2), condition).await
}

/// Poll `condition` every few milliseconds for up to `timeout`.
pub async fn eventually_within(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
