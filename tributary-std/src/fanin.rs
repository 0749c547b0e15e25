//! Low-latency strategy: one forwarder task per source.
//!
//! ```text
//!  src 1 ──► forwarder ──┐
//!  src 2 ──► forwarder ──┼──► shared channel ──► consumer ──► DispatchCore::dispatch
//!  src N ──► forwarder ──┘
//! ```
//!
//! Every forwarder waits on its source and the shutdown signal together, and
//! never commits to a send without also watching the signal. Closing fires
//! the signal first and only then drops the dispatcher's own sender, so the
//! consumer drains whatever was already forwarded and exits once the last
//! forwarder is gone.

use crate::{
    dispatch::DispatchCore,
    dispatcher::{Dispatcher, Priority},
    shutdown::ShutdownSignal,
    source::EventSource,
};
use futures::StreamExt;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tributary_core::{DispatchError, DynHandler, Event};

// Smallest capacity tokio allows; a forwarder waits for the consumer.
const SHARED_CAPACITY: usize = 1;

/// A [`Dispatcher`] that spawns one forwarding task per source.
pub struct FanInDispatcher<E: Event> {
    core: Arc<DispatchCore<E>>,
    shared: Mutex<Option<mpsc::Sender<E>>>,
    forwarders: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl<E: Event> FanInDispatcher<E> {
    /// Create the dispatcher and spawn its consumer.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(core: Arc<DispatchCore<E>>) -> Self {
        let (tx, rx) = mpsc::channel(SHARED_CAPACITY);
        let task = tokio::spawn(consume(Arc::clone(&core), rx));
        Self {
            core,
            shared: Mutex::new(Some(tx)),
            forwarders: Arc::new(AtomicUsize::new(0)),
            task,
        }
    }

    /// Number of forwarder tasks still running.
    pub fn forwarders(&self) -> usize {
        self.forwarders.load(Ordering::Acquire)
    }

    /// Whether the consumer is still running.
    pub fn is_consuming(&self) -> bool {
        !self.task.is_finished()
    }

    /// The shared dispatch core.
    pub fn core(&self) -> &Arc<DispatchCore<E>> {
        &self.core
    }

    // Shutdown before the shared channel: forwarders must be able to see the
    // signal by the time their sender is the last one left.
    fn shut_down(&self) {
        self.core.close();
        drop(
            self.shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }

    fn sender(&self) -> Option<mpsc::Sender<E>> {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<E: Event> Dispatcher<E> for FanInDispatcher<E> {
    fn register(&self, name: &str, handler: Arc<dyn DynHandler<E>>) -> Result<(), DispatchError> {
        self.core.register(name, handler)
    }

    fn deregister(&self, name: &str) -> bool {
        self.core.deregister(name)
    }

    fn connect(&self, source: EventSource<E>) -> Result<ShutdownSignal, DispatchError> {
        if self.core.is_closed() {
            return Err(DispatchError::Closed);
        }
        let shared = self.sender().ok_or(DispatchError::Closed)?;
        let signal = self.core.signal();
        tracing::debug!(connection = %source.id(), "spawning forwarder");
        let guard = ForwarderGuard::new(Arc::clone(&self.forwarders));
        tokio::spawn(forward(source, shared, signal.clone(), guard));
        Ok(signal)
    }

    fn close(&self) -> Result<(), DispatchError> {
        self.shut_down();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    fn priority(&self) -> Priority {
        Priority::LowLatency
    }
}

impl<E: Event> Drop for FanInDispatcher<E> {
    fn drop(&mut self) {
        self.shut_down();
    }
}

impl<E: Event> std::fmt::Debug for FanInDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanInDispatcher")
            .field("core", &self.core)
            .field("forwarders", &self.forwarders())
            .field("consuming", &self.is_consuming())
            .finish()
    }
}

async fn consume<E: Event>(core: Arc<DispatchCore<E>>, mut shared: mpsc::Receiver<E>) {
    while let Some(event) = shared.recv().await {
        tracing::trace!(event = event.name(), "event received");
        core.dispatch(event).await;
    }
    tracing::debug!("fan-in consumer stopped");
}

async fn forward<E: Event>(
    mut source: EventSource<E>,
    shared: mpsc::Sender<E>,
    signal: ShutdownSignal,
    _guard: ForwarderGuard,
) {
    let id = source.id();
    loop {
        let event = tokio::select! {
            biased;
            _ = signal.wait() => break,
            next = source.next() => match next {
                Some(event) => event,
                None => break,
            },
        };
        tokio::select! {
            biased;
            _ = signal.wait() => break,
            sent = shared.send(event) => if sent.is_err() {
                break;
            },
        }
    }
    tracing::debug!(connection = %id, "forwarder stopped");
}

/// Counts a live forwarder for as long as it exists.
struct ForwarderGuard(Arc<AtomicUsize>);

impl ForwarderGuard {
    fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        Self(count)
    }
}

impl Drop for ForwarderGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
