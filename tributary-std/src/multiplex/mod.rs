//! Low-footprint strategy: one task multiplexes every source.
//!
//! ```text
//!  connect(src) ──► attach queue ─┐
//!                                 ▼
//!  src 1 ──┐               ┌─────────────┐
//!  src 2 ──┼──► wait set ─►│ consumption │──► DispatchCore::dispatch
//!  src N ──┘               │    task     │
//!                          └─────────────┘
//! ```
//!
//! The wait set is owned by the consumption task alone. `connect` never
//! touches it: sources travel through an unbounded attach queue that the task
//! waits on alongside the sources and the shutdown signal.

mod wait_set;

use crate::{
    dispatch::DispatchCore,
    dispatcher::{Dispatcher, Priority},
    shutdown::ShutdownSignal,
    source::EventSource,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{sync::mpsc, task::JoinHandle};
use tributary_core::{DispatchError, DynHandler, Event};
use wait_set::{Readiness, WaitSet};

/// What the consumption task does once its last source has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IdlePolicy {
    /// Keep waiting for new sources until the dispatcher is closed.
    #[default]
    Linger,
    /// Stop consuming as soon as the last connected source ends.
    ///
    /// The dispatcher stays open: later `connect` calls still succeed, but
    /// nothing reads the new sources.
    ExitWhenDrained,
}

/// A [`Dispatcher`] that reads every source from a single task.
///
/// Task count stays constant no matter how many sources connect; each wake-up
/// costs a scan over the connected sources.
pub struct MultiplexDispatcher<E: Event> {
    core: Arc<DispatchCore<E>>,
    attach: mpsc::UnboundedSender<EventSource<E>>,
    connections: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl<E: Event> MultiplexDispatcher<E> {
    /// Create the dispatcher and spawn its consumption task.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(core: Arc<DispatchCore<E>>, idle: IdlePolicy) -> Self {
        let (attach, requests) = mpsc::unbounded_channel();
        let connections = Arc::new(AtomicUsize::new(0));
        let consumer = Consumer {
            signal: core.signal(),
            core: Arc::clone(&core),
            requests,
            wait_set: WaitSet::new(),
            connections: Arc::clone(&connections),
            idle,
        };
        let task = tokio::spawn(consumer.run());
        Self {
            core,
            attach,
            connections,
            task,
        }
    }

    /// Number of sources currently in the wait set.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }

    /// Whether the consumption task is still running.
    pub fn is_consuming(&self) -> bool {
        !self.task.is_finished()
    }

    /// The shared dispatch core.
    pub fn core(&self) -> &Arc<DispatchCore<E>> {
        &self.core
    }
}

impl<E: Event> Dispatcher<E> for MultiplexDispatcher<E> {
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
        let id = source.id();
        if self.attach.send(source).is_err() {
            tracing::warn!(connection = %id, "consumption task has exited; source will not be read");
        } else {
            tracing::debug!(connection = %id, "source queued for attach");
        }
        Ok(self.core.signal())
    }

    fn close(&self) -> Result<(), DispatchError> {
        // The consumption task discards the wait set when it sees the signal.
        self.core.close();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    fn priority(&self) -> Priority {
        Priority::LowFootprint
    }
}

impl<E: Event> Drop for MultiplexDispatcher<E> {
    fn drop(&mut self) {
        self.core.close();
    }
}

impl<E: Event> std::fmt::Debug for MultiplexDispatcher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexDispatcher")
            .field("core", &self.core)
            .field("connections", &self.connections())
            .field("consuming", &self.is_consuming())
            .finish()
    }
}

enum Wake<E> {
    Shutdown,
    Attach(EventSource<E>),
    Source(Readiness<E>),
}

struct Consumer<E: Event> {
    core: Arc<DispatchCore<E>>,
    signal: ShutdownSignal,
    requests: mpsc::UnboundedReceiver<EventSource<E>>,
    wait_set: WaitSet<E>,
    connections: Arc<AtomicUsize>,
    idle: IdlePolicy,
}

impl<E: Event> Consumer<E> {
    async fn run(mut self) {
        loop {
            let wake = tokio::select! {
                biased;
                _ = self.signal.wait() => Wake::Shutdown,
                request = self.requests.recv() => match request {
                    Some(source) => Wake::Attach(source),
                    // Every sender is gone: the dispatcher was dropped.
                    None => Wake::Shutdown,
                },
                ready = self.wait_set.ready() => Wake::Source(ready),
            };

            match wake {
                Wake::Shutdown => break,
                Wake::Attach(source) => self.attach(source),
                Wake::Source(Readiness::Event(_, event)) => {
                    tracing::trace!(event = event.name(), "event received");
                    self.core.dispatch(event).await;
                }
                Wake::Source(Readiness::Ended(index)) => {
                    self.detach(index);
                    if self.wait_set.is_empty() && self.idle == IdlePolicy::ExitWhenDrained {
                        // Pick up a connect that raced the last source ending.
                        match self.requests.try_recv() {
                            Ok(source) => self.attach(source),
                            Err(_) => {
                                tracing::debug!("all sources ended; consumption task exiting");
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.wait_set.clear();
        self.connections.store(0, Ordering::Release);
        tracing::debug!("multiplex consumption task stopped");
    }

    fn attach(&mut self, source: EventSource<E>) {
        let id = self.wait_set.push(source);
        self.connections.store(self.wait_set.len(), Ordering::Release);
        tracing::debug!(connection = %id, sources = self.wait_set.len(), "source attached");
    }

    fn detach(&mut self, index: usize) {
        let connection = self.wait_set.remove(index);
        self.connections.store(self.wait_set.len(), Ordering::Release);
        tracing::debug!(
            connection = %connection.id,
            received = connection.received,
            connected_for = ?connection.attached_at.elapsed(),
            sources = self.wait_set.len(),
            "source ended"
        );
    }
}
