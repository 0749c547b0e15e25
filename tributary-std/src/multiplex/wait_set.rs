//! The dynamic wait set read by the multiplexed consumption task.

use crate::source::{ConnectionId, EventSource};
use futures::StreamExt;
use std::{
    future::{Future, poll_fn},
    task::{Context, Poll},
    time::Instant,
};
use tributary_core::Event;

/// Bookkeeping for one connected source.
#[derive(Debug, Clone)]
pub(crate) struct Connection {
    pub(crate) id: ConnectionId,
    pub(crate) attached_at: Instant,
    pub(crate) received: u64,
}

/// What the wait set woke up with.
#[derive(Debug)]
pub(crate) enum Readiness<E> {
    /// The source at this index produced an event.
    Event(usize, E),
    /// The source at this index ended.
    Ended(usize),
}

/// Connected sources and their metadata, kept index-aligned.
///
/// `connections[i]` always describes `sources[i]`; both vectors are only ever
/// mutated together. Polling starts at a rotating cursor so a source that is
/// always ready cannot starve the ones after it.
pub(crate) struct WaitSet<E> {
    connections: Vec<Connection>,
    sources: Vec<EventSource<E>>,
    cursor: usize,
}

impl<E: Event> WaitSet<E> {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            sources: Vec::new(),
            cursor: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sources.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub(crate) fn push(&mut self, source: EventSource<E>) -> ConnectionId {
        let id = source.id();
        self.connections.push(Connection {
            id,
            attached_at: Instant::now(),
            received: 0,
        });
        self.sources.push(source);
        id
    }

    /// Remove the entry at `index`, preserving the order of the rest.
    pub(crate) fn remove(&mut self, index: usize) -> Connection {
        drop(self.sources.remove(index));
        let connection = self.connections.remove(index);
        if self.cursor > index {
            self.cursor -= 1;
        }
        if self.cursor >= self.sources.len() {
            self.cursor = 0;
        }
        connection
    }

    pub(crate) fn clear(&mut self) {
        self.sources.clear();
        self.connections.clear();
        self.cursor = 0;
    }

    /// Wait until any source is ready. Never resolves on an empty set.
    pub(crate) fn ready(&mut self) -> impl Future<Output = Readiness<E>> + '_ {
        poll_fn(move |cx| self.poll_ready(cx))
    }

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Readiness<E>> {
        let len = self.sources.len();
        for offset in 0..len {
            let index = (self.cursor + offset) % len;
            match self.sources[index].poll_next_unpin(cx) {
                Poll::Ready(Some(event)) => {
                    self.connections[index].received += 1;
                    self.cursor = (index + 1) % len;
                    return Poll::Ready(Readiness::Event(index, event));
                }
                Poll::Ready(None) => return Poll::Ready(Readiness::Ended(index)),
                Poll::Pending => {}
            }
        }
        Poll::Pending
    }

    #[cfg(test)]
    fn ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|c| c.id).collect()
    }
}
