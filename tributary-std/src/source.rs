//! Event sources.
//!
//! A source is anything a dispatcher can read events from until it ends.
//! [`EventSource`] erases the concrete channel or stream type so both
//! strategies can hold heterogeneous sources side by side.

use futures::stream::{BoxStream, Stream, StreamExt};
use std::{
    fmt,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll},
};
use tributary_core::Event;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a connected source, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A read-only stream of events handed to `connect`.
///
/// The source ends when the underlying channel closes (all senders dropped)
/// or the stream returns `None`.
///
/// # Example
///
/// ```rust
/// use tributary_std::EventSource;
///
/// let (tx, rx) = tokio::sync::mpsc::channel::<String>(8);
/// let source: EventSource<String> = rx.into();
/// # drop((tx, source));
/// ```
pub struct EventSource<E> {
    id: ConnectionId,
    stream: BoxStream<'static, E>,
}

impl<E: Event> EventSource<E> {
    /// Wrap an arbitrary stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = E> + Send + 'static,
    {
        Self {
            id: ConnectionId::next(),
            stream: stream.boxed(),
        }
    }
}

impl<E> EventSource<E> {
    /// Identifier assigned when the source was created.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<E> Stream for EventSource<E> {
    type Item = E;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<E>> {
        self.stream.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}

impl<E> fmt::Debug for EventSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource").field("id", &self.id).finish()
    }
}

impl<E: Event> From<tokio::sync::mpsc::Receiver<E>> for EventSource<E> {
    fn from(mut rx: tokio::sync::mpsc::Receiver<E>) -> Self {
        Self::from_stream(futures::stream::poll_fn(move |cx| rx.poll_recv(cx)))
    }
}

impl<E: Event> From<tokio::sync::mpsc::UnboundedReceiver<E>> for EventSource<E> {
    fn from(mut rx: tokio::sync::mpsc::UnboundedReceiver<E>) -> Self {
        Self::from_stream(futures::stream::poll_fn(move |cx| rx.poll_recv(cx)))
    }
}

impl<E: Event> From<futures::channel::mpsc::Receiver<E>> for EventSource<E> {
    fn from(rx: futures::channel::mpsc::Receiver<E>) -> Self {
        Self::from_stream(rx)
    }
}

impl<E: Event> From<futures::channel::mpsc::UnboundedReceiver<E>> for EventSource<E> {
    fn from(rx: futures::channel::mpsc::UnboundedReceiver<E>) -> Self {
        Self::from_stream(rx)
    }
}
