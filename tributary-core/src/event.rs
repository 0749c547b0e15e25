//! Event contract.
//!
//! An event only needs a name: the dispatcher uses it as the registration key
//! when looking up a handler. Timestamps and payloads are optional
//! capabilities that handlers can require through trait bounds.

use std::{sync::Arc, time::SystemTime};

/// A value that can be routed by name.
///
/// Events must be `Send + Sync + 'static` so they can cross task boundaries.
/// The dispatcher never mutates an event.
///
/// # Example
///
/// ```rust
/// use tributary_core::Event;
///
/// struct Ping;
///
/// impl Event for Ping {
///     fn name(&self) -> &str {
///         "ping"
///     }
/// }
///
/// assert_eq!(Ping.name(), "ping");
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a routable Event",
    label = "missing `Event` implementation",
    note = "Events must provide a `name()` and be `Send + Sync + 'static`."
)]
pub trait Event: Send + Sync + 'static {
    /// The routing name. Handlers are registered under this key.
    fn name(&self) -> &str;
}

/// An event that knows when it was created.
pub trait Timestamped: Event {
    /// Creation time of the event.
    fn timestamp(&self) -> SystemTime;
}

/// An event that carries application-defined data.
pub trait WithPayload: Event {
    /// The payload type.
    type Payload;

    /// Borrow the payload.
    fn payload(&self) -> &Self::Payload;
}

// A bare string is its own name.
impl Event for String {
    fn name(&self) -> &str {
        self
    }
}

impl Event for &'static str {
    fn name(&self) -> &str {
        self
    }
}

impl<E: Event + ?Sized> Event for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<E: Event + ?Sized> Event for Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A general purpose event: a name, a creation time and a payload.
///
/// Useful when events are assembled at runtime (e.g. decoded from a queue)
/// instead of being modelled as dedicated types.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEvent<P = ()> {
    name: String,
    timestamp: SystemTime,
    payload: P,
}

impl NamedEvent<()> {
    /// Create an event without a payload, stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_payload(name, ())
    }
}

impl<P> NamedEvent<P> {
    /// Create an event carrying `payload`, stamped with the current time.
    pub fn with_payload(name: impl Into<String>, payload: P) -> Self {
        Self {
            name: name.into(),
            timestamp: SystemTime::now(),
            payload,
        }
    }

    /// Override the creation time.
    pub fn at(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Consume the event and return its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P: Send + Sync + 'static> Event for NamedEvent<P> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl<P: Send + Sync + 'static> Timestamped for NamedEvent<P> {
    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

impl<P: Send + Sync + 'static> WithPayload for NamedEvent<P> {
    type Payload = P;

    fn payload(&self) -> &P {
        &self.payload
    }
}
