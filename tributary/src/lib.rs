//! # tributary - Dynamic Event Dispatcher
//!
//! `tributary` reads events from a changing set of sources and invokes the
//! handler registered under each event's name. Sources can connect at any
//! time and are dropped automatically when they end; all handlers of one
//! dispatcher run from a single task, so they never race each other.
//!
//! ## Quick Start
//!
//! ```rust
//! use tributary::{DispatcherOptions, create, prelude::*};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), DispatchError> {
//! let dispatcher = create::<NamedEvent>(
//!     DispatcherOptions::new().with_on_error(|err| eprintln!("{err}")),
//! );
//! dispatcher.on("ping", |event: &NamedEvent| -> HandlerResult {
//!     println!("{} at {:?}", event.name(), event.timestamp());
//!     Ok(())
//! })?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(16);
//! let shutdown = dispatcher.attach(rx)?;
//! tx.send(NamedEvent::new("ping")).await.unwrap();
//!
//! dispatcher.close()?;
//! assert!(shutdown.is_shutdown());
//! # Ok(())
//! # }
//! ```
//!
//! ## Strategies
//!
//! - [`Priority::LowFootprint`] (default): [`MultiplexDispatcher`], one task
//!   polling every source.
//! - [`Priority::LowLatency`]: [`FanInDispatcher`], one forwarder task per
//!   source feeding a shared channel.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod factory;

pub use factory::{DispatcherOptions, create};

pub use tributary_core::{
    // Errors
    BoxError,
    DispatchError,
    // Handler
    DynHandler,
    ErrorKind,
    // Event
    Event,
    Handler,
    HandlerResult,
    NamedEvent,
    Timestamped,
    WithPayload,
};

pub use tributary_std::{
    // Core
    DispatchCore,
    // Dispatchers
    Dispatcher,
    DispatcherExt,
    ErrorCallback,
    EventCallback,
    FanInDispatcher,
    HandlerTable,
    IdlePolicy,
    MultiplexDispatcher,
    Priority,
    // Sources and shutdown
    ConnectionId,
    EventSource,
    Shutdown,
    ShutdownSignal,
};

/// Ready-made `tracing` callbacks.
pub mod callbacks {
    pub use tributary_std::callbacks::{log_error, log_event, log_event_age};
}

/// Testing utilities.
pub mod testing {
    pub use tributary_std::testing::{
        ErrorCollector, EventLog, FailingHandler, RecordingHandler, eventually,
        eventually_within,
    };
}

/// Prelude module - common imports for tributary.
///
/// # Usage
///
/// ```rust,ignore
/// use tributary::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        DispatchError, Dispatcher, DispatcherExt, ErrorKind, Event, Handler, HandlerResult,
        NamedEvent, Priority, ShutdownSignal, Timestamped, WithPayload,
    };
}

#[cfg(feature = "macros")]
pub use tributary_macros::Event;
