//! # tributary-std
//!
//! Runtime implementations for the tributary event dispatcher.
//!
//! This crate provides:
//! - **Dispatch core**: [`DispatchCore`], the registration table
//!   ([`HandlerTable`]) and the one-shot [`Shutdown`] broadcast
//! - **Sources**: [`EventSource`], adapting tokio and futures channels
//! - **Strategies**: [`MultiplexDispatcher`] (one task, many sources) and
//!   [`FanInDispatcher`] (one forwarder task per source)
//! - **Callbacks**: `tracing` based event and error callbacks
//! - **Testing**: recording handlers and collectors for tests

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use tributary_core;

mod dispatch;
mod dispatcher;
mod fanin;
mod shutdown;
mod source;
mod table;

pub mod callbacks;
pub mod multiplex;
pub mod testing;

pub use dispatch::{DispatchCore, ErrorCallback, EventCallback};
pub use dispatcher::{Dispatcher, DispatcherExt, Priority};
pub use fanin::FanInDispatcher;
pub use multiplex::{IdlePolicy, MultiplexDispatcher};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use source::{ConnectionId, EventSource};
pub use table::HandlerTable;
