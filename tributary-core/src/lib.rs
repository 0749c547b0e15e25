//! # tributary-core
//!
//! Core contracts for the tributary event dispatcher.
//!
//! This crate has a single dependency and is meant to be imported by code that
//! produces events or implements handlers without pulling in a runtime.
//!
//! # Contracts
//!
//! - [`Event`]: anything with a routing name. [`Timestamped`] and
//!   [`WithPayload`] are optional capabilities for richer consumers.
//! - [`Handler`]: the async callback invoked for an event name. Plain closures
//!   `Fn(&E) -> HandlerResult` qualify. [`DynHandler`] is the object-safe
//!   form stored in registration tables.
//!
//! # Error Types
//!
//! - [`DispatchError`] - structural (`Closed`) and runtime (`Handler`) failures
//! - [`ErrorKind`] - identity checks that survive wrapping

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod handler;

pub use error::{BoxError, DispatchError, ErrorKind};
pub use event::{Event, NamedEvent, Timestamped, WithPayload};
pub use handler::{DynHandler, Handler, HandlerResult};
