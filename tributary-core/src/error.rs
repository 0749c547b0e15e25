//! Error types for tributary.
//!
//! Two kinds of failure exist:
//!
//! - **Structural**: the dispatcher was closed. Returned synchronously from
//!   `register` and `connect`.
//! - **Handler**: a registered handler failed. Never returned to a caller;
//!   forwarded to the dispatcher's error callback.
//!
//! Callers frequently wrap these errors in their own context. [`ErrorKind::is_in`]
//! walks the `source()` chain so the kind can still be recovered.

use std::error::Error as StdError;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors produced by a dispatcher.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatcher has been closed. Create a new one.
    #[error("dispatcher closed")]
    Closed,

    /// A handler returned an error while processing an event.
    #[error("handler for `{name}` failed")]
    Handler {
        /// Name of the event being handled.
        name: String,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Wrap a handler failure for the event `name`.
    pub fn handler(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DispatchError::Handler {
            name: name.into(),
            source: source.into(),
        }
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Closed => ErrorKind::Closed,
            DispatchError::Handler { .. } => ErrorKind::Handler,
        }
    }

    /// Returns `true` for [`DispatchError::Closed`].
    pub fn is_closed(&self) -> bool {
        self.kind() == ErrorKind::Closed
    }
}

/// The identity of a [`DispatchError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`DispatchError::Closed`].
    Closed,
    /// See [`DispatchError::Handler`].
    Handler,
}

impl ErrorKind {
    /// Returns `true` if `err`, or any error in its `source()` chain, is a
    /// [`DispatchError`] of this kind.
    ///
    /// ```rust
    /// use tributary_core::{DispatchError, ErrorKind};
    ///
    /// let err = DispatchError::handler("ping", "boom");
    /// assert!(ErrorKind::Handler.is_in(&err));
    /// assert!(!ErrorKind::Closed.is_in(&err));
    /// ```
    pub fn is_in(self, err: &(dyn StdError + 'static)) -> bool {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(dispatch) = e.downcast_ref::<DispatchError>() {
                if dispatch.kind() == self {
                    return true;
                }
            }
            current = e.source();
        }
        false
    }
}
