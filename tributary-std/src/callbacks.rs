//! Ready-made `tracing` callbacks.
//!
//! Pass these to the dispatcher options to log traffic without writing
//! callbacks by hand:
//!
//! ```rust,ignore
//! let options = DispatcherOptions::new()
//!     .with_on_event(log_event::<MyEvent>)
//!     .with_on_error(log_error);
//! ```

use std::{error::Error, time::SystemTime};
use tributary_core::{DispatchError, Event, Timestamped};

/// Log every received event at `debug`.
pub fn log_event<E: Event>(event: &E) {
    tracing::debug!(event = event.name(), "event received");
}

/// Like [`log_event`], also recording how long ago the event was created.
pub fn log_event_age<E: Timestamped>(event: &E) {
    let age = SystemTime::now()
        .duration_since(event.timestamp())
        .unwrap_or_default();
    tracing::debug!(event = event.name(), ?age, "event received");
}

/// Log a handler failure at `error`, including its source chain.
pub fn log_error(error: DispatchError) {
    let kind = error.kind();
    tracing::error!(
        ?kind,
        error = &error as &(dyn Error + 'static),
        "event handler failed"
    );
}
