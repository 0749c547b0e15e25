//! One-shot shutdown broadcast.
//!
//! A dispatcher owns exactly one [`Shutdown`]. Every caller of `connect`
//! receives a [`ShutdownSignal`] watching the same cancellation token; they all
//! observe the same transition, which happens at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;

/// The sending half of the shutdown broadcast.
#[derive(Debug)]
pub struct Shutdown {
    fired: AtomicBool,
    token: CancellationToken,
}

impl Shutdown {
    /// Create a broadcast that has not fired yet.
    pub fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
            token: CancellationToken::new(),
        }
    }

    /// Fire the broadcast.
    ///
    /// Returns `true` for the call that actually fired it; every later call is
    /// a no-op returning `false`.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Whether [`fire`](Self::fire) has been called.
    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Subscribe a new signal.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            token: self.token.child_token(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Shutdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The receiving half of the shutdown broadcast.
///
/// Returned by `connect`. It tells the caller the dispatcher has closed; it
/// says nothing about the specific source that was connected. The signal also
/// resolves if the dispatcher is dropped.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Returns `true` once the dispatcher has shut down.
    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the dispatcher shuts down.
    ///
    /// Cancel safe; returns immediately if shutdown already happened.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}
