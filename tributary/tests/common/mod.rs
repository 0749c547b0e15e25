#![allow(dead_code)]

use tributary::{
    Dispatcher, DispatcherOptions, NamedEvent, Priority, create,
    testing::{ErrorCollector, EventLog},
};

// ============================================================================
// Test Event Types
// ============================================================================

/// Payload: (source index, sequence number).
pub type TestEvent = NamedEvent<(usize, u32)>;

pub fn event(name: &str, source: usize, seq: u32) -> TestEvent {
    NamedEvent::with_payload(name, (source, seq))
}

pub const PRIORITIES: [Priority; 2] = [Priority::LowFootprint, Priority::LowLatency];

// ============================================================================
// Harness
// ============================================================================

/// A dispatcher wired to an error collector and an event log.
pub struct Harness {
    pub dispatcher: Box<dyn Dispatcher<TestEvent>>,
    pub errors: ErrorCollector,
    pub seen: EventLog,
}

impl Harness {
    pub fn new(priority: Priority) -> Self {
        let errors = ErrorCollector::new();
        let seen = EventLog::new();
        let dispatcher = create(
            DispatcherOptions::new()
                .with_priority(priority)
                .with_on_error(errors.callback())
                .with_on_event(seen.callback::<TestEvent>()),
        );
        Self {
            dispatcher,
            errors,
            seen,
        }
    }
}
