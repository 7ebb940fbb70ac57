//! Event Sink Adapters

use crate::events::CovenantEvent;
use crate::ports::outbound::EventSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Drops every event. The per-agreement log still records them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, event: &CovenantEvent) {
        trace!("[covenant] Event for agreement {}", event.agreement_id());
    }
}

/// Keeps every published event in order. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<CovenantEvent>>>,
}

impl RecordingEventSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far.
    pub fn events(&self) -> Vec<CovenantEvent> {
        self.events.lock().clone()
    }

    /// Take and clear the buffer.
    pub fn drain(&self) -> Vec<CovenantEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &CovenantEvent) {
        self.events.lock().push(event.clone());
    }
}
