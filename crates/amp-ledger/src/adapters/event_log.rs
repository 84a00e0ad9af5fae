//! # Event Log
//!
//! `EventSink` adapter that keeps every published event in memory and
//! mirrors it to the structured log.

use crate::events::AmpEvent;
use crate::ports::outbound::EventSink;
use amp_telemetry::log_event;
use std::sync::Mutex;

/// In-memory event sink.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: Mutex<Vec<AmpEvent>>,
}

impl InMemoryEventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Published events in order.
    pub fn events(&self) -> Vec<AmpEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of published events.
    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    /// Returns true if nothing was published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Published events with the given topic.
    pub fn with_name(&self, name: &str) -> Vec<AmpEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.name() == name)
            .collect()
    }

    /// Drop all events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for InMemoryEventLog {
    fn publish(&self, events: &[AmpEvent]) {
        for event in events {
            log_event!(debug, "events", "Event published", topic = event.name());
        }
        match self.events.lock() {
            Ok(mut log) => log.extend_from_slice(events),
            Err(_) => {
                log_event!(error, "events", "Event log lock poisoned", dropped = events.len());
            }
        }
    }
}
