//! Event sinks for live observation of an [`AccessLogger`](crate::AccessLogger).
//!
//! The logger keeps its own records for later introspection; a sink sees the
//! same events as they happen. Implementations can collect events for tests
//! ([`EventCollector`]) or forward them to the `tracing` crate
//! ([`TracingSink`]).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logger::Timestamp;

/// A single instrumentation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    /// A slot computation started.
    CallStart {
        array: String,
        index: usize,
        time: Timestamp,
        /// Number of running computations, this one included.
        depth: usize,
    },
    /// A slot computation finished (successfully or not).
    CallEnd {
        array: String,
        index: usize,
        time: Timestamp,
    },
    /// A slot read started.
    AccessStart {
        array: String,
        index: usize,
        time: Timestamp,
    },
    /// A slot read completed.
    AccessEnd {
        array: String,
        index: usize,
        time: Timestamp,
    },
}

impl LogEvent {
    /// Logical time at which the event happened.
    pub fn time(&self) -> Timestamp {
        match self {
            LogEvent::CallStart { time, .. }
            | LogEvent::CallEnd { time, .. }
            | LogEvent::AccessStart { time, .. }
            | LogEvent::AccessEnd { time, .. } => *time,
        }
    }
}

/// Trait for receiving instrumentation events.
///
/// # Example
///
/// ```ignore
/// use lifting_flow::{EventSink, LogEvent};
///
/// struct PrintSink;
///
/// impl EventSink for PrintSink {
///     fn emit(&self, event: LogEvent) {
///         println!("{:?}", event);
///     }
/// }
/// ```
pub trait EventSink: Send + Sync + 'static {
    /// Called when an event occurs.
    fn emit(&self, event: LogEvent);
}

/// Sink that discards all events.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LogEvent) {}
}

/// Sink that accumulates events for later assertions.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Mutex<Vec<LogEvent>>,
}

impl EventCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Take collected events, clearing the collector.
    pub fn take(&self) -> Vec<LogEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Get the number of collected events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Check if no events have been collected.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventCollector {
    fn emit(&self, event: LogEvent) {
        self.events.lock().push(event);
    }
}

/// Sink that forwards events to `tracing` at TRACE level.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        match event {
            LogEvent::CallStart {
                array,
                index,
                time,
                depth,
            } => tracing::trace!(%array, index, time = time.0, depth, "compute start"),
            LogEvent::CallEnd { array, index, time } => {
                tracing::trace!(%array, index, time = time.0, "compute end")
            }
            LogEvent::AccessStart { array, index, time } => {
                tracing::trace!(%array, index, time = time.0, "read start")
            }
            LogEvent::AccessEnd { array, index, time } => {
                tracing::trace!(%array, index, time = time.0, "read end")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_end(time: u64) -> LogEvent {
        LogEvent::AccessEnd {
            array: "a".into(),
            index: 0,
            time: Timestamp(time),
        }
    }

    #[test]
    fn test_collector_basic() {
        let collector = EventCollector::new();
        assert!(collector.is_empty());

        collector.emit(access_end(1));
        collector.emit(access_end(2));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.events()[1].time(), Timestamp(2));
    }

    #[test]
    fn test_collector_take() {
        let collector = EventCollector::new();
        collector.emit(access_end(1));

        let events = collector.take();
        assert_eq!(events.len(), 1);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(access_end(3)).unwrap();
        assert_eq!(json["kind"], "access_end");
        assert_eq!(json["time"], 3);
    }

    #[test]
    fn test_sinks_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NullSink>();
        assert_send_sync::<EventCollector>();
        assert_send_sync::<TracingSink>();
    }
}
