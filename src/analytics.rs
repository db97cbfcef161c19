//! Analytics recording and session correlation
//!
//! Analytics are fire-and-forget: the tokenization layer records event names and never
//! observes a result. Whether anything is recorded at all is decided by the merchant's
//! [`Configuration`](crate::types::Configuration).

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Receiver of named analytics events
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &str);
}

/// Sink that emits each event as a `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalyticsSink;

impl AnalyticsSink for TracingAnalyticsSink {
    fn record(&self, event: &str) {
        tracing::info!(target: "braintree::analytics", event, "analytics event");
    }
}

/// An event held by [`MemoryAnalyticsSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

/// Sink that keeps events in memory, for batching uploads or inspecting in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryAnalyticsSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the recorded events, oldest first
    pub fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Remove and return every recorded event
    pub fn drain(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl AnalyticsSink for MemoryAnalyticsSink {
    fn record(&self, event: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                name: event.to_string(),
                timestamp: Utc::now(),
            });
    }
}

/// A sink gated by the configuration's analytics flag
#[derive(Clone)]
pub struct Analytics {
    sink: Arc<dyn AnalyticsSink>,
    enabled: bool,
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics")
            .field("enabled", &self.enabled)
            .field("sink", &"<sink>")
            .finish()
    }
}

impl Analytics {
    pub fn new(sink: Arc<dyn AnalyticsSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    /// Analytics that record nothing
    pub fn disabled() -> Self {
        Self::new(Arc::new(TracingAnalyticsSink), false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record `event` if analytics are enabled
    pub fn record(&self, event: &str) {
        if self.enabled {
            self.sink.record(event);
        } else {
            tracing::trace!("Analytics disabled, not recording {}", event);
        }
    }
}

/// Source of the per-session correlation id sent in every request's `_meta`
pub trait SessionIdProvider: Send + Sync {
    /// Must return the same id for the lifetime of the session
    fn session_id(&self) -> String;
}

/// Random session id generated once at construction
#[derive(Debug, Clone)]
pub struct UuidSessionId {
    id: String,
}

impl UuidSessionId {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
        }
    }
}

impl Default for UuidSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdProvider for UuidSessionId {
    fn session_id(&self) -> String {
        self.id.clone()
    }
}
