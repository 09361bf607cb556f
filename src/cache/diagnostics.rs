//! Diagnostics side channel
//!
//! Non-fatal failures inside a cache lookup (store down, corrupt entry, failed
//! write) never reach the caller. They are reported here instead, once per
//! failure, as a [`DiagnosticEvent`]. Sinks may log, fan out, or discard
//! events; the orchestrator never reads them back.

use super::errors::CacheError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Which step of a cache operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticAction {
    /// Reading the key from the store
    Read,
    /// Decoding the stored value
    Parse,
    /// Deleting a corrupt entry
    Invalidate,
    /// Encoding a fresh value
    Serialize,
    /// Writing a fresh value to the store
    Write,
}

impl DiagnosticAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Invalidate => "invalidate",
            Self::Serialize => "serialize",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for DiagnosticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal failure observed during a cache operation
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEvent {
    pub action: DiagnosticAction,
    pub cache_key: String,
    /// The stored text, when the failure concerns what was read
    pub raw_value: Option<String>,
    /// The encoded fresh value, when the failure concerns a write
    pub serialized_value: Option<String>,
    pub error: CacheError,
    pub occurred_at: DateTime<Utc>,
}

impl DiagnosticEvent {
    pub fn new(action: DiagnosticAction, cache_key: impl Into<String>, error: CacheError) -> Self {
        Self {
            action,
            cache_key: cache_key.into(),
            raw_value: None,
            serialized_value: None,
            error,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_raw_value(mut self, raw_value: impl Into<String>) -> Self {
        self.raw_value = Some(raw_value.into());
        self
    }

    pub fn with_serialized_value(mut self, serialized_value: impl Into<String>) -> Self {
        self.serialized_value = Some(serialized_value.into());
        self
    }
}

/// Receiver of diagnostic events
///
/// `emit` is called inline on the lookup path and must not block.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, event: DiagnosticEvent);
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<S> {
    fn emit(&self, event: DiagnosticEvent) {
        (**self).emit(event)
    }
}

/// Sink that writes each event as a structured `warn!` record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        warn!(
            action = %event.action,
            cache_key = %event.cache_key,
            raw_value = event.raw_value.as_deref(),
            serialized_value = event.serialized_value.as_deref(),
            error = %event.error,
            "Cache degraded"
        );
    }
}

/// Sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDiagnostics;

impl DiagnosticsSink for NoOpDiagnostics {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Broadcast fan-out of diagnostic events
///
/// Publishing with no subscribers is not an error; events are simply dropped.
/// Slow subscribers lag and lose the oldest events once `capacity` is exceeded.
#[derive(Debug, Clone)]
pub struct DiagnosticsPublisher {
    sender: broadcast::Sender<DiagnosticEvent>,
    log_events: bool,
}

impl DiagnosticsPublisher {
    /// Create a publisher with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            log_events: false,
        }
    }

    /// Also write every event to the tracing log
    pub fn with_logging(mut self) -> Self {
        self.log_events = true;
        self
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for DiagnosticsPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl DiagnosticsSink for DiagnosticsPublisher {
    fn emit(&self, event: DiagnosticEvent) {
        if self.log_events {
            TracingDiagnostics.emit(event.clone());
        }
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }
}
