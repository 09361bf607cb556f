//! Recording diagnostics sink and counting retrieval helpers

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use request_cache::cache::{DiagnosticAction, DiagnosticEvent, DiagnosticsSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Keeps every emitted event for later assertions
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn actions(&self) -> Vec<DiagnosticAction> {
        self.events.lock().iter().map(|e| e.action).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

/// Counts how many times retrieval actually ran
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// A retrieval function that bumps the counter and returns `value`
    pub fn returning<T>(
        &self,
        value: T,
    ) -> impl FnOnce(()) -> BoxFuture<'static, Result<T, String>>
    where
        T: Send + 'static,
    {
        let counter = Arc::clone(&self.0);
        move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<T, String>(value) }.boxed()
        }
    }

    /// A retrieval function that bumps the counter and fails with `message`
    pub fn failing<T>(
        &self,
        message: &str,
    ) -> impl FnOnce(()) -> BoxFuture<'static, Result<T, String>>
    where
        T: Send + 'static,
    {
        let counter = Arc::clone(&self.0);
        let message = message.to_string();
        move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err::<T, String>(message) }.boxed()
        }
    }
}
