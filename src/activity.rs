//! Activity recording.
//!
//! The engine reports user-facing events (rules added, files skipped, scan
//! summaries, deletions) through the [`ActivityRecorder`] trait. Recording is
//! fire-and-forget: implementations swallow their own failures and must not
//! block for long, since they are called from scan worker threads.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;

/// Timestamp format used by [`ActivityLog`] entries.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sink for activity messages.
pub trait ActivityRecorder: Send + Sync {
    /// Record a single message.
    fn record(&self, message: &str);
}

/// Recorder that forwards every message to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRecorder;

impl ActivityRecorder for LogRecorder {
    fn record(&self, message: &str) {
        log::info!(target: crate::logging::ACTIVITY_TARGET, "{}", message);
    }
}

/// In-memory activity log with timestamped entries.
///
/// Optionally tees every message into another recorder, so the CLI can keep
/// an auditable list while still printing through the logger.
#[derive(Default)]
pub struct ActivityLog {
    entries: Mutex<Vec<String>>,
    forward: Option<Arc<dyn ActivityRecorder>>,
}

impl ActivityLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log that also forwards to `recorder`.
    #[must_use]
    pub fn with_forward(recorder: Arc<dyn ActivityRecorder>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            forward: Some(recorder),
        }
    }

    /// Copy of all entries, oldest first, formatted `[timestamp] message`.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any entry's message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.contains(needle))
    }
}

impl std::fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityLog")
            .field("entries", &self.len())
            .field("forward", &self.forward.as_ref().map(|_| "<recorder>"))
            .finish()
    }
}

impl ActivityRecorder for ActivityLog {
    fn record(&self, message: &str) {
        let entry = format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), message);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);

        if let Some(ref forward) = self.forward {
            forward.record(message);
        }
    }
}

impl<R: ActivityRecorder + ?Sized> ActivityRecorder for Arc<R> {
    fn record(&self, message: &str) {
        (**self).record(message);
    }
}
