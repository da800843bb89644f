use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Lifetime counters for one engine instance.
#[derive(Debug, Default)]
pub struct EngineDiagnostics {
    pub sessions_started: AtomicUsize,
    pub transcripts_received: AtomicUsize,
    pub commands_executed: AtomicUsize,
    pub commands_failed: AtomicUsize,
    pub recognizer_errors: AtomicUsize,
    pub persistence_failures: AtomicUsize,
}

impl EngineDiagnostics {
    pub(crate) fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            transcripts_received: self.transcripts_received.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            recognizer_errors: self.recognizer_errors.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub sessions_started: usize,
    pub transcripts_received: usize,
    /// Includes failed commands.
    pub commands_executed: usize,
    pub commands_failed: usize,
    pub recognizer_errors: usize,
    pub persistence_failures: usize,
}
