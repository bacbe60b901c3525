//! A bounded store of recent diagnostics.
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::Level;

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub module: String,
    pub message: String,
}

impl Diagnostic {
    /// Warnings and errors are worth interrupting the status line for.
    pub fn is_notable(&self) -> bool {
        self.level <= Level::WARN
    }
}

/// Ring buffer of the most recent diagnostics; the oldest entry is evicted
/// once `max_size` is reached.
pub struct DiagnosticsBuffer {
    entries: Mutex<VecDeque<Diagnostic>>,
    max_size: usize,
}

impl DiagnosticsBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size: max_size.max(1),
        }
    }

    pub fn add_entry(&self, entry: Diagnostic) {
        let mut entries = self.lock();
        if entries.len() >= self.max_size {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// The most recent warning or error still held, if any.
    pub fn latest_notable(&self) -> Option<Diagnostic> {
        self.lock().iter().rev().find(|e| e.is_notable()).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Diagnostic>> {
        // A panic while holding the lock cannot leave the deque half-updated.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl DiagnosticsBuffer {
        pub(crate) fn recent(&self, count: usize) -> Vec<Diagnostic> {
            let entries = self.lock();
            let skip = entries.len().saturating_sub(count);
            entries.iter().skip(skip).cloned().collect()
        }
    }

    fn entry(level: Level, message: &str) -> Diagnostic {
        Diagnostic {
            timestamp: Utc::now(),
            level,
            module: "test".into(),
            message: message.into(),
        }
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let buffer = DiagnosticsBuffer::new(2);
        buffer.add_entry(entry(Level::INFO, "a"));
        buffer.add_entry(entry(Level::INFO, "b"));
        buffer.add_entry(entry(Level::INFO, "c"));
        let messages: Vec<_> = buffer.recent(10).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["b", "c"]);
    }

    #[test]
    fn latest_notable_skips_quieter_levels() {
        let buffer = DiagnosticsBuffer::new(10);
        assert!(buffer.latest_notable().is_none());
        buffer.add_entry(entry(Level::ERROR, "first"));
        buffer.add_entry(entry(Level::WARN, "second"));
        buffer.add_entry(entry(Level::DEBUG, "noise"));
        assert_eq!(buffer.latest_notable().unwrap().message, "second");
    }
}
