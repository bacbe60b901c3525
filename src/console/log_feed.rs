//! The log table: a snapshot of recent records, replaced wholesale on every
//! refresh.
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::api::error::Result;
use crate::api::RawLogRecord;
use crate::types::{LogRecord, RecordId};

#[derive(Debug, Default)]
pub struct LogFeed {
    records: Vec<LogRecord>,
    error: Option<String>,
    in_flight: usize,
    settled_once: bool,
}

/// What the log panel should show right now.
#[derive(Debug, PartialEq, Eq)]
pub enum FeedDisplay<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Table(&'a [LogRecord]),
}

impl LogFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True until the first fetch settles, and while any fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0 || !self.settled_once
    }

    pub fn display(&self) -> FeedDisplay<'_> {
        if self.is_loading() {
            FeedDisplay::Loading
        } else if let Some(error) = self.error() {
            FeedDisplay::Error(error)
        } else if self.records.is_empty() {
            FeedDisplay::Empty
        } else {
            FeedDisplay::Table(&self.records)
        }
    }

    pub fn begin_fetch(&mut self) {
        self.in_flight += 1;
        self.error = None;
    }

    /// Applies a settled fetch. Success replaces every record; failure empties
    /// the table so stale rows are never shown next to an error.
    pub fn settle_fetch(&mut self, outcome: Result<Vec<RawLogRecord>>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.settled_once = true;
        match outcome {
            Ok(raw) => {
                self.records = normalize_snapshot(raw);
                self.error = None;
                debug!("Log snapshot replaced ({} records)", self.records.len());
            }
            Err(e) => {
                warn!("Fetching logs failed: {}", e);
                self.records.clear();
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Converts a backend response into display records.
///
/// Records without a usable id get their array position. A backend id seen
/// twice in the same response falls back to the position too, so ids stay
/// unique within the snapshot.
pub fn normalize_snapshot(raw: Vec<RawLogRecord>) -> Vec<LogRecord> {
    let mut seen = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .enumerate()
        .map(|(index, record)| {
            let id = match record.backend_id() {
                Some(id) if seen.insert(id.clone()) => RecordId::Assigned(id),
                Some(id) => {
                    warn!("Duplicate log id {} at position {}", id, index);
                    RecordId::Position(index)
                }
                None => RecordId::Position(index),
            };
            LogRecord {
                id,
                timestamp: record.timestamp,
                level: record.level,
                message: record.message,
            }
        })
        .collect()
}
