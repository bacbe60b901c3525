//! This module provides a `tracing` layer that feeds the diagnostics buffer.
use std::fmt;
use std::fs::File;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    EnvFilter, Layer,
};

use super::{Diagnostic, DiagnosticsBuffer};

/// A `tracing` layer that records every event into a [`DiagnosticsBuffer`].
pub struct DiagnosticsCollector {
    buffer: Arc<DiagnosticsBuffer>,
}

impl DiagnosticsCollector {
    pub fn new(buffer: Arc<DiagnosticsBuffer>) -> Self {
        Self { buffer }
    }

    /// Installs the global subscriber: `filter`, this collector, and a plain
    /// text writer to `log_file` when one is given.
    ///
    /// # Errors
    ///
    /// Fails if a global default subscriber is already set.
    pub fn init_subscriber(
        buffer: Arc<DiagnosticsBuffer>,
        filter: EnvFilter,
        log_file: Option<File>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let file_layer = log_file.map(|file| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(DiagnosticsCollector::new(buffer))
            .with(file_layer);

        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}

impl<S> Layer<S> for DiagnosticsCollector
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));

        let module = metadata
            .module_path()
            .map(|path| path.rsplit("::").next().unwrap_or(path))
            .unwrap_or_else(|| metadata.target())
            .to_string();

        self.buffer.add_entry(Diagnostic {
            timestamp: Utc::now(),
            level: *metadata.level(),
            module,
            message,
        });
    }
}

/// Flattens an event's fields into one line, `message` first.
struct MessageVisitor<'a>(&'a mut String);

impl MessageVisitor<'_> {
    fn set_message(&mut self, message: &str) {
        if self.0.is_empty() {
            self.0.push_str(message);
        } else {
            self.0.insert_str(0, &format!("{} ", message));
        }
    }

    fn push_field(&mut self, field: &Field, value: impl fmt::Display) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        self.0.push_str(&format!("{}={}", field.name(), value));
    }
}

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.set_message(&format!("{:?}", value));
        } else {
            self.push_field(field, format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.set_message(value);
        } else {
            self.push_field(field, value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push_field(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push_field(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push_field(field, value);
    }
}
