//! This module contains the logging infrastructure for the console.
//!
//! Nothing may be printed while the terminal UI owns the screen, so events go
//! to an in-memory buffer (surfaced on the status line) and, optionally, to a
//! log file.
pub mod buffer;
pub mod collector;

pub use buffer::{Diagnostic, DiagnosticsBuffer};
pub use collector::DiagnosticsCollector;
