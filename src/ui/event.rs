use crossterm::event::KeyEvent;

use crate::api::error::Result;
use crate::api::{AnalysisResult, ChatReply, RawLogRecord, UploadReply};

/// Everything the UI task reacts to.
///
/// Request outcomes carry the generation of the view that issued them, so a
/// result that arrives after its view was unmounted can be dropped.
#[derive(Debug)]
pub enum UIEvent {
    KeyPress(KeyEvent),
    Resize(u16, u16),
    /// Periodic redraw, so the status line picks up new diagnostics.
    Tick,
    LogFetchStarted {
        generation: u64,
    },
    LogFetchSettled {
        generation: u64,
        outcome: Result<Vec<RawLogRecord>>,
    },
    ChatSettled {
        generation: u64,
        outcome: Result<ChatReply>,
    },
    AnalysisSettled {
        generation: u64,
        outcome: Result<AnalysisResult>,
    },
    UploadSettled {
        generation: u64,
        outcome: Result<UploadReply>,
    },
    /// One line per visualization of analysis run `run`.
    VisualizationsExported {
        generation: u64,
        run: u64,
        lines: Vec<String>,
    },
}
