//! This module defines the requests the UI hands off to background tasks.
use std::path::PathBuf;

use crate::console::analysis::Visualization;
use crate::types::StagedFile;

#[derive(Debug, Clone, PartialEq)]
pub enum UIAction {
    /// Sends a chat query on behalf of the view mounted as `generation`.
    SendChat { generation: u64, query: String },
    /// Runs an analysis task.
    RunAnalysis { generation: u64, task: String },
    /// Uploads a staged log file.
    UploadFile { generation: u64, file: StagedFile },
    /// Writes the images of analysis run `run` into `dir`.
    ExportVisualizations {
        generation: u64,
        run: u64,
        dir: PathBuf,
        visualizations: Vec<Visualization>,
    },
}
