//! The upload panel: one staged file and a status line.
use tracing::{info, warn};

use super::interaction::Interaction;
use crate::api::error::Result;
use crate::api::UploadReply;
use crate::types::StagedFile;

pub const SELECT_FILE_FIRST: &str = "Please select a file first.";
pub const UPLOADING: &str = "Uploading...";

#[derive(Debug, Default)]
pub struct UploadController {
    staged: Option<StagedFile>,
    status: Option<String>,
    state: Interaction<UploadReply>,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn staged(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Replaces the staged file. Picking a file clears the status line;
    /// clearing the selection leaves it alone.
    pub fn select_file(&mut self, file: Option<StagedFile>) {
        if file.is_some() {
            self.status = None;
        }
        self.staged = file;
    }

    /// Reports a selection that could not be staged.
    pub fn reject_selection(&mut self, reason: impl Into<String>) {
        self.status = Some(reason.into());
    }

    /// Starts an upload of the staged file.
    ///
    /// With nothing staged this only sets the status line and returns `None`.
    pub fn begin_upload(&mut self) -> Option<StagedFile> {
        if self.is_pending() {
            return None;
        }
        let Some(file) = self.staged.clone() else {
            self.status = Some(SELECT_FILE_FIRST.to_string());
            return None;
        };
        self.state.begin();
        self.status = Some(UPLOADING.to_string());
        info!("Uploading {}", file.path.display());
        Some(file)
    }

    pub fn settle_upload(&mut self, outcome: Result<UploadReply>) {
        if !self.is_pending() {
            return;
        }
        match &outcome {
            Ok(reply) => {
                let message = reply.message.as_deref().unwrap_or_default();
                self.status = Some(format!("Upload successful! {}", message).trim_end().to_string());
                self.staged = None;
                info!("Upload accepted");
            }
            Err(e) => {
                warn!("Upload failed: {}", e);
                self.status = Some(format!("Upload failed: {}", e));
            }
        }
        self.state.settle(outcome);
    }
}
