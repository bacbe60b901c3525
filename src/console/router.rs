//! Which panel set is mounted, and for how long.
//!
//! Switching views drops the old panels wholesale: their controllers, their
//! state and, for Logs & Chat, the poller. Every mount gets a fresh
//! generation number; results tagged with an older one are discarded.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::analysis::{export_visualizations, AnalysisRunner, AnalysisView, Visualization};
use super::chat::ChatSession;
use super::log_feed::LogFeed;
use super::poller::LogFeedPoller;
use super::upload::UploadController;
use crate::api::error::Result;
use crate::api::{AnalysisResult, Backend};
use crate::ui::UIEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    LogsAndChat,
    Analysis,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::LogsAndChat => "Logs & Chat",
            View::Analysis => "Analysis",
        }
    }
}

pub struct LogsAndChatPanels {
    pub chat: ChatSession,
    pub upload: UploadController,
    pub feed: LogFeed,
    _poller: LogFeedPoller,
}

#[derive(Debug, Default)]
pub struct AnalysisPanel {
    pub runner: AnalysisRunner,
    exported: Vec<String>,
    /// Counts runs, so export reports for an earlier run can be told apart.
    run: u64,
}

/// Images of a settled run that still have to be written to disk.
#[derive(Debug)]
pub struct ExportJob {
    pub run: u64,
    pub visualizations: Vec<Visualization>,
}

impl AnalysisPanel {
    /// One line per visualization of the current result: the file it was
    /// written to, or why it was not.
    pub fn exported(&self) -> &[String] {
        &self.exported
    }

    pub fn begin_run(&mut self) -> Option<String> {
        let task = self.runner.begin_run()?;
        self.run += 1;
        self.exported.clear();
        Some(task)
    }

    /// Settles the pending run. Returns the images to export, if the result
    /// has any.
    pub fn settle_run(&mut self, outcome: Result<AnalysisResult>) -> Option<ExportJob> {
        let was_pending = self.runner.is_pending();
        self.runner.settle_run(outcome);
        if !was_pending {
            return None;
        }
        match self.runner.view() {
            Some(AnalysisView::Report { visualizations, .. }) if !visualizations.is_empty() => {
                Some(ExportJob {
                    run: self.run,
                    visualizations,
                })
            }
            _ => None,
        }
    }

    /// Records the outcome of an export. Reports for any run but the latest
    /// settled one are dropped.
    pub fn set_exported(&mut self, run: u64, lines: Vec<String>) {
        if run != self.run || self.runner.is_pending() {
            debug!("Ignoring export report for analysis run {}", run);
            return;
        }
        self.exported = lines;
    }
}

/// Writes the images under `dir` and describes each visualization in one line.
pub async fn export_lines(dir: &Path, visualizations: &[Visualization]) -> Vec<String> {
    let written = match export_visualizations(dir, visualizations).await {
        Ok(written) => written,
        Err(e) => {
            warn!("Could not export visualizations to {}: {}", dir.display(), e);
            return vec![format!("Could not export visualizations: {}", e)];
        }
    };

    written
        .iter()
        .enumerate()
        .map(|(index, path)| match path {
            Some(path) => format!("Visualization {}: {}", index + 1, path.display()),
            None => format!("Visualization {}: not a valid image", index + 1),
        })
        .collect()
}

enum Mounted {
    LogsAndChat(LogsAndChatPanels),
    Analysis(AnalysisPanel),
}

pub struct ViewRouter {
    backend: Arc<dyn Backend>,
    events: mpsc::UnboundedSender<UIEvent>,
    poll_interval: Duration,
    generation: u64,
    mounted: Mounted,
}

impl ViewRouter {
    /// Mounts the Logs & Chat view, which starts polling right away.
    pub fn new(
        backend: Arc<dyn Backend>,
        events: mpsc::UnboundedSender<UIEvent>,
        poll_interval: Duration,
    ) -> Self {
        let generation = 1;
        let mounted = Mounted::LogsAndChat(Self::mount_logs_and_chat(
            &backend,
            &events,
            poll_interval,
            generation,
        ));
        Self {
            backend,
            events,
            poll_interval,
            generation,
            mounted,
        }
    }

    fn mount_logs_and_chat(
        backend: &Arc<dyn Backend>,
        events: &mpsc::UnboundedSender<UIEvent>,
        poll_interval: Duration,
        generation: u64,
    ) -> LogsAndChatPanels {
        LogsAndChatPanels {
            chat: ChatSession::new(),
            upload: UploadController::new(),
            feed: LogFeed::new(),
            _poller: LogFeedPoller::start(backend.clone(), poll_interval, generation, events.clone()),
        }
    }

    pub fn view(&self) -> View {
        match self.mounted {
            Mounted::LogsAndChat(_) => View::LogsAndChat,
            Mounted::Analysis(_) => View::Analysis,
        }
    }

    /// Tag for requests issued by the currently mounted panels.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switches to `view`, remounting from scratch.
    ///
    /// Returns `false` if `view` is already shown; nothing is remounted then.
    pub fn select(&mut self, view: View) -> bool {
        if self.view() == view {
            return false;
        }
        self.generation += 1;
        let mounted = match view {
            View::LogsAndChat => Mounted::LogsAndChat(Self::mount_logs_and_chat(
                &self.backend,
                &self.events,
                self.poll_interval,
                self.generation,
            )),
            View::Analysis => Mounted::Analysis(AnalysisPanel::default()),
        };
        // Replacing drops the old panel set, and with it any poller.
        self.mounted = mounted;
        info!("Switched to {} (view #{})", view.title(), self.generation);
        true
    }

    pub fn logs_and_chat(&self) -> Option<&LogsAndChatPanels> {
        match &self.mounted {
            Mounted::LogsAndChat(panels) => Some(panels),
            Mounted::Analysis(_) => None,
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisPanel> {
        match &self.mounted {
            Mounted::Analysis(panel) => Some(panel),
            Mounted::LogsAndChat(_) => None,
        }
    }

    /// The Logs & Chat panels, if they are mounted under `generation`.
    pub fn logs_and_chat_mut(&mut self, generation: u64) -> Option<&mut LogsAndChatPanels> {
        if !self.is_current(generation) {
            return None;
        }
        match &mut self.mounted {
            Mounted::LogsAndChat(panels) => Some(panels),
            Mounted::Analysis(_) => None,
        }
    }

    /// The Analysis panel, if it is mounted under `generation`.
    pub fn analysis_mut(&mut self, generation: u64) -> Option<&mut AnalysisPanel> {
        if !self.is_current(generation) {
            return None;
        }
        match &mut self.mounted {
            Mounted::Analysis(panel) => Some(panel),
            Mounted::LogsAndChat(_) => None,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(
                "Discarding result for view #{} (current #{})",
                generation, self.generation
            );
            return false;
        }
        true
    }
}
