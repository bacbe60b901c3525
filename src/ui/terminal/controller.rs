use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::Focus;
use crate::api::Backend;
use crate::app::ConsoleConfig;
use crate::console::input::InputLine;
use crate::console::ViewRouter;
use crate::logging::DiagnosticsBuffer;
use crate::ui::{UIAction, UIEvent};

pub struct TerminalUI {
    pub(super) router: ViewRouter,
    pub(super) focus: Focus,
    /// Path typed into the upload field, staged on Enter.
    pub(super) upload_path: InputLine,
    pub(super) base_url: String,
    pub(super) export_dir: PathBuf,
    pub(super) diagnostics: Arc<DiagnosticsBuffer>,
    pub(super) terminal_size: (u16, u16),
    pub(super) terminal_active: bool,
    pub(super) running: bool,
    pub(super) event_rx: mpsc::UnboundedReceiver<UIEvent>,
    pub(super) action_tx: mpsc::UnboundedSender<UIAction>,
}

impl TerminalUI {
    /// Mounts the initial view, which starts log polling on `event_tx`.
    pub fn new(
        backend: Arc<dyn Backend>,
        config: ConsoleConfig,
        diagnostics: Arc<DiagnosticsBuffer>,
        event_tx: mpsc::UnboundedSender<UIEvent>,
        event_rx: mpsc::UnboundedReceiver<UIEvent>,
        action_tx: mpsc::UnboundedSender<UIAction>,
    ) -> Self {
        Self {
            router: ViewRouter::new(backend, event_tx, config.poll_interval),
            focus: Focus::default(),
            upload_path: InputLine::new(),
            base_url: config.base_url,
            export_dir: config.export_dir,
            diagnostics,
            terminal_size: (80, 24),
            terminal_active: false,
            running: true,
            event_rx,
            action_tx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.initialize_terminal()?;
        self.render()?;

        debug!("Starting terminal UI loop");

        while self.running {
            let Some(event) = self.event_rx.recv().await else {
                break;
            };
            if let Err(e) = self.handle_event(event) {
                error!("Error handling UI event: {}", e);
            }
            self.render()?;
        }

        info!("Terminal UI loop finished");
        self.cleanup()
    }

    pub(super) fn handle_event(&mut self, event: UIEvent) -> Result<()> {
        match event {
            UIEvent::KeyPress(key_event) => self.handle_key_event(key_event)?,
            UIEvent::Resize(width, height) => self.terminal_size = (width, height),
            UIEvent::Tick => {}
            UIEvent::LogFetchStarted { generation } => {
                if let Some(panels) = self.router.logs_and_chat_mut(generation) {
                    panels.feed.begin_fetch();
                }
            }
            UIEvent::LogFetchSettled {
                generation,
                outcome,
            } => {
                if let Some(panels) = self.router.logs_and_chat_mut(generation) {
                    panels.feed.settle_fetch(outcome);
                }
            }
            UIEvent::ChatSettled {
                generation,
                outcome,
            } => {
                if let Some(panels) = self.router.logs_and_chat_mut(generation) {
                    panels.chat.settle_send(outcome);
                }
            }
            UIEvent::UploadSettled {
                generation,
                outcome,
            } => {
                if let Some(panels) = self.router.logs_and_chat_mut(generation) {
                    panels.upload.settle_upload(outcome);
                }
            }
            UIEvent::AnalysisSettled {
                generation,
                outcome,
            } => {
                let job = self
                    .router
                    .analysis_mut(generation)
                    .and_then(|panel| panel.settle_run(outcome));
                if let Some(job) = job {
                    self.dispatch(UIAction::ExportVisualizations {
                        generation,
                        run: job.run,
                        dir: self.export_dir.clone(),
                        visualizations: job.visualizations,
                    })?;
                }
            }
            UIEvent::VisualizationsExported {
                generation,
                run,
                lines,
            } => {
                if let Some(panel) = self.router.analysis_mut(generation) {
                    panel.set_exported(run, lines);
                }
            }
        }
        Ok(())
    }

    pub(super) fn dispatch(&self, action: UIAction) -> Result<()> {
        self.action_tx
            .send(action)
            .map_err(|e| anyhow::anyhow!("Action channel closed: {}", e))
    }
}
