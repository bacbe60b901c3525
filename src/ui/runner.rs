use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{TerminalUI, UIAction, UIEvent};
use crate::api::Backend;
use crate::app::ConsoleConfig;
use crate::console::router::export_lines;
use crate::logging::DiagnosticsBuffer;

const INPUT_POLL: Duration = Duration::from_millis(100);
/// Input polls between two `Tick` events.
const POLLS_PER_TICK: u32 = 10;

pub async fn run_tui(
    backend: Arc<dyn Backend>,
    config: ConsoleConfig,
    diagnostics: Arc<DiagnosticsBuffer>,
) -> Result<()> {
    info!("Starting log console against {}", config.base_url);

    let (ui_event_tx, ui_event_rx) = mpsc::unbounded_channel::<UIEvent>();
    let (ui_action_tx, mut ui_action_rx) = mpsc::unbounded_channel::<UIAction>();

    // Crossterm's reader blocks, so it gets a thread of its own.
    let ui_event_tx_terminal = ui_event_tx.clone();
    tokio::task::spawn_blocking(move || {
        let mut idle_polls = 0;
        while !ui_event_tx_terminal.is_closed() {
            let event = match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key_event)) => Some(UIEvent::KeyPress(key_event)),
                    Ok(Event::Resize(width, height)) => Some(UIEvent::Resize(width, height)),
                    Ok(_) => None,
                    Err(e) => {
                        debug!("Failed to read terminal event: {}", e);
                        None
                    }
                },
                Ok(false) => {
                    idle_polls += 1;
                    if idle_polls >= POLLS_PER_TICK {
                        idle_polls = 0;
                        Some(UIEvent::Tick)
                    } else {
                        None
                    }
                }
                Err(e) => {
                    debug!("Terminal event poll failed: {}", e);
                    break;
                }
            };
            if let Some(event) = event {
                if ui_event_tx_terminal.send(event).is_err() {
                    break;
                }
            }
        }
    });

    let backend_actions = backend.clone();
    let ui_event_tx_actions = ui_event_tx.clone();
    tokio::spawn(async move {
        while let Some(action) = ui_action_rx.recv().await {
            handle_ui_action(action, &backend_actions, &ui_event_tx_actions);
        }
    });

    let mut terminal_ui = TerminalUI::new(
        backend,
        config,
        diagnostics,
        ui_event_tx,
        ui_event_rx,
        ui_action_tx,
    );
    terminal_ui.run().await
}

/// Issues the request behind `action` on its own task; the outcome comes
/// back as the matching `*Settled` event. Requests are neither cancelled nor
/// timed out.
pub(crate) fn handle_ui_action(
    action: UIAction,
    backend: &Arc<dyn Backend>,
    events: &mpsc::UnboundedSender<UIEvent>,
) {
    let backend = backend.clone();
    let events = events.clone();
    debug!("Dispatching {:?}", action);

    tokio::spawn(async move {
        let event = match action {
            UIAction::SendChat { generation, query } => UIEvent::ChatSettled {
                generation,
                outcome: backend.chat(&query).await,
            },
            UIAction::RunAnalysis { generation, task } => UIEvent::AnalysisSettled {
                generation,
                outcome: backend.analyze(&task).await,
            },
            UIAction::UploadFile { generation, file } => UIEvent::UploadSettled {
                generation,
                outcome: backend.upload_log_file(&file).await,
            },
            UIAction::ExportVisualizations {
                generation,
                run,
                dir,
                visualizations,
            } => UIEvent::VisualizationsExported {
                generation,
                run,
                lines: export_lines(&dir, &visualizations).await,
            },
        };
        if events.send(event).is_err() {
            debug!("UI closed before a request settled");
        }
    });
}
