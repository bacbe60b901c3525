use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use super::{Focus, TerminalUI};
use crate::console::input::InputLine;
use crate::console::View;
use crate::types::StagedFile;
use crate::ui::UIAction;

impl TerminalUI {
    pub(super) fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.running = false;
                return Ok(());
            }
            (KeyCode::F(1), _) => {
                self.switch_view(View::LogsAndChat);
                return Ok(());
            }
            (KeyCode::F(2), _) => {
                self.switch_view(View::Analysis);
                return Ok(());
            }
            _ => {}
        }

        match self.router.view() {
            View::LogsAndChat => self.handle_logs_and_chat_key(key),
            View::Analysis => self.handle_analysis_key(key),
        }
    }

    fn switch_view(&mut self, view: View) {
        if self.router.select(view) {
            // The upload field belongs to the panels that were just dropped.
            self.focus = Focus::default();
            self.upload_path.clear();
        }
    }

    fn handle_logs_and_chat_key(&mut self, key: KeyEvent) -> Result<()> {
        let generation = self.router.generation();
        let Some(panels) = self.router.logs_and_chat_mut(generation) else {
            return Ok(());
        };

        match (key.code, key.modifiers) {
            (KeyCode::Tab, _) | (KeyCode::BackTab, _) => {
                self.focus = self.focus.toggled();
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if let Some(file) = panels.upload.begin_upload() {
                    self.dispatch(UIAction::UploadFile { generation, file })?;
                }
            }
            (KeyCode::Enter, _) => match self.focus {
                Focus::Chat => {
                    if let Some(query) = panels.chat.begin_send() {
                        self.dispatch(UIAction::SendChat { generation, query })?;
                    }
                }
                Focus::UploadPath => {
                    if panels.upload.is_pending() {
                        return Ok(());
                    }
                    let typed = self.upload_path.take();
                    let path = typed.trim();
                    if path.is_empty() {
                        panels.upload.select_file(None);
                    } else {
                        match StagedFile::existing(path) {
                            Ok(file) => {
                                debug!("Staged {}", file.path.display());
                                panels.upload.select_file(Some(file));
                            }
                            Err(e) => {
                                panels
                                    .upload
                                    .reject_selection(format!("Cannot select {}: {}", path, e));
                            }
                        }
                    }
                }
            },
            _ => {
                let input = match self.focus {
                    Focus::Chat => panels.chat.input_mut(),
                    Focus::UploadPath if !panels.upload.is_pending() => Some(&mut self.upload_path),
                    Focus::UploadPath => None,
                };
                if let Some(input) = input {
                    edit_input(input, key);
                }
            }
        }
        Ok(())
    }

    fn handle_analysis_key(&mut self, key: KeyEvent) -> Result<()> {
        let generation = self.router.generation();
        let Some(panel) = self.router.analysis_mut(generation) else {
            return Ok(());
        };

        match key.code {
            KeyCode::Tab | KeyCode::BackTab if !panel.runner.is_pending() => {
                panel.runner.cycle_template(key.code == KeyCode::Tab);
            }
            KeyCode::Enter => {
                if let Some(task) = panel.begin_run() {
                    self.dispatch(UIAction::RunAnalysis { generation, task })?;
                }
            }
            _ => {
                if let Some(task) = panel.runner.task_mut() {
                    edit_input(task, key);
                }
            }
        }
        Ok(())
    }
}

/// Applies a line-editing key; anything else is ignored.
fn edit_input(input: &mut InputLine, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
            input.insert_char(c);
        }
        (KeyCode::Backspace, _) => {
            input.remove_char_before();
        }
        (KeyCode::Delete, _) => {
            input.remove_char_at();
        }
        (KeyCode::Left, _) => input.cursor_left(),
        (KeyCode::Right, _) => input.cursor_right(),
        (KeyCode::Home, _) => input.cursor_home(),
        (KeyCode::End, _) => input.cursor_end(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::api::Backend;
    use crate::app::ConsoleConfig;
    use crate::console::testing::FakeBackend;
    use crate::logging::DiagnosticsBuffer;
    use crate::ui::UIEvent;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Harness {
        ui: TerminalUI,
        actions: mpsc::UnboundedReceiver<UIAction>,
    }

    fn harness(export_dir: &std::path::Path) -> Harness {
        let backend: Arc<dyn Backend> = Arc::new(FakeBackend::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (action_tx, actions) = mpsc::unbounded_channel();
        let config = ConsoleConfig {
            base_url: "http://localhost:8000".into(),
            poll_interval: Duration::from_secs(10),
            export_dir: export_dir.to_path_buf(),
        };
        let ui = TerminalUI::new(
            backend,
            config,
            Arc::new(DiagnosticsBuffer::new(8)),
            event_tx,
            event_rx,
            action_tx,
        );
        Harness { ui, actions }
    }

    fn press(ui: &mut TerminalUI, code: KeyCode) {
        ui.handle_event(UIEvent::KeyPress(KeyEvent::new(code, KeyModifiers::NONE)))
            .unwrap();
    }

    fn type_text(ui: &mut TerminalUI, text: &str) {
        for c in text.chars() {
            press(ui, KeyCode::Char(c));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enter_sends_chat_and_locks_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let Harness { mut ui, mut actions } = harness(dir.path());

        type_text(&mut ui, "hi");
        press(&mut ui, KeyCode::Enter);
        let generation = ui.router.generation();
        assert_eq!(
            actions.try_recv().unwrap(),
            UIAction::SendChat {
                generation,
                query: "hi".into()
            }
        );

        type_text(&mut ui, "more");
        press(&mut ui, KeyCode::Enter);
        assert!(actions.try_recv().is_err());
        let panels = ui.router.logs_and_chat().unwrap();
        assert_eq!(panels.chat.input().as_str(), "");
        assert!(panels.chat.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_chat_reply_is_dropped_after_a_view_switch() {
        let dir = tempfile::tempdir().unwrap();
        let Harness {
            mut ui,
            actions: _actions,
        } = harness(dir.path());
        type_text(&mut ui, "hi");
        press(&mut ui, KeyCode::Enter);
        let old = ui.router.generation();

        press(&mut ui, KeyCode::F(2));
        press(&mut ui, KeyCode::F(1));
        ui.handle_event(UIEvent::ChatSettled {
            generation: old,
            outcome: Err(ApiError::Status {
                status: 500,
                status_text: "Internal Server Error".into(),
            }),
        })
        .unwrap();

        assert!(ui.router.logs_and_chat().unwrap().chat.transcript().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn staging_a_missing_file_reports_it() {
        let dir = tempfile::tempdir().unwrap();
        let Harness { mut ui, mut actions } = harness(dir.path());
        press(&mut ui, KeyCode::Tab);
        type_text(&mut ui, "/definitely/not/here.log");
        press(&mut ui, KeyCode::Enter);

        let upload = &ui.router.logs_and_chat().unwrap().upload;
        assert!(upload.staged().is_none());
        assert!(upload
            .status()
            .unwrap()
            .starts_with("Cannot select /definitely/not/here.log"));

        ui.handle_event(UIEvent::KeyPress(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();
        assert!(actions.try_recv().is_err());
        assert_eq!(
            ui.router.logs_and_chat().unwrap().upload.status(),
            Some(crate::console::upload::SELECT_FILE_FIRST)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn staged_file_is_uploaded_with_ctrl_u() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("app.log");
        std::fs::write(&log, "line\n").unwrap();
        let Harness { mut ui, mut actions } = harness(dir.path());

        press(&mut ui, KeyCode::Tab);
        type_text(&mut ui, log.to_str().unwrap());
        press(&mut ui, KeyCode::Enter);
        ui.handle_event(UIEvent::KeyPress(KeyEvent::new(
            KeyCode::Char('u'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();

        match actions.try_recv().unwrap() {
            UIAction::UploadFile { file, .. } => assert_eq!(file.name, "app.log"),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_tab_picks_a_template_and_enter_runs_it() {
        let dir = tempfile::tempdir().unwrap();
        let Harness { mut ui, mut actions } = harness(dir.path());
        press(&mut ui, KeyCode::F(2));
        press(&mut ui, KeyCode::Tab);
        press(&mut ui, KeyCode::Enter);

        match actions.try_recv().unwrap() {
            UIAction::RunAnalysis { task, .. } => {
                assert_eq!(task, "Count logs by level and show distribution")
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn settled_images_are_exported_off_the_ui_task() {
        let dir = tempfile::tempdir().unwrap();
        let Harness { mut ui, mut actions } = harness(dir.path());
        press(&mut ui, KeyCode::F(2));
        press(&mut ui, KeyCode::Tab);
        press(&mut ui, KeyCode::Enter);
        assert!(matches!(
            actions.try_recv().unwrap(),
            UIAction::RunAnalysis { .. }
        ));
        let generation = ui.router.generation();

        ui.handle_event(UIEvent::AnalysisSettled {
            generation,
            outcome: Ok(crate::api::AnalysisResult {
                success: true,
                analysis: "INFO: 3".into(),
                has_visualizations: true,
                visualizations: vec!["aGk=".into()],
                error: None,
            }),
        })
        .unwrap();
        assert!(!dir.path().join("analysis-1.png").exists());

        let (run, visualizations) = match actions.try_recv().unwrap() {
            UIAction::ExportVisualizations {
                generation: g,
                run,
                dir: target,
                visualizations,
            } => {
                assert_eq!(g, generation);
                assert_eq!(target, dir.path());
                (run, visualizations)
            }
            other => panic!("unexpected action {other:?}"),
        };
        let lines = crate::console::router::export_lines(dir.path(), &visualizations).await;
        ui.handle_event(UIEvent::VisualizationsExported {
            generation,
            run,
            lines,
        })
        .unwrap();

        let exported = ui.router.analysis().unwrap().exported().to_vec();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].ends_with("analysis-1.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn ctrl_c_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let Harness {
            mut ui,
            actions: _actions,
        } = harness(dir.path());
        ui.handle_event(UIEvent::KeyPress(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )))
        .unwrap();
        assert!(!ui.running);
    }
}
