//! The analysis panel: a task description, an optional template, and the
//! single retained result of the latest run.
use std::io;
use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{DecodeError, Engine as _};
use tracing::{debug, info, warn};

use super::input::InputLine;
use super::interaction::Interaction;
use crate::api::error::Result;
use crate::api::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTemplate {
    pub id: &'static str,
    pub display_name: &'static str,
    pub query_text: &'static str,
}

/// Selecting this template hands the task field back to the user.
pub const CUSTOM_TEMPLATE_ID: &str = "custom";

pub const ANALYSIS_TEMPLATES: [AnalysisTemplate; 4] = [
    AnalysisTemplate {
        id: "level-count",
        display_name: "Count by Log Level",
        query_text: "Count logs by level and show distribution",
    },
    AnalysisTemplate {
        id: "time-dist",
        display_name: "Time Distribution",
        query_text: "Show time distribution of logs",
    },
    AnalysisTemplate {
        id: "template-trend",
        display_name: "Template Patterns",
        query_text: "Analyze template trends in logs",
    },
    AnalysisTemplate {
        id: CUSTOM_TEMPLATE_ID,
        display_name: "Custom Analysis",
        query_text: "",
    },
];

/// Label shown while no template is selected.
pub const NO_TEMPLATE_LABEL: &str = "Select analysis type";

pub fn find_template(id: &str) -> Option<&'static AnalysisTemplate> {
    ANALYSIS_TEMPLATES.iter().find(|t| t.id == id)
}

/// Standard alphabet, padding optional, trailing bits tolerated.
const VISUALIZATION_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One decoded entry of `visualizations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visualization {
    Png(Vec<u8>),
    Undecodable,
}

/// What the result area should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisView {
    /// A reported error replaces the rest of the result.
    Error(String),
    Report {
        text: String,
        visualizations: Vec<Visualization>,
    },
}

#[derive(Debug, Default)]
pub struct AnalysisRunner {
    task: InputLine,
    selected: Option<String>,
    state: Interaction<AnalysisResult>,
}

impl AnalysisRunner {
    pub fn task(&self) -> &InputLine {
        &self.task
    }

    /// The task field, or `None` while a run is pending.
    pub fn task_mut(&mut self) -> Option<&mut InputLine> {
        if self.is_pending() {
            None
        } else {
            Some(&mut self.task)
        }
    }

    pub fn selected_label(&self) -> &str {
        match self.selected.as_deref() {
            Some(id) => find_template(id).map_or(id, |t| t.display_name),
            None => NO_TEMPLATE_LABEL,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Changes the selected template.
    ///
    /// A catalog template overwrites the task with its query text and
    /// `custom` clears it. Unknown ids only change the selection.
    pub fn select_template(&mut self, id: &str) {
        if id == CUSTOM_TEMPLATE_ID {
            self.task.clear();
        } else if let Some(template) = find_template(id) {
            self.task.set(template.query_text);
        }
        self.selected = Some(id.to_string());
    }

    /// Moves the selector one step through the catalog, wrapping around.
    pub fn cycle_template(&mut self, forward: bool) {
        let count = ANALYSIS_TEMPLATES.len();
        let current = self
            .selected
            .as_deref()
            .and_then(|id| ANALYSIS_TEMPLATES.iter().position(|t| t.id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.select_template(ANALYSIS_TEMPLATES[next].id);
    }

    /// Starts a run, discarding the previous result immediately.
    ///
    /// Returns the task text to send, or `None` if the task is blank or a run
    /// is already pending.
    pub fn begin_run(&mut self) -> Option<String> {
        if self.task.is_blank() || !self.state.begin() {
            return None;
        }
        info!("Analysis started: {}", self.task.as_str());
        Some(self.task.as_str().to_string())
    }

    pub fn settle_run(&mut self, outcome: Result<AnalysisResult>) {
        if !self.is_pending() {
            debug!("Ignoring analysis result with no run pending");
            return;
        }
        match &outcome {
            Ok(result) => debug!(
                "Analysis finished (success={}, {} visualizations)",
                result.success,
                result.visualizations.len()
            ),
            Err(e) => warn!("Analysis request failed: {}", e),
        }
        self.state.settle(outcome);
    }

    /// The retained result. A failed request reads as a synthesized
    /// unsuccessful result carrying the failure message.
    pub fn result(&self) -> Option<AnalysisResult> {
        match &self.state {
            Interaction::Succeeded(result) => Some(result.clone()),
            Interaction::Failed(message) => Some(AnalysisResult::failed(message.clone())),
            Interaction::Idle | Interaction::Pending => None,
        }
    }

    pub fn view(&self) -> Option<AnalysisView> {
        self.result().map(|result| render_result(&result))
    }
}

pub fn render_result(result: &AnalysisResult) -> AnalysisView {
    if let Some(error) = result.error_message() {
        return AnalysisView::Error(error.to_string());
    }
    let visualizations = if result.has_visualizations {
        result
            .visualizations
            .iter()
            .map(|encoded| match decode_visualization(encoded) {
                Ok(bytes) => Visualization::Png(bytes),
                Err(e) => {
                    warn!("Skipping undecodable visualization: {}", e);
                    Visualization::Undecodable
                }
            })
            .collect()
    } else {
        Vec::new()
    };
    AnalysisView::Report {
        text: result.analysis.clone(),
        visualizations,
    }
}

/// Decodes one base64 payload. Line breaks and other ASCII whitespace are
/// ignored, as is missing padding.
pub fn decode_visualization(encoded: &str) -> std::result::Result<Vec<u8>, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    VISUALIZATION_ENGINE.decode(compact)
}

/// Writes each decodable image as `analysis-<n>.png` under `dir`, where `n`
/// is its 1-based position in the result. Images exported by an earlier
/// run are removed first. Undecodable entries yield `None`.
///
/// # Errors
///
/// Fails on the first directory or file that cannot be read or written.
pub async fn export_visualizations(
    dir: &Path,
    visualizations: &[Visualization],
) -> io::Result<Vec<Option<PathBuf>>> {
    remove_stale_exports(dir).await?;
    if !visualizations
        .iter()
        .any(|v| matches!(v, Visualization::Png(_)))
    {
        return Ok(vec![None; visualizations.len()]);
    }

    tokio::fs::create_dir_all(dir).await?;
    let mut written = Vec::with_capacity(visualizations.len());
    for (index, visualization) in visualizations.iter().enumerate() {
        match visualization {
            Visualization::Png(bytes) => {
                let path = dir.join(format!("analysis-{}.png", index + 1));
                tokio::fs::write(&path, bytes).await?;
                written.push(Some(path));
            }
            Visualization::Undecodable => written.push(None),
        }
    }
    info!(
        "Exported {} visualizations to {}",
        written.iter().flatten().count(),
        dir.display()
    );
    Ok(written)
}

async fn remove_stale_exports(dir: &Path) -> io::Result<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_str().is_some_and(is_export_file_name) {
            debug!("Removing stale export {}", entry.path().display());
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

fn is_export_file_name(name: &str) -> bool {
    name.strip_prefix("analysis-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Backend;
    use crate::console::testing::{status_error, FakeBackend};

    impl AnalysisRunner {
        fn selected(&self) -> Option<&str> {
            self.selected.as_deref()
        }

        async fn run(&mut self, backend: &dyn Backend) {
            if let Some(task) = self.begin_run() {
                let outcome = backend.analyze(&task).await;
                self.settle_run(outcome);
            }
        }
    }

    fn report(analysis: &str, has_visualizations: bool, visualizations: &[&str]) -> AnalysisResult {
        AnalysisResult {
            success: true,
            analysis: analysis.into(),
            has_visualizations,
            visualizations: visualizations.iter().map(|v| v.to_string()).collect(),
            error: None,
        }
    }

    #[tokio::test]
    async fn template_text_is_sent_as_the_task() {
        let backend = FakeBackend::default();
        let mut runner = AnalysisRunner::default();
        runner.select_template("time-dist");
        runner.run(&backend).await;
        assert_eq!(
            backend.analysis_tasks.lock().unwrap().as_slice(),
            ["Show time distribution of logs"]
        );
    }

    #[tokio::test]
    async fn edited_template_text_is_sent_as_edited() {
        let backend = FakeBackend::default();
        let mut runner = AnalysisRunner::default();
        runner.select_template("level-count");
        let task = runner.task_mut().unwrap();
        task.cursor_end();
        for c in " for today".chars() {
            task.insert_char(c);
        }
        runner.run(&backend).await;
        assert_eq!(
            backend.analysis_tasks.lock().unwrap().as_slice(),
            ["Count logs by level and show distribution for today"]
        );
    }

    #[test]
    fn custom_clears_and_unknown_keeps_the_task() {
        let mut runner = AnalysisRunner::default();
        assert_eq!(runner.selected_label(), NO_TEMPLATE_LABEL);
        runner.select_template("template-trend");
        runner.select_template("no-such-template");
        assert_eq!(runner.task().as_str(), "Analyze template trends in logs");
        assert_eq!(runner.selected(), Some("no-such-template"));

        runner.select_template(CUSTOM_TEMPLATE_ID);
        assert_eq!(runner.task().as_str(), "");
        assert_eq!(runner.selected_label(), "Custom Analysis");
    }

    #[test]
    fn cycling_wraps_around_the_catalog() {
        let mut runner = AnalysisRunner::default();
        runner.cycle_template(false);
        assert_eq!(runner.selected(), Some(CUSTOM_TEMPLATE_ID));
        runner.cycle_template(true);
        assert_eq!(runner.selected(), Some("level-count"));
    }

    #[test]
    fn new_run_discards_the_previous_result_immediately() {
        let mut runner = AnalysisRunner::default();
        runner.select_template("level-count");
        runner.begin_run();
        runner.settle_run(Ok(report("old", false, &[])));
        assert!(runner.result().is_some());

        assert!(runner.begin_run().is_some());
        assert_eq!(runner.result(), None);
        assert!(runner.task_mut().is_none());
        assert_eq!(runner.begin_run(), None);
    }

    #[tokio::test]
    async fn blank_task_does_not_run() {
        let backend = FakeBackend::default();
        let mut runner = AnalysisRunner::default();
        runner.task_mut().unwrap().set("   ");
        runner.run(&backend).await;
        assert!(backend.analysis_tasks.lock().unwrap().is_empty());
        assert_eq!(runner.result(), None);
    }

    #[tokio::test]
    async fn transport_failure_synthesizes_an_unsuccessful_result() {
        let backend = FakeBackend::default();
        backend.push_analysis(Err(status_error(500, "Internal Server Error")));
        let mut runner = AnalysisRunner::default();
        runner.select_template("level-count");
        runner.run(&backend).await;

        let result = runner.result().unwrap();
        assert!(!result.success);
        assert!(result.analysis.is_empty());
        assert!(result.visualizations.is_empty());
        assert_eq!(
            runner.view(),
            Some(AnalysisView::Error("API Error: Internal Server Error".into()))
        );
    }

    #[test]
    fn reported_error_hides_the_content() {
        let mut result = report("partial", true, &["aGk="]);
        result.error = Some("engine exploded".into());
        assert_eq!(
            render_result(&result),
            AnalysisView::Error("engine exploded".into())
        );
    }

    #[test]
    fn visualizations_require_the_flag_and_keep_order() {
        let hidden = render_result(&report("text", false, &["aGk="]));
        assert_eq!(
            hidden,
            AnalysisView::Report {
                text: "text".into(),
                visualizations: Vec::new()
            }
        );

        let shown = render_result(&report("text", true, &["aGk=", "!!!", "eW8="]));
        assert_eq!(
            shown,
            AnalysisView::Report {
                text: "text".into(),
                visualizations: vec![
                    Visualization::Png(b"hi".to_vec()),
                    Visualization::Undecodable,
                    Visualization::Png(b"yo".to_vec()),
                ]
            }
        );
    }

    #[test]
    fn wrapped_and_unpadded_payloads_decode() {
        let wrapped = "aGVsbG8gd29ybGQsIHRo\naXMgaXMgYSBsb25nZXIg\r\ncGF5bG9hZA==\n";
        let shown = render_result(&report("text", true, &[wrapped, "aGk"]));
        assert_eq!(
            shown,
            AnalysisView::Report {
                text: "text".into(),
                visualizations: vec![
                    Visualization::Png(b"hello world, this is a longer payload".to_vec()),
                    Visualization::Png(b"hi".to_vec()),
                ]
            }
        );
    }

    #[tokio::test]
    async fn exports_are_named_by_position_in_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("viz");
        let visualizations = [
            Visualization::Undecodable,
            Visualization::Png(b"second".to_vec()),
        ];

        let written = export_visualizations(&target, &visualizations)
            .await
            .unwrap();

        assert_eq!(written, vec![None, Some(target.join("analysis-2.png"))]);
        assert_eq!(std::fs::read(target.join("analysis-2.png")).unwrap(), b"second");
        assert!(!target.join("analysis-1.png").exists());
    }

    #[tokio::test]
    async fn earlier_exports_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["analysis-1.png", "analysis-2.png", "analysis-3.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"old").unwrap();
        }

        export_visualizations(dir.path(), &[Visualization::Png(b"new".to_vec())])
            .await
            .unwrap();

        assert_eq!(std::fs::read(dir.path().join("analysis-1.png")).unwrap(), b"new");
        assert!(!dir.path().join("analysis-2.png").exists());
        assert!(!dir.path().join("analysis-3.png").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn nothing_is_created_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("viz");
        let written = export_visualizations(&target, &[Visualization::Undecodable])
            .await
            .unwrap();
        assert_eq!(written, vec![None]);
        assert!(!target.exists());
    }
}
