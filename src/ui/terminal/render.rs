use anyhow::Result;
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{stdout, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Focus, TerminalUI};
use crate::console::analysis::AnalysisView;
use crate::console::input::InputLine;
use crate::console::log_feed::FeedDisplay;
use crate::console::router::{AnalysisPanel, LogsAndChatPanels};
use crate::console::View;
use crate::types::Sender;

const CHAT_PROMPT: &str = "chat> ";
const FILE_PROMPT: &str = "file> ";
const TASK_PROMPT: &str = "task> ";

/// Rows `top..top + height` of the screen.
#[derive(Debug, Clone, Copy)]
struct Area {
    top: u16,
    height: u16,
    width: u16,
}

impl TerminalUI {
    pub(super) fn render(&mut self) -> Result<()> {
        let mut stdout = stdout();

        queue!(
            stdout,
            cursor::Hide,
            Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;

        let (width, height) = self.terminal_size;
        if height < 6 || width < 20 {
            queue!(stdout, Print("Terminal too small"))?;
            stdout.flush()?;
            return Ok(());
        }

        self.render_header(&mut stdout, width)?;

        let body = Area {
            top: 1,
            height: height - 3,
            width,
        };
        let cursor_at = if let Some(panels) = self.router.logs_and_chat() {
            render_logs_and_chat(&mut stdout, panels, &self.upload_path, self.focus, body)?
        } else if let Some(panel) = self.router.analysis() {
            render_analysis(&mut stdout, panel, body)?
        } else {
            None
        };

        self.render_status_line(&mut stdout, height - 2, width)?;
        self.render_help_line(&mut stdout, height - 1, width)?;

        if let Some((x, y)) = cursor_at {
            queue!(stdout, cursor::MoveTo(x, y), cursor::Show)?;
        }

        stdout.flush()?;
        Ok(())
    }

    fn render_header(&self, stdout: &mut impl Write, width: u16) -> Result<()> {
        queue!(stdout, cursor::MoveTo(0, 0))?;
        let mut used = 0;
        for (key, view) in [("F1", View::LogsAndChat), ("F2", View::Analysis)] {
            let label = format!(" {}: {} ", key, view.title());
            if view == self.router.view() {
                queue!(
                    stdout,
                    SetBackgroundColor(Color::Blue),
                    SetForegroundColor(Color::White)
                )?;
            } else {
                queue!(stdout, SetForegroundColor(Color::DarkGrey))?;
            }
            used += print_clipped(stdout, &label, (width as usize).saturating_sub(used))?;
            queue!(stdout, ResetColor, Print(" "))?;
            used += 1;
        }
        Ok(())
    }

    fn render_status_line(&self, stdout: &mut impl Write, row: u16, width: u16) -> Result<()> {
        queue!(
            stdout,
            cursor::MoveTo(0, row),
            SetBackgroundColor(Color::DarkGrey),
            SetForegroundColor(Color::White)
        )?;

        let mut status_text = format!(" Backend: {} | {}", self.base_url, self.router.view().title());
        if let Some(diagnostic) = self.diagnostics.latest_notable() {
            status_text.push_str(&format!(
                " | {} {}: {}",
                diagnostic.timestamp.format("%H:%M:%S"),
                diagnostic.level,
                diagnostic.message
            ));
        }

        let used = print_clipped(stdout, &status_text, width as usize)?;
        let padding = (width as usize).saturating_sub(used);
        if padding > 0 {
            queue!(stdout, Print(" ".repeat(padding)))?;
        }

        queue!(stdout, ResetColor)?;
        Ok(())
    }

    fn render_help_line(&self, stdout: &mut impl Write, row: u16, width: u16) -> Result<()> {
        let help_text = match self.router.view() {
            View::LogsAndChat => {
                " Tab: chat/file | Enter: send or select file | Ctrl+U: upload | F2: analysis | Ctrl+C: exit"
            }
            View::Analysis => {
                " Tab/Shift+Tab: template | Enter: run | F1: logs & chat | Ctrl+C: exit"
            }
        };
        queue!(
            stdout,
            cursor::MoveTo(0, row),
            SetForegroundColor(Color::DarkGrey)
        )?;
        print_clipped(stdout, help_text, width as usize)?;
        queue!(stdout, ResetColor)?;
        Ok(())
    }
}

/// Draws the log table, the chat transcript and the two input lines.
/// Returns where the cursor belongs.
fn render_logs_and_chat(
    stdout: &mut impl Write,
    panels: &LogsAndChatPanels,
    upload_path: &InputLine,
    focus: Focus,
    area: Area,
) -> Result<Option<(u16, u16)>> {
    let width = area.width as usize;
    let sections = area.height.saturating_sub(3);
    let logs_height = sections / 2;
    let chat_height = sections - logs_height;
    let mut row = area.top;

    // Log table
    if logs_height > 0 {
        render_title(stdout, row, "Recent logs", width)?;
        let rows = logs_height - 1;
        match panels.feed.display() {
            FeedDisplay::Loading => print_row(stdout, row + 1, "Loading logs...", width, None)?,
            FeedDisplay::Error(message) => print_row(
                stdout,
                row + 1,
                &format!("Error: {}", message),
                width,
                Some(Color::Red),
            )?,
            FeedDisplay::Empty => print_row(stdout, row + 1, "No logs found.", width, None)?,
            FeedDisplay::Table(records) => {
                for (offset, record) in records.iter().take(rows as usize).enumerate() {
                    let y = row + 1 + offset as u16;
                    queue!(stdout, cursor::MoveTo(0, y))?;
                    let mut used = print_clipped(stdout, &format!("{:<24} ", single_line(&record.timestamp)), width)?;
                    queue!(stdout, SetForegroundColor(level_color(&record.level)))?;
                    used += print_clipped(
                        stdout,
                        &format!("{:<7} ", single_line(&record.level)),
                        width.saturating_sub(used),
                    )?;
                    queue!(stdout, ResetColor)?;
                    print_clipped(stdout, &single_line(&record.message), width.saturating_sub(used))?;
                }
            }
        }
        row += logs_height;
    }

    // Chat transcript, newest lines at the bottom
    if chat_height > 0 {
        render_title(stdout, row, "Chat", width)?;
        let mut lines: Vec<(Color, String)> = Vec::new();
        for message in panels.chat.transcript() {
            let (prefix, color) = match message.sender {
                Sender::User => ("You: ", Color::Cyan),
                Sender::Bot => ("Bot: ", Color::Green),
            };
            let wrapped = wrap(&message.text, width.saturating_sub(prefix.len()).max(1));
            for (i, line) in wrapped.into_iter().enumerate() {
                let lead = if i == 0 { prefix } else { "     " };
                lines.push((color, format!("{}{}", lead, line)));
            }
        }
        if panels.chat.is_pending() {
            lines.push((Color::DarkGrey, "Bot is thinking...".to_string()));
        }
        let visible = (chat_height - 1) as usize;
        let skip = lines.len().saturating_sub(visible);
        for (offset, (color, line)) in lines.iter().skip(skip).enumerate() {
            print_row(stdout, row + 1 + offset as u16, line, width, Some(*color))?;
        }
        row += chat_height;
    }

    // Upload selection and status
    let upload = &panels.upload;
    let mut upload_line = match upload.staged() {
        Some(file) => format!("Upload: Selected: {}", file.name),
        None => "Upload: no file selected".to_string(),
    };
    if let Some(status) = upload.status() {
        upload_line.push_str(" | ");
        upload_line.push_str(status);
    }
    print_row(stdout, row, &upload_line, width, Some(Color::Yellow))?;

    let chat_row = row + 1;
    let file_row = row + 2;
    let chat_cursor = render_input(
        stdout,
        chat_row,
        CHAT_PROMPT,
        panels.chat.input(),
        focus == Focus::Chat && !panels.chat.is_pending(),
        width,
    )?;
    let file_cursor = render_input(
        stdout,
        file_row,
        FILE_PROMPT,
        upload_path,
        focus == Focus::UploadPath && !upload.is_pending(),
        width,
    )?;

    Ok(match focus {
        Focus::Chat if !panels.chat.is_pending() => chat_cursor,
        Focus::UploadPath if !upload.is_pending() => file_cursor,
        _ => None,
    })
}

fn render_analysis(
    stdout: &mut impl Write,
    panel: &AnalysisPanel,
    area: Area,
) -> Result<Option<(u16, u16)>> {
    let width = area.width as usize;
    let runner = &panel.runner;

    print_row(
        stdout,
        area.top,
        &format!("Template: {}", runner.selected_label()),
        width,
        Some(Color::Cyan),
    )?;
    let cursor_at = render_input(
        stdout,
        area.top + 1,
        TASK_PROMPT,
        runner.task(),
        !runner.is_pending(),
        width,
    )?;

    let result_top = area.top + 3;
    let result_rows = area.height.saturating_sub(3) as usize;
    let mut lines: Vec<(Option<Color>, String)> = Vec::new();

    if runner.is_pending() {
        lines.push((Some(Color::DarkGrey), "Running analysis...".to_string()));
    } else {
        match runner.view() {
            None => lines.push((
                Some(Color::DarkGrey),
                "Pick a template or type a task, then press Enter.".to_string(),
            )),
            Some(AnalysisView::Error(message)) => {
                for line in wrap(&message, width) {
                    lines.push((Some(Color::Red), line));
                }
            }
            Some(AnalysisView::Report { text, .. }) => {
                for line in wrap(&text, width) {
                    lines.push((None, line));
                }
                if !panel.exported().is_empty() {
                    lines.push((None, String::new()));
                    for line in panel.exported() {
                        lines.push((Some(Color::Green), line.clone()));
                    }
                }
            }
        }
    }

    for (offset, (color, line)) in lines.iter().take(result_rows).enumerate() {
        print_row(stdout, result_top + offset as u16, line, width, *color)?;
    }

    Ok(cursor_at)
}

fn render_title(stdout: &mut impl Write, row: u16, title: &str, width: usize) -> Result<()> {
    let label = format!("── {} ", title);
    let fill = width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
    print_row(
        stdout,
        row,
        &format!("{}{}", label, "─".repeat(fill)),
        width,
        Some(Color::DarkGrey),
    )
}

/// Draws `prompt` and the field, returning the cursor position when the
/// field is enabled.
fn render_input(
    stdout: &mut impl Write,
    row: u16,
    prompt: &str,
    input: &InputLine,
    enabled: bool,
    width: usize,
) -> Result<Option<(u16, u16)>> {
    queue!(
        stdout,
        cursor::MoveTo(0, row),
        SetForegroundColor(if enabled { Color::Cyan } else { Color::DarkGrey }),
        Print(prompt),
        ResetColor
    )?;
    let prompt_width = UnicodeWidthStr::width(prompt);
    if !enabled {
        queue!(stdout, SetForegroundColor(Color::DarkGrey))?;
    }
    print_clipped(stdout, input.as_str(), width.saturating_sub(prompt_width))?;
    queue!(stdout, ResetColor)?;

    if !enabled {
        return Ok(None);
    }
    let input_width: usize = input
        .as_str()
        .chars()
        .take(input.cursor_pos())
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .sum();
    let cursor_x = prompt_width + input_width;
    Ok((cursor_x < width).then_some((cursor_x as u16, row)))
}

fn print_row(
    stdout: &mut impl Write,
    row: u16,
    text: &str,
    width: usize,
    color: Option<Color>,
) -> Result<()> {
    queue!(stdout, cursor::MoveTo(0, row))?;
    if let Some(color) = color {
        queue!(stdout, SetForegroundColor(color))?;
    }
    print_clipped(stdout, text, width)?;
    queue!(stdout, ResetColor)?;
    Ok(())
}

/// Prints as much of `text` as fits in `max_width` columns and returns the
/// columns used.
fn print_clipped(stdout: &mut impl Write, text: &str, max_width: usize) -> Result<usize> {
    let (clipped, used) = clip(text, max_width);
    queue!(stdout, Print(clipped))?;
    Ok(used)
}

fn clip(text: &str, max_width: usize) -> (String, usize) {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    (out, used)
}

/// Breaks `text` into lines no wider than `width` columns, honoring newlines.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for source in text.split('\n') {
        let mut line = String::new();
        let mut used = 0;
        for c in source.trim_end_matches('\r').chars() {
            let c = if c == '\t' { ' ' } else { c };
            let w = UnicodeWidthChar::width(c).unwrap_or(0);
            if used + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(c);
            used += w;
        }
        lines.push(line);
    }
    lines
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn level_color(level: &str) -> Color {
    match level.to_ascii_uppercase().as_str() {
        "ERROR" | "CRITICAL" | "FATAL" => Color::Red,
        "WARN" | "WARNING" => Color::Yellow,
        "DEBUG" | "TRACE" => Color::DarkGrey,
        _ => Color::Green,
    }
}
