//! Renders transcript entries into pre-wrapped ratatui lines.
//!
//! Content arrives pre-wrapped to the pane width; the paragraph widget must
//! not wrap again or long lines would wrap twice.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use rwd_core::events::{Attachment, StepStatus, ToolCallStatus};
use rwd_core::transcript::{
    AttachmentsEntry, MessageEntry, StepEntry, ToolEntry, TranscriptEntry, TranscriptState,
};
use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::common::text::{sanitize_for_display, truncate_with_ellipsis};

const NESTED_TOOL_INDENT: &str = "  ";

/// Renders the whole transcript at the given wrap width.
///
/// The line count of the result feeds the scroll math, so layout and
/// render must call this with the same width.
pub fn render_lines(state: &TranscriptState, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for entry in state.entries() {
        match entry {
            TranscriptEntry::Message(message) => render_message(&mut lines, message, width),
            TranscriptEntry::Attachments(attachments) => {
                render_attachments(&mut lines, attachments, width);
            }
            TranscriptEntry::Step(step) => render_step(&mut lines, step, width),
            TranscriptEntry::Tool(tool) => {
                lines.push(tool_line(tool, width, ""));
                lines.push(Line::default());
            }
        }
    }
    lines
}

fn render_message(lines: &mut Vec<Line<'static>>, message: &MessageEntry, width: usize) {
    let (label, style) = match message.role.as_str() {
        "user" => (
            "you",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        "assistant" => ("agent", Style::default().add_modifier(Modifier::BOLD)),
        other => return render_labeled_message(lines, other, message, width),
    };
    push_message_body(lines, label, style, message, width);
}

fn render_labeled_message(
    lines: &mut Vec<Line<'static>>,
    label: &str,
    message: &MessageEntry,
    width: usize,
) {
    let style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    push_message_body(lines, label.to_string(), style, message, width);
}

fn push_message_body(
    lines: &mut Vec<Line<'static>>,
    label: impl Into<String>,
    label_style: Style,
    message: &MessageEntry,
    width: usize,
) {
    let mut header = vec![Span::styled(label.into(), label_style)];
    if let Some(time) = format_time(message.timestamp) {
        header.push(Span::raw("  "));
        header.push(Span::styled(time, Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(header));

    for wrapped in wrap_text(&message.content, width) {
        lines.push(Line::from(wrapped));
    }
    lines.push(Line::default());
}

fn render_attachments(lines: &mut Vec<Line<'static>>, entry: &AttachmentsEntry, width: usize) {
    for attachment in &entry.attachments {
        lines.push(Line::from(Span::styled(
            truncate_with_ellipsis(&attachment_label(attachment), width),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::default());
}

fn attachment_label(attachment: &Attachment) -> String {
    let name = attachment
        .filename
        .as_deref()
        .unwrap_or(&attachment.file_id);
    match attachment.size {
        Some(size) => format!("⎘ {name} ({})", format_size(size)),
        None => format!("⎘ {name}"),
    }
}

fn render_step(lines: &mut Vec<Line<'static>>, step: &StepEntry, width: usize) {
    let (glyph, text, color) = match step.status {
        StepStatus::Running => ("▸", "step running", Color::Yellow),
        StepStatus::Completed => ("✔", "step completed", Color::Green),
        StepStatus::Failed => ("✘", "step failed", Color::Red),
    };
    lines.push(Line::from(vec![
        Span::styled(glyph.to_string(), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(text.to_string(), Style::default().fg(color)),
    ]));
    for tool in &step.tools {
        lines.push(tool_line(tool, width, NESTED_TOOL_INDENT));
    }
    lines.push(Line::default());
}

/// One-line summary of a tool invocation.
fn tool_line(tool: &ToolEntry, width: usize, indent: &str) -> Line<'static> {
    let (glyph, color) = match tool.status {
        ToolCallStatus::Calling => ("…", Color::Yellow),
        ToolCallStatus::Called => ("✓", Color::Green),
    };
    let name = if tool.function.is_empty() {
        tool.name.clone()
    } else {
        format!("{}.{}", tool.name, tool.function)
    };

    let mut spans = vec![
        Span::raw(indent.to_string()),
        Span::styled(glyph.to_string(), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(name.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ];

    if tool.status == ToolCallStatus::Called {
        let used = indent.width() + 2 + name.width();
        let room = width.saturating_sub(used + 2);
        if room > 4
            && let Some(preview) = value_preview(&tool.content)
        {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                truncate_with_ellipsis(&preview, room),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    Line::from(spans)
}

/// Flattens an opaque payload into a single display line, if it has one.
fn value_preview(value: &Value) -> Option<String> {
    let raw = match value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let flat = sanitize_for_display(&raw).replace('\n', " ");
    let trimmed = flat.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn format_time(timestamp: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.format("%H:%M:%S").to_string())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// Greedy word wrap to `width` terminal columns.
///
/// Words longer than the width are hard-broken on grapheme boundaries so a
/// pasted URL cannot push the pane sideways. Always yields at least one
/// line per source line.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut out = Vec::new();
    for source_line in text.split('\n') {
        let sanitized = sanitize_for_display(source_line);
        if sanitized.width() <= width {
            out.push(sanitized.into_owned());
            continue;
        }

        let mut current = String::new();
        for word in sanitized.split(' ') {
            let sep = usize::from(!current.is_empty());
            if current.width() + sep + word.width() <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if word.width() <= width {
                current.push_str(word);
            } else {
                hard_break(word, width, &mut out, &mut current);
            }
        }
        out.push(current);
    }
    out
}

/// Splits an over-long word across lines on grapheme boundaries. The final
/// partial chunk is left in `current` so following words can join it.
fn hard_break(word: &str, width: usize, out: &mut Vec<String>, current: &mut String) {
    for grapheme in word.graphemes(true) {
        if current.width() + grapheme.width() > width && !current.is_empty() {
            out.push(std::mem::take(current));
        }
        current.push_str(grapheme);
    }
}

#[cfg(test)]
mod tests {
    use rwd_core::events::SessionEvent;
    use serde_json::json;

    use super::*;

    fn state_from(events: &[SessionEvent]) -> TranscriptState {
        let mut state = TranscriptState::new();
        for event in events {
            state.apply(event);
        }
        state
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    #[test]
    fn wrap_keeps_short_lines_intact() {
        assert_eq!(wrap_text("hello world", 40), vec!["hello world"]);
        assert_eq!(wrap_text("", 40), vec![""]);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 9),
            vec!["the quick", "brown fox"]
        );
    }

    #[test]
    fn wrap_hard_breaks_oversized_words() {
        let lines = wrap_text("see https://example.com/a/very/long/path", 10);
        assert!(lines.len() > 2);
        assert!(lines.iter().all(|line| line.width() <= 10));
    }

    #[test]
    fn wrap_preserves_blank_source_lines() {
        assert_eq!(wrap_text("a\n\nb", 40), vec!["a", "", "b"]);
    }

    #[test]
    fn message_renders_header_body_and_separator() {
        let state = state_from(&[SessionEvent::Message {
            role: "user".to_string(),
            content: "hi there".to_string(),
            attachments: Vec::new(),
            event_id: 1,
            timestamp: 1_700_000_000,
        }]);
        let lines = render_lines(&state, 40);
        assert_eq!(lines.len(), 3);
        assert!(line_text(&lines[0]).starts_with("you"));
        assert_eq!(line_text(&lines[1]), "hi there");
        assert_eq!(line_text(&lines[2]), "");
    }

    #[test]
    fn step_renders_nested_tools_indented() {
        let state = state_from(&[
            SessionEvent::Step {
                status: StepStatus::Running,
                event_id: 1,
            },
            SessionEvent::Tool {
                tool_call_id: "t1".to_string(),
                name: "browser".to_string(),
                status: ToolCallStatus::Called,
                function: "navigate".to_string(),
                args: Value::Null,
                content: json!("ok"),
                timestamp: 0,
                event_id: 2,
            },
        ]);
        let lines = render_lines(&state, 60);
        assert_eq!(line_text(&lines[0]), "▸ step running");
        let tool = line_text(&lines[1]);
        assert!(tool.starts_with("  ✓ browser.navigate"));
        assert!(tool.contains("ok"));
    }

    #[test]
    fn attachments_render_one_line_each() {
        let state = state_from(&[SessionEvent::Message {
            role: "assistant".to_string(),
            content: "files attached".to_string(),
            attachments: vec![
                Attachment {
                    file_id: "f1".to_string(),
                    filename: Some("report.pdf".to_string()),
                    size: Some(2048),
                },
                Attachment {
                    file_id: "f2".to_string(),
                    filename: None,
                    size: None,
                },
            ],
            event_id: 1,
            timestamp: 0,
        }]);
        let lines = render_lines(&state, 60);
        let rendered: Vec<String> = lines.iter().map(line_text).collect();
        assert!(rendered.iter().any(|l| l.contains("report.pdf (2.0 KB)")));
        assert!(rendered.iter().any(|l| l.contains("⎘ f2")));
    }

    #[test]
    fn calling_tool_shows_no_content_preview() {
        let state = state_from(&[SessionEvent::Tool {
            tool_call_id: "t1".to_string(),
            name: "search".to_string(),
            status: ToolCallStatus::Calling,
            function: String::new(),
            args: Value::Null,
            content: Value::Null,
            timestamp: 0,
            event_id: 1,
        }]);
        let lines = render_lines(&state, 60);
        assert_eq!(line_text(&lines[0]), "… search");
    }
}
