//! Pure view functions for the TUI.
//!
//! Everything here takes `&AppState`, draws to a ratatui frame, and never
//! mutates state or returns effects. Layout math that the reducer also
//! needs (viewport height, wrap width) lives here so the two stay in sync.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use rwd_core::events::ToolCallStatus;
use rwd_core::transcript::ToolEntry;

use crate::common::Scrollbar;
use crate::common::text::truncate_with_ellipsis;
use crate::state::{AppState, LiveStream, SessionMode, TuiState};
use crate::transcript;

/// Height of the status line at the bottom.
const STATUS_HEIGHT: u16 = 1;

/// Height of the tool activity panel (when shown).
const TOOL_PANEL_HEIGHT: u16 = 3;

/// Width of the plan side panel (when a plan exists).
const PLAN_PANEL_WIDTH: u16 = 34;

/// Transcript horizontal margin (padding on each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Width reserved for the scrollbar on the right side.
const SCROLLBAR_WIDTH: u16 = 1;

/// Spinner frames for status and tool panel animation.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Tick count per spinner frame; slows the animation to a readable rate.
const SPINNER_SPEED_DIVISOR: usize = 4;

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let tui = &app.tui;

    let tool = active_tool(tui);
    let tool_panel_height = if tool.is_some() { TOOL_PANEL_HEIGHT } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(tool_panel_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    let (transcript_area, plan_area) = if plan_visible(tui) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(PLAN_PANEL_WIDTH)])
            .split(chunks[0]);
        (columns[0], Some(columns[1]))
    } else {
        (chunks[0], None)
    };

    render_transcript_pane(tui, frame, transcript_area);
    if let Some(plan_area) = plan_area {
        render_plan_panel(tui, frame, plan_area);
    }
    if let Some(tool) = tool {
        render_tool_panel(tui, tool, frame, chunks[1]);
    }
    render_status_line(tui, frame, chunks[2]);
}

/// Transcript pane height for a given terminal height. The reducer uses
/// this in the Frame handler so scroll math matches the rendered layout.
pub fn transcript_viewport_height(tui: &TuiState, terminal_height: u16) -> usize {
    let tool_panel_height = if active_tool(tui).is_some() {
        TOOL_PANEL_HEIGHT
    } else {
        0
    };
    terminal_height.saturating_sub(STATUS_HEIGHT + tool_panel_height) as usize
}

/// Wrap width for transcript content at a given terminal width.
pub fn transcript_content_width(tui: &TuiState, terminal_width: u16) -> usize {
    let pane_width = if plan_visible(tui) {
        terminal_width.saturating_sub(PLAN_PANEL_WIDTH)
    } else {
        terminal_width
    };
    pane_width.saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH) as usize
}

/// The tool the activity panel should show, if any.
fn active_tool(tui: &TuiState) -> Option<&ToolEntry> {
    tui.transcript.state().last_activity_tool()
}

/// Whether the tool panel should carry the live indicator for `tool`.
///
/// Activity that arrived over the stream is live from the moment it was
/// observed, whatever timestamp the event carries. Everything else falls
/// back to the timestamp-based classifier (the only path replay has).
pub fn tool_is_live(tui: &TuiState, tool: &ToolEntry) -> bool {
    if let Some(activity) = tui.live_activity
        && Some(activity.slot) == tui.transcript.state().last_activity_slot()
    {
        return tool.status == ToolCallStatus::Calling
            || tui.classifier.is_recent(activity.observed_at, tui.clock);
    }
    tui.classifier.is_live(tui.transcript.state(), tool, tui.clock)
}

fn plan_visible(tui: &TuiState) -> bool {
    tui.transcript
        .state()
        .plan
        .as_ref()
        .is_some_and(|plan| !plan.steps.is_empty())
}

fn render_transcript_pane(tui: &TuiState, frame: &mut Frame, area: Rect) {
    let content_width = area
        .width
        .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH) as usize;
    let all_lines = transcript::render_lines(tui.transcript.state(), content_width);
    let total_lines = all_lines.len();
    let viewport_height = area.height as usize;

    // Recompute the offset against the freshly rendered line count; the
    // cached count from the Frame handler can lag one frame behind.
    let max_offset = total_lines.saturating_sub(viewport_height);
    let scroll_offset = if tui.transcript.scroll.is_following() {
        max_offset
    } else {
        tui.transcript
            .scroll
            .get_offset(viewport_height)
            .min(max_offset)
    };

    let visible_end = (scroll_offset + viewport_height).min(total_lines);
    let content_lines: Vec<Line<'static>> = all_lines
        .into_iter()
        .skip(scroll_offset)
        .take(visible_end.saturating_sub(scroll_offset))
        .collect();

    // Bottom-align: pad at the top while content is shorter than the pane.
    let visible_lines: Vec<Line<'static>> = if content_lines.len() < viewport_height {
        let padding = viewport_height - content_lines.len();
        let mut padded = vec![Line::default(); padding];
        padded.extend(content_lines);
        padded
    } else {
        content_lines
    };

    // Content is pre-wrapped; no .wrap() or it would wrap twice.
    let paragraph = Paragraph::new(visible_lines).block(Block::default().borders(Borders::NONE));
    let inner = Rect {
        x: area.x + TRANSCRIPT_MARGIN,
        y: area.y,
        width: area
            .width
            .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH),
        height: area.height,
    };
    frame.render_widget(paragraph, inner);
    frame.render_widget(
        Scrollbar::new(total_lines, viewport_height, scroll_offset),
        area,
    );
}

fn render_plan_panel(tui: &TuiState, frame: &mut Frame, area: Rect) {
    let Some(plan) = tui.transcript.state().plan.as_ref() else {
        return;
    };

    let inner_width = area.width.saturating_sub(4) as usize;
    let lines: Vec<Line<'static>> = plan
        .steps
        .iter()
        .map(|step| {
            let (glyph, color) = match step.status.as_deref() {
                Some("completed" | "done") => ("✔", Color::Green),
                Some("running" | "in_progress") => ("▸", Color::Yellow),
                Some("failed") => ("✘", Color::Red),
                _ => ("○", Color::DarkGray),
            };
            Line::from(vec![
                Span::styled(glyph.to_string(), Style::default().fg(color)),
                Span::raw(" "),
                Span::raw(truncate_with_ellipsis(&step.description, inner_width)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" plan ", Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_tool_panel(tui: &TuiState, tool: &ToolEntry, frame: &mut Frame, area: Rect) {
    let name = if tool.function.is_empty() {
        tool.name.clone()
    } else {
        format!("{}.{}", tool.name, tool.function)
    };

    let mut spans = match tool.status {
        ToolCallStatus::Calling => vec![
            Span::styled(spinner(tui), Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled("  running", Style::default().fg(Color::Yellow)),
        ],
        ToolCallStatus::Called => vec![
            Span::styled("✓", Style::default().fg(Color::Green)),
            Span::raw(" "),
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
        ],
    };
    if tool_is_live(tui, tool) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "LIVE",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" tool ", Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_status_line(tui: &TuiState, frame: &mut Frame, area: Rect) {
    let title = tui
        .transcript
        .state()
        .title
        .clone()
        .unwrap_or_else(|| tui.session_id.clone());

    let mut spans: Vec<Span> = match &tui.mode {
        SessionMode::Live { stream } => {
            let mut spans = match stream {
                LiveStream::Connected { .. } if tui.awaiting_first_event => vec![
                    Span::styled(spinner(tui), Style::default().fg(Color::Yellow)),
                    Span::styled(" connecting", Style::default().fg(Color::Yellow)),
                ],
                LiveStream::Connected { .. } => vec![Span::styled(
                    "● LIVE",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )],
                LiveStream::Closed { error: None } => vec![Span::styled(
                    "○ stream ended",
                    Style::default().fg(Color::DarkGray),
                )],
                LiveStream::Closed { error: Some(error) } => vec![Span::styled(
                    format!("○ disconnected: {error}"),
                    Style::default().fg(Color::Red),
                )],
            };
            if tui.transcript.state().loading {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    spinner(tui),
                    Style::default().fg(Color::Cyan),
                ));
                spans.push(Span::styled(
                    " working",
                    Style::default().fg(Color::Cyan),
                ));
            }
            spans
        }
        SessionMode::Replay { files } => {
            let position = tui.replayer.index.map_or(0, |index| index + 1);
            let glyph = if tui.replayer.playing { "▶" } else { "⏸" };
            let mut spans = vec![
                Span::styled(
                    format!("{glyph} {position}/{}", tui.log.len()),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}x", tui.replayer.speed),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if !files.is_empty() {
                spans.push(Span::styled(
                    format!("  · {} files", files.len()),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans
        }
    };

    spans.push(Span::raw("  "));
    spans.push(Span::styled(title, Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw("  "));
    if tui.mode.is_replay() {
        spans.push(Span::styled(
            "space",
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::raw(" play  "));
        spans.push(Span::styled("←/→", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(" step  "));
        spans.push(Span::styled("+/-", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(" speed  "));
    }
    spans.push(Span::styled("q", Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw(" quit"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn spinner(tui: &TuiState) -> &'static str {
    SPINNER_FRAMES[(tui.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()]
}
