//! Session inspection for non-interactive use.

use std::fmt::Write;

use anyhow::{Context, Result};
use rwd_core::config::Config;
use rwd_core::events::{StepStatus, ToolCallStatus};
use rwd_core::session::{RecordedSession, SessionClient, SessionSummary};
use rwd_core::transcript::{ToolEntry, TranscriptEntry, TranscriptState};

pub async fn list(config: &Config) -> Result<()> {
    let client = SessionClient::new(config.base_url()?);
    let sessions = client.list_sessions().await?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp();
    for summary in &sessions {
        println!("{}", format_row(summary, now));
    }
    Ok(())
}

/// Prints a recorded session as plain text: header, then the transcript
/// derived the same way the TUI derives it.
pub async fn show(config: &Config, session_id: &str) -> Result<()> {
    let client = SessionClient::new(config.base_url()?);
    let session = client
        .fetch_replay(session_id)
        .await
        .with_context(|| format!("fetch session '{session_id}'"))?;
    print!("{}", render_session(&session));
    Ok(())
}

fn render_session(session: &RecordedSession) -> String {
    let mut out = String::new();
    let title = session.title.as_deref().unwrap_or("(untitled)");
    let _ = writeln!(out, "{}  {}", session.session_id, title);
    let _ = writeln!(out, "{} events", session.events.len());
    if !session.files.is_empty() {
        let _ = writeln!(out, "{} files", session.files.len());
    }
    let _ = writeln!(out);

    let mut state = TranscriptState::new();
    for event in &session.events {
        state.apply(event);
    }
    for entry in state.entries() {
        match entry {
            TranscriptEntry::Message(message) => {
                let _ = writeln!(out, "{}> {}", message.role, message.content);
            }
            TranscriptEntry::Attachments(attachments) => {
                for attachment in &attachments.attachments {
                    let name = attachment
                        .filename
                        .as_deref()
                        .unwrap_or(&attachment.file_id);
                    let _ = writeln!(out, "  [file] {name}");
                }
            }
            TranscriptEntry::Step(step) => {
                let status = match step.status {
                    StepStatus::Running => "running",
                    StepStatus::Completed => "completed",
                    StepStatus::Failed => "failed",
                };
                let _ = writeln!(out, "step {status}");
                for tool in &step.tools {
                    let _ = writeln!(out, "  {}", tool_summary(tool));
                }
            }
            TranscriptEntry::Tool(tool) => {
                let _ = writeln!(out, "{}", tool_summary(tool));
            }
        }
    }
    out
}

fn tool_summary(tool: &ToolEntry) -> String {
    let marker = match tool.status {
        ToolCallStatus::Calling => "...",
        ToolCallStatus::Called => "ok ",
    };
    if tool.function.is_empty() {
        format!("[{marker}] {}", tool.name)
    } else {
        format!("[{marker}] {}.{}", tool.name, tool.function)
    }
}

fn format_row(summary: &SessionSummary, now: i64) -> String {
    let title = summary.title.as_deref().unwrap_or("(untitled)");
    let mut row = format!("{}  {}", summary.session_id, title);
    if let Some(status) = summary.status.as_deref() {
        row.push_str(&format!("  [{status}]"));
    }
    if let Some(at) = summary.latest_message_at {
        row.push_str(&format!("  {}", format_age(at, now)));
    }
    if summary.unread_message_count > 0 {
        row.push_str(&format!("  · {} unread", summary.unread_message_count));
    }
    row
}

fn format_age(timestamp: i64, now: i64) -> String {
    let secs = (now - timestamp).max(0);
    if secs < 60 {
        format!("{secs}s ago")
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format!("{}d ago", secs / 86400)
    }
}
