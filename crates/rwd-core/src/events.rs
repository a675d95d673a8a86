//! Session event types shared by the live stream and recorded replays.
//!
//! This module defines the contract for events emitted by the agent backend.
//! Events arrive either over SSE (live) or inside a bulk replay payload, and
//! are folded into a transcript by [`crate::transcript::TranscriptState`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record in the ordered session event log.
///
/// The tag set is closed; kinds introduced by future backend versions
/// deserialize into [`SessionEvent::Unknown`] and are ignored by the reducer
/// so a new server never breaks an old client mid-stream.
///
/// Every variant carries `event_id`, a monotonic cursor assigned by the
/// backend. It is echoed as the SSE `id:` field and usable as a resume
/// cursor; the reducer itself never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A chat message from the user or the assistant.
    Message {
        role: String,
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attachments: Vec<Attachment>,
        event_id: u64,
        timestamp: i64,
    },

    /// A tool invocation update. Two events sharing `tool_call_id` describe
    /// the same invocation (typically `calling` followed by `called`).
    Tool {
        tool_call_id: String,
        name: String,
        status: ToolCallStatus,
        #[serde(default)]
        function: String,
        #[serde(default)]
        args: Value,
        #[serde(default)]
        content: Value,
        timestamp: i64,
        event_id: u64,
    },

    /// An execution phase transition.
    Step {
        status: StepStatus,
        event_id: u64,
    },

    /// A whole-value snapshot of the agent's stated plan.
    Plan {
        #[serde(default)]
        steps: Vec<PlanStep>,
        event_id: u64,
    },

    /// The session title (re)assigned by the backend.
    Title {
        title: String,
        event_id: u64,
    },

    /// A non-fatal execution error surfaced to the user.
    Error {
        error: String,
        timestamp: i64,
        event_id: u64,
    },

    /// The session finished. Extension point; currently a no-op.
    Done { event_id: u64 },

    /// The agent is waiting for user input. Extension point; currently a no-op.
    Wait { event_id: u64 },

    /// Any kind this client does not recognize. Never an error.
    #[serde(other)]
    Unknown,
}

impl SessionEvent {
    /// Returns the resume cursor for this event, if it carries one.
    pub fn event_id(&self) -> Option<u64> {
        match self {
            SessionEvent::Message { event_id, .. }
            | SessionEvent::Tool { event_id, .. }
            | SessionEvent::Step { event_id, .. }
            | SessionEvent::Plan { event_id, .. }
            | SessionEvent::Title { event_id, .. }
            | SessionEvent::Error { event_id, .. }
            | SessionEvent::Done { event_id }
            | SessionEvent::Wait { event_id } => Some(*event_id),
            SessionEvent::Unknown => None,
        }
    }
}

/// Status of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// The call has been issued; output not yet available.
    Calling,
    /// The call has finished and `content` holds its output.
    Called,
}

/// Status of an execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Running,
    Completed,
    Failed,
}

/// A file referenced by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// One entry of a plan snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// The latest whole-value plan snapshot (last writer wins).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

/// Metadata for a file attached to a recorded session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_event_roundtrip() {
        let raw = json!({
            "type": "message",
            "role": "assistant",
            "content": "hello",
            "event_id": 3,
            "timestamp": 1_700_000_000,
        });
        let event: SessionEvent = serde_json::from_value(raw).unwrap();
        match &event {
            SessionEvent::Message {
                role,
                content,
                attachments,
                ..
            } => {
                assert_eq!(role, "assistant");
                assert_eq!(content, "hello");
                assert!(attachments.is_empty());
            }
            other => panic!("expected message, got {other:?}"),
        }
        assert_eq!(event.event_id(), Some(3));
    }

    #[test]
    fn tool_event_defaults_optional_fields() {
        let raw = json!({
            "type": "tool",
            "tool_call_id": "t1",
            "name": "browser",
            "status": "calling",
            "timestamp": 1_700_000_000,
            "event_id": 7,
        });
        let event: SessionEvent = serde_json::from_value(raw).unwrap();
        match event {
            SessionEvent::Tool {
                function,
                args,
                content,
                status,
                ..
            } => {
                assert!(function.is_empty());
                assert_eq!(args, Value::Null);
                assert_eq!(content, Value::Null);
                assert_eq!(status, ToolCallStatus::Calling);
            }
            other => panic!("expected tool, got {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_deserializes_without_error() {
        let raw = json!({ "type": "telemetry", "event_id": 9, "payload": {"x": 1} });
        let event: SessionEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event, SessionEvent::Unknown);
        assert_eq!(event.event_id(), None);
    }

    #[test]
    fn step_status_wire_names() {
        for (raw, expected) in [
            ("running", StepStatus::Running),
            ("completed", StepStatus::Completed),
            ("failed", StepStatus::Failed),
        ] {
            let event: SessionEvent =
                serde_json::from_value(json!({ "type": "step", "status": raw, "event_id": 1 }))
                    .unwrap();
            assert_eq!(
                event,
                SessionEvent::Step {
                    status: expected,
                    event_id: 1
                }
            );
        }
    }
}
