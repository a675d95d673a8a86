//! Decides whether a tool invocation should render as "live".
//!
//! Live means the tool panel shows the invocation with an activity
//! indicator rather than as a settled historical record.

use crate::events::ToolCallStatus;
use crate::transcript::{ToolEntry, TranscriptState};

/// Default recency window in seconds for a completed tool to still count
/// as live activity.
pub const LIVE_WINDOW_SECS: i64 = 300;

/// Classifies tool entries as live or settled.
#[derive(Debug, Clone, Copy)]
pub struct LiveWindowClassifier {
    window_secs: i64,
}

impl Default for LiveWindowClassifier {
    fn default() -> Self {
        Self {
            window_secs: LIVE_WINDOW_SECS,
        }
    }
}

impl LiveWindowClassifier {
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    /// Returns true when `tool` should be rendered as live at `now`
    /// (epoch seconds).
    ///
    /// An in-flight call is always live regardless of age. A finished call
    /// is live only while it is the most recent non-"message" tool in the
    /// transcript and its timestamp falls within the recency window.
    pub fn is_live(&self, state: &TranscriptState, tool: &ToolEntry, now: i64) -> bool {
        if tool.status == ToolCallStatus::Calling {
            return true;
        }
        let Some(latest) = state.last_activity_tool() else {
            return false;
        };
        latest.tool_call_id == tool.tool_call_id && self.is_recent(tool.timestamp, now)
    }

    /// True while `timestamp` is strictly inside the recency window at
    /// `now`. The boundary is exclusive: exactly `window_secs` later the
    /// activity has settled.
    pub fn is_recent(&self, timestamp: i64, now: i64) -> bool {
        now.saturating_sub(timestamp) < self.window_secs
    }
}
