//! Transcript reducer: folds ordered session events into renderable state.
//!
//! `TranscriptState` is the single owner of the derived conversation. The
//! only mutation API is [`TranscriptState::apply`] and
//! [`TranscriptState::reset`]; consumers read entries and react to the
//! signals returned from `apply`. Applying the same log prefix to a freshly
//! reset state always yields an identical result, which is what makes
//! full-log replay (see [`crate::log::EventLog::replay_to`]) exact.
//!
//! The reducer never reorders, deduplicates, or rejects events. Callers own
//! exactly-once in-order delivery; re-applying an event duplicates entries.

use serde_json::Value;

use crate::events::{Attachment, Plan, SessionEvent, StepStatus, ToolCallStatus};

/// One renderable transcript entry, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Message(MessageEntry),
    Attachments(AttachmentsEntry),
    Step(StepEntry),
    Tool(ToolEntry),
}

/// A chat message entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEntry {
    pub role: String,
    pub content: String,
    pub timestamp: i64,
}

/// Files that accompanied a message, kept as a separate entry directly
/// after it so the render layer can lay them out independently.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentsEntry {
    pub role: String,
    pub attachments: Vec<Attachment>,
}

/// An execution step grouping the tool calls issued while it ran.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntry {
    pub status: StepStatus,
    pub tools: Vec<ToolEntry>,
}

/// One tool invocation, identified by `tool_call_id` and mutable in place
/// until a tool event with a different id supersedes it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEntry {
    pub tool_call_id: String,
    pub name: String,
    pub status: ToolCallStatus,
    pub function: String,
    pub args: Value,
    pub content: Value,
    pub timestamp: i64,
}

/// Stable address of a tool entry inside the transcript.
///
/// Entries are append-only, so an index path taken at creation time stays
/// valid for the life of the state. This is how "all holders observe the
/// in-place update" works without shared mutable references: holders keep
/// the slot, not the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSlot {
    /// Standalone entry at `entries[index]`.
    Entry(usize),
    /// Nested entry at `entries[entry].tools[tool]`.
    StepTool { entry: usize, tool: usize },
}

/// Side-effect signals returned from [`TranscriptState::apply`].
///
/// The reducer stays pure: it mutates only its own state and describes
/// everything else as a signal. Live consumers act on them; replay
/// re-derivation drops them (panel state is re-read from the pointers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptSignal {
    /// A new top-level entry was appended.
    EntryAppended,
    /// A non-"message" tool was created or updated; the UI should surface
    /// it in the tool panel.
    ToolActivity { slot: ToolSlot },
}

/// Conversation state derived from the event log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptState {
    entries: Vec<TranscriptEntry>,
    pub plan: Option<Plan>,
    pub title: Option<String>,
    /// The single live mutable tool reference; a tool event matching its
    /// id overwrites that entry instead of creating a new one.
    last_tool: Option<ToolSlot>,
    /// Most recent tool whose name is not "message"; drives the tool panel.
    last_activity_tool: Option<ToolSlot>,
    /// True while the session is waiting on the agent. Cleared by `error`
    /// events and by `step(failed)`.
    pub loading: bool,
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all derived state back to the empty initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn last_tool_slot(&self) -> Option<ToolSlot> {
        self.last_tool
    }

    pub fn last_activity_slot(&self) -> Option<ToolSlot> {
        self.last_activity_tool
    }

    /// Resolves a slot to its tool entry.
    pub fn tool(&self, slot: ToolSlot) -> Option<&ToolEntry> {
        match slot {
            ToolSlot::Entry(index) => match self.entries.get(index)? {
                TranscriptEntry::Tool(tool) => Some(tool),
                _ => None,
            },
            ToolSlot::StepTool { entry, tool } => match self.entries.get(entry)? {
                TranscriptEntry::Step(step) => step.tools.get(tool),
                _ => None,
            },
        }
    }

    fn tool_mut(&mut self, slot: ToolSlot) -> Option<&mut ToolEntry> {
        match slot {
            ToolSlot::Entry(index) => match self.entries.get_mut(index)? {
                TranscriptEntry::Tool(tool) => Some(tool),
                _ => None,
            },
            ToolSlot::StepTool { entry, tool } => match self.entries.get_mut(entry)? {
                TranscriptEntry::Step(step) => step.tools.get_mut(tool),
                _ => None,
            },
        }
    }

    /// The most recent non-"message" tool, if any.
    pub fn last_activity_tool(&self) -> Option<&ToolEntry> {
        self.tool(self.last_activity_tool?)
    }

    /// Folds one event into the state.
    ///
    /// Infallible by contract: unknown kinds and lifecycle edge cases
    /// (e.g. `step(completed)` with no step) are no-ops, never errors, so
    /// one bad event can never stall the rest of the stream.
    pub fn apply(&mut self, event: &SessionEvent) -> Vec<TranscriptSignal> {
        match event {
            SessionEvent::Message {
                role,
                content,
                attachments,
                timestamp,
                ..
            } => {
                let mut signals = Vec::new();
                self.entries.push(TranscriptEntry::Message(MessageEntry {
                    role: role.clone(),
                    content: content.clone(),
                    timestamp: *timestamp,
                }));
                signals.push(TranscriptSignal::EntryAppended);
                if !attachments.is_empty() {
                    self.entries
                        .push(TranscriptEntry::Attachments(AttachmentsEntry {
                            role: role.clone(),
                            attachments: attachments.clone(),
                        }));
                    signals.push(TranscriptSignal::EntryAppended);
                }
                signals
            }
            SessionEvent::Tool {
                tool_call_id,
                name,
                status,
                function,
                args,
                content,
                timestamp,
                ..
            } => {
                let incoming = ToolEntry {
                    tool_call_id: tool_call_id.clone(),
                    name: name.clone(),
                    status: *status,
                    function: function.clone(),
                    args: args.clone(),
                    content: content.clone(),
                    timestamp: *timestamp,
                };
                let (slot, is_new) = self.merge_tool(incoming);
                let mut signals = Vec::new();
                if is_new && matches!(slot, ToolSlot::Entry(_)) {
                    signals.push(TranscriptSignal::EntryAppended);
                }
                if name != "message" {
                    self.last_activity_tool = Some(slot);
                    signals.push(TranscriptSignal::ToolActivity { slot });
                }
                signals
            }
            SessionEvent::Step { status, .. } => self.apply_step(*status),
            SessionEvent::Plan { steps, .. } => {
                self.plan = Some(Plan {
                    steps: steps.clone(),
                });
                vec![]
            }
            SessionEvent::Title { title, .. } => {
                self.title = Some(title.clone());
                vec![]
            }
            SessionEvent::Error {
                error, timestamp, ..
            } => {
                self.entries.push(TranscriptEntry::Message(MessageEntry {
                    role: "assistant".to_string(),
                    content: error.clone(),
                    timestamp: *timestamp,
                }));
                self.loading = false;
                vec![TranscriptSignal::EntryAppended]
            }
            // Explicit extension points; must not error.
            SessionEvent::Done { .. } | SessionEvent::Wait { .. } | SessionEvent::Unknown => {
                vec![]
            }
        }
    }

    fn apply_step(&mut self, status: StepStatus) -> Vec<TranscriptSignal> {
        match status {
            StepStatus::Running => {
                self.entries.push(TranscriptEntry::Step(StepEntry {
                    status: StepStatus::Running,
                    tools: Vec::new(),
                }));
                vec![TranscriptSignal::EntryAppended]
            }
            StepStatus::Completed => {
                // Mutates the most recently created step; no-op when none exists.
                if let Some(step) = self.last_step_mut() {
                    step.status = StepStatus::Completed;
                }
                vec![]
            }
            StepStatus::Failed => {
                // Intentionally does NOT touch any step's stored status;
                // only the loading flag is cleared. Matches the backend's
                // observed behavior even though it looks asymmetric.
                self.loading = false;
                vec![]
            }
        }
    }

    /// Resolves whether an incoming tool event updates the tracked live
    /// entry or creates a new one, and where the new one lands.
    fn merge_tool(&mut self, incoming: ToolEntry) -> (ToolSlot, bool) {
        if let Some(slot) = self.last_tool
            && let Some(existing) = self.tool_mut(slot)
            && existing.tool_call_id == incoming.tool_call_id
        {
            // Same invocation: overwrite fields in place. Holders of the
            // slot observe the update; no new entry is created.
            *existing = incoming;
            return (slot, false);
        }

        // New invocation. Nest under the most recent step only while that
        // step is still running; otherwise it is a standalone entry.
        let step_index = self
            .entries
            .iter()
            .rposition(|entry| matches!(entry, TranscriptEntry::Step(_)));
        let slot = match step_index {
            Some(index)
                if matches!(
                    &self.entries[index],
                    TranscriptEntry::Step(step) if step.status == StepStatus::Running
                ) =>
            {
                let TranscriptEntry::Step(step) = &mut self.entries[index] else {
                    unreachable!("index points at a step entry");
                };
                step.tools.push(incoming);
                ToolSlot::StepTool {
                    entry: index,
                    tool: step.tools.len() - 1,
                }
            }
            _ => {
                self.entries.push(TranscriptEntry::Tool(incoming));
                ToolSlot::Entry(self.entries.len() - 1)
            }
        };
        self.last_tool = Some(slot);
        (slot, true)
    }

    fn last_step_mut(&mut self) -> Option<&mut StepEntry> {
        self.entries.iter_mut().rev().find_map(|entry| match entry {
            TranscriptEntry::Step(step) => Some(step),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(role: &str, content: &str, event_id: u64) -> SessionEvent {
        SessionEvent::Message {
            role: role.to_string(),
            content: content.to_string(),
            attachments: Vec::new(),
            event_id,
            timestamp: 1_700_000_000,
        }
    }

    fn step(status: StepStatus, event_id: u64) -> SessionEvent {
        SessionEvent::Step { status, event_id }
    }

    fn tool(id: &str, name: &str, status: ToolCallStatus, content: Value) -> SessionEvent {
        SessionEvent::Tool {
            tool_call_id: id.to_string(),
            name: name.to_string(),
            status,
            function: String::new(),
            args: Value::Null,
            content,
            timestamp: 1_700_000_000,
            event_id: 0,
        }
    }

    #[test]
    fn message_appends_entry() {
        let mut state = TranscriptState::new();
        let signals = state.apply(&message("user", "hi", 1));
        assert_eq!(signals, vec![TranscriptSignal::EntryAppended]);
        assert_eq!(state.entries().len(), 1);
    }

    #[test]
    fn message_with_attachments_appends_two_entries_in_order() {
        // Scenario B: the message entry, then a separate attachments entry.
        let mut state = TranscriptState::new();
        state.apply(&SessionEvent::Message {
            role: "assistant".to_string(),
            content: "see file".to_string(),
            attachments: vec![Attachment {
                file_id: "f1".to_string(),
                filename: None,
                size: None,
            }],
            event_id: 1,
            timestamp: 0,
        });
        assert_eq!(state.entries().len(), 2);
        assert!(matches!(state.entries()[0], TranscriptEntry::Message(_)));
        match &state.entries()[1] {
            TranscriptEntry::Attachments(entry) => {
                assert_eq!(entry.attachments[0].file_id, "f1");
            }
            other => panic!("expected attachments entry, got {other:?}"),
        }
    }

    #[test]
    fn tool_events_with_same_id_collapse_into_one_entry() {
        let mut state = TranscriptState::new();
        state.apply(&tool("t1", "browser", ToolCallStatus::Calling, Value::Null));
        state.apply(&tool("t1", "browser", ToolCallStatus::Called, json!("out")));
        assert_eq!(state.entries().len(), 1);
        let slot = state.last_tool_slot().unwrap();
        let entry = state.tool(slot).unwrap();
        assert_eq!(entry.status, ToolCallStatus::Called);
        assert_eq!(entry.content, json!("out"));
    }

    #[test]
    fn tool_event_with_new_id_creates_new_entry_and_repoints() {
        let mut state = TranscriptState::new();
        state.apply(&tool("t1", "browser", ToolCallStatus::Called, Value::Null));
        state.apply(&tool("t2", "shell", ToolCallStatus::Calling, Value::Null));
        assert_eq!(state.entries().len(), 2);
        let entry = state.tool(state.last_tool_slot().unwrap()).unwrap();
        assert_eq!(entry.tool_call_id, "t2");
    }

    #[test]
    fn tool_nests_under_running_step_but_not_completed_step() {
        let mut state = TranscriptState::new();
        state.apply(&step(StepStatus::Running, 1));
        state.apply(&tool("t1", "shell", ToolCallStatus::Called, Value::Null));
        state.apply(&step(StepStatus::Completed, 2));
        state.apply(&tool("t2", "shell", ToolCallStatus::Called, Value::Null));

        // t1 nested, t2 standalone after the step completed.
        assert_eq!(state.entries().len(), 2);
        match &state.entries()[0] {
            TranscriptEntry::Step(step) => {
                assert_eq!(step.tools.len(), 1);
                assert_eq!(step.tools[0].tool_call_id, "t1");
            }
            other => panic!("expected step, got {other:?}"),
        }
        match &state.entries()[1] {
            TranscriptEntry::Tool(entry) => assert_eq!(entry.tool_call_id, "t2"),
            other => panic!("expected standalone tool, got {other:?}"),
        }
    }

    #[test]
    fn scenario_a_step_with_merged_tool() {
        let mut state = TranscriptState::new();
        state.apply(&step(StepStatus::Running, 1));
        state.apply(&tool("t1", "shell", ToolCallStatus::Calling, Value::Null));
        state.apply(&tool("t1", "shell", ToolCallStatus::Called, json!("x")));
        state.apply(&step(StepStatus::Completed, 2));

        assert_eq!(state.entries().len(), 1);
        match &state.entries()[0] {
            TranscriptEntry::Step(step) => {
                assert_eq!(step.status, StepStatus::Completed);
                assert_eq!(step.tools.len(), 1);
                assert_eq!(step.tools[0].tool_call_id, "t1");
                assert_eq!(step.tools[0].content, json!("x"));
            }
            other => panic!("expected step, got {other:?}"),
        }
    }

    #[test]
    fn scenario_d_failed_step_keeps_status_but_clears_loading() {
        let mut state = TranscriptState::new();
        state.loading = true;
        state.apply(&step(StepStatus::Running, 1));
        state.apply(&step(StepStatus::Failed, 2));

        // The stored step status is untouched; only the flag clears. This
        // documents the backend's behavior as observed, not as one might
        // expect it to be.
        match &state.entries()[0] {
            TranscriptEntry::Step(step) => assert_eq!(step.status, StepStatus::Running),
            other => panic!("expected step, got {other:?}"),
        }
        assert!(!state.loading);
    }

    #[test]
    fn step_completed_without_step_is_a_noop() {
        let mut state = TranscriptState::new();
        let signals = state.apply(&step(StepStatus::Completed, 1));
        assert!(signals.is_empty());
        assert!(state.entries().is_empty());
    }

    #[test]
    fn plan_snapshots_are_last_writer_wins() {
        let mut state = TranscriptState::new();
        state.apply(&SessionEvent::Plan {
            steps: vec![PlanStepFixture::step("a")],
            event_id: 1,
        });
        state.apply(&SessionEvent::Plan {
            steps: vec![PlanStepFixture::step("b"), PlanStepFixture::step("c")],
            event_id: 2,
        });
        let plan = state.plan.as_ref().unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].description, "b");
    }

    #[test]
    fn error_event_appends_assistant_message_and_clears_loading() {
        let mut state = TranscriptState::new();
        state.loading = true;
        state.apply(&SessionEvent::Error {
            error: "backend exploded".to_string(),
            timestamp: 1_700_000_123,
            event_id: 1,
        });
        assert!(!state.loading);
        match &state.entries()[0] {
            TranscriptEntry::Message(entry) => {
                assert_eq!(entry.role, "assistant");
                assert_eq!(entry.content, "backend exploded");
                assert_eq!(entry.timestamp, 1_700_000_123);
            }
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn message_tool_does_not_become_activity_tool() {
        let mut state = TranscriptState::new();
        state.apply(&tool("t1", "message", ToolCallStatus::Called, Value::Null));
        assert!(state.last_activity_slot().is_none());
        let signals = state.apply(&tool("t2", "search", ToolCallStatus::Calling, Value::Null));
        assert!(
            signals
                .iter()
                .any(|signal| matches!(signal, TranscriptSignal::ToolActivity { .. }))
        );
        assert_eq!(
            state.last_activity_tool().unwrap().tool_call_id,
            "t2".to_string()
        );
    }

    #[test]
    fn noop_kinds_and_unknown_do_not_disturb_state() {
        let mut state = TranscriptState::new();
        state.apply(&message("user", "hi", 1));
        let before = state.clone();
        state.apply(&SessionEvent::Done { event_id: 2 });
        state.apply(&SessionEvent::Wait { event_id: 3 });
        state.apply(&SessionEvent::Unknown);
        assert_eq!(state, before);
    }

    #[test]
    fn reapplying_an_event_duplicates_by_design() {
        let mut state = TranscriptState::new();
        let event = message("user", "hi", 1);
        state.apply(&event);
        state.apply(&event);
        assert_eq!(state.entries().len(), 2);
    }

    struct PlanStepFixture;

    impl PlanStepFixture {
        fn step(description: &str) -> crate::events::PlanStep {
            crate::events::PlanStep {
                id: None,
                description: description.to_string(),
                status: None,
            }
        }
    }
}
