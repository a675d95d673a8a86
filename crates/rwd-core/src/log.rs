//! Append-only session event log with exact seek by re-derivation.

use crate::events::SessionEvent;
use crate::transcript::TranscriptState;

/// The ordered list of session events, as received or as recorded.
///
/// Seeking never applies deltas backwards. [`EventLog::replay_to`] resets
/// the transcript and re-folds the whole prefix, so the state at any index
/// is exactly the state a live client would have had at that point.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<SessionEvent>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SessionEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, SessionEvent> {
        self.events.iter()
    }

    /// Rebuilds `state` from scratch up to and including `index`.
    ///
    /// Out-of-range indexes clamp to the last event. Returns the index the
    /// state now reflects, or `None` when the log is empty (the state is
    /// still reset in that case).
    pub fn replay_to(&self, state: &mut TranscriptState, index: usize) -> Option<usize> {
        state.reset();
        if self.events.is_empty() {
            return None;
        }
        let clamped = index.min(self.events.len() - 1);
        for event in &self.events[..=clamped] {
            state.apply(event);
        }
        Some(clamped)
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a SessionEvent;
    type IntoIter = core::slice::Iter<'a, SessionEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
