//! UI event types.
//!
//! All inputs to the TUI are converted to [`UiEvent`] before being processed
//! by the reducer. Async sources (the SSE pump, the playback timer) send
//! events into the runtime's inbox channel, which is drained once per frame.

use crossterm::event::Event as CrosstermEvent;
use rwd_core::session::StreamItem;

/// Unified event enum for the TUI.
#[derive(Debug)]
pub enum UiEvent {
    /// Timer tick (animation, clock refresh).
    Tick,

    /// Emitted once per loop iteration before other events, carrying the
    /// current terminal size. Layout and scroll coalescing happen here.
    Frame { width: u16, height: u16 },

    /// Terminal input event (key, mouse, resize).
    Terminal(CrosstermEvent),

    /// An item from the live SSE subscription: a parsed session event or
    /// the stream-closed marker.
    Stream(StreamItem),

    /// The playback timer fired; replay should advance one event.
    PlaybackTick,
}
