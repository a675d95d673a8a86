//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer stays pure: it mutates state and describes I/O as effects,
//! never spawns tasks itself.
//!
//! The playback timer is the only spawned task. The runtime keeps at most
//! one alive: `StartPlayback` cancels any existing timer before creating
//! the next one, and `StopPlayback` on a stopped timer is a no-op.

use std::time::Duration;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEffect {
    /// Quit the application.
    Quit,

    /// (Re)start the repeating playback timer with the given period.
    StartPlayback { period: Duration },

    /// Cancel the playback timer if one is running.
    StopPlayback,
}
