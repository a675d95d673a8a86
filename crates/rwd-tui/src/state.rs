//! Application state composition.
//!
//! ```text
//! AppState
//! └── tui: TuiState
//!     ├── mode: SessionMode          (live stream or recorded replay)
//!     ├── log: EventLog              (ordered session events)
//!     ├── transcript: TranscriptView (derived state + scroll)
//!     ├── replayer: ReplayerState    (index, playing, speed)
//!     └── classifier: LiveWindowClassifier
//! ```
//!
//! The runtime's event loop is the only mutator of `AppState`; everything
//! async reaches it through events.

use rwd_core::config::Config;
use rwd_core::events::FileInfo;
use rwd_core::live::LiveWindowClassifier;
use rwd_core::log::EventLog;
use rwd_core::session::{RecordedSession, StreamItem};
use rwd_core::transcript::ToolSlot;
use tokio::sync::mpsc;

use crate::replay::{self, ReplayerState};
use crate::transcript::TranscriptView;

/// Top-level application state for the TUI.
pub struct AppState {
    pub tui: TuiState,
}

impl AppState {
    /// State for a live session fed by an SSE subscription.
    pub fn live(
        config: Config,
        session_id: String,
        rx: mpsc::UnboundedReceiver<StreamItem>,
    ) -> Self {
        let classifier = LiveWindowClassifier::new(config.live_window_secs);
        Self {
            tui: TuiState {
                should_quit: false,
                session_id,
                mode: SessionMode::Live {
                    stream: LiveStream::Connected { rx },
                },
                log: EventLog::new(),
                transcript: TranscriptView::new(),
                replayer: ReplayerState::new(config.replay.speed),
                classifier,
                live_activity: None,
                awaiting_first_event: true,
                spinner_frame: 0,
                clock: chrono::Utc::now().timestamp(),
                config,
            },
        }
    }

    /// State for a recorded session. The transcript starts fully derived
    /// (index at the last event) so the whole conversation is visible.
    pub fn replay(config: Config, session: RecordedSession) -> Self {
        let classifier = LiveWindowClassifier::new(config.live_window_secs);
        let log = EventLog::from_events(session.events);
        let mut transcript = TranscriptView::new();
        let mut replayer = ReplayerState::new(config.replay.speed);
        replayer.index = log.replay_to(transcript.state_mut(), log.len().saturating_sub(1));
        let clock = replay::latest_timestamp(&log, replayer.index).unwrap_or(0);
        Self {
            tui: TuiState {
                should_quit: false,
                session_id: session.session_id,
                mode: SessionMode::Replay {
                    files: session.files,
                },
                log,
                transcript,
                replayer,
                classifier,
                live_activity: None,
                awaiting_first_event: false,
                spinner_frame: 0,
                clock,
                config,
            },
        }
    }
}

/// Where the event log comes from.
pub enum SessionMode {
    /// Events arrive over SSE and are appended as they come.
    Live { stream: LiveStream },
    /// The whole log was fetched up front; the replayer drives the index.
    Replay { files: Vec<FileInfo> },
}

impl SessionMode {
    pub fn is_replay(&self) -> bool {
        matches!(self, SessionMode::Replay { .. })
    }
}

/// Live subscription state. `Closed` keeps the final error (if any) for
/// the status line.
pub enum LiveStream {
    Connected {
        rx: mpsc::UnboundedReceiver<StreamItem>,
    },
    Closed {
        error: Option<String>,
    },
}

/// TUI application state.
pub struct TuiState {
    /// Flag indicating the app should quit.
    pub should_quit: bool,
    /// The session being viewed.
    pub session_id: String,
    /// Live stream or recorded replay.
    pub mode: SessionMode,
    /// The ordered event log (appended live, or fetched whole).
    pub log: EventLog,
    /// Derived transcript plus viewport/scroll state.
    pub transcript: TranscriptView,
    /// Replay transport state (inert in live mode).
    pub replayer: ReplayerState,
    /// Decides whether the latest tool call still counts as live activity.
    pub classifier: LiveWindowClassifier,
    /// Tool activity that arrived over the live stream. Set only by the
    /// stream path, never by replay re-derivation.
    pub live_activity: Option<LiveActivity>,
    /// True from attach until the first stream item arrives.
    pub awaiting_first_event: bool,
    /// Spinner animation frame counter.
    pub spinner_frame: usize,
    /// Epoch seconds used for liveness checks. Wall clock in live mode;
    /// the latest applied event timestamp in replay mode, so a replayed
    /// frame shows what a live viewer would have seen at that moment.
    pub clock: i64,
    /// Loaded configuration.
    pub config: Config,
}

/// A tool activity signal observed on the live stream.
///
/// Carries the wall-clock second it arrived, not the event's own
/// timestamp. A resumed stream (`Last-Event-ID`) can deliver events whose
/// timestamps are minutes old; the viewer still just watched them happen,
/// so liveness counts from arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveActivity {
    pub slot: ToolSlot,
    pub observed_at: i64,
}

impl TuiState {
    /// True while the live stream is connected.
    pub fn is_connected(&self) -> bool {
        matches!(
            self.mode,
            SessionMode::Live {
                stream: LiveStream::Connected { .. }
            }
        )
    }
}
