//! Full-screen TUI for rwd: live session view and time-travel replay.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use features::{replay, transcript};
pub use runtime::TuiRuntime;
use rwd_core::config::Config;
use rwd_core::session::{RecordedSession, SessionClient, subscribe};

use crate::state::AppState;

/// Attaches to a live session and runs the TUI until the user quits.
pub async fn run_live(config: &Config, session_id: &str) -> Result<()> {
    ensure_terminal()?;

    let client = SessionClient::new(config.base_url()?);
    let rx = subscribe(&client, session_id, None).await?;

    // Pre-TUI info goes to stderr; the alternate screen replaces it.
    let mut err = stderr();
    writeln!(err, "rwd: attached to session {session_id}")?;
    writeln!(err, "Backend: {}", client.base_url())?;
    err.flush()?;

    let state = AppState::live(config.clone(), session_id.to_string(), rx);
    let mut runtime = TuiRuntime::new(state)?;
    runtime.run()
}

/// Opens a recorded session in replay mode and runs the TUI until the user
/// quits. Must be called from within a tokio runtime (playback timers spawn
/// tasks).
pub fn run_replay(config: &Config, session: RecordedSession) -> Result<()> {
    ensure_terminal()?;

    let state = AppState::replay(config.clone(), session);
    let mut runtime = TuiRuntime::new(state)?;
    runtime.run()
}

fn ensure_terminal() -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "rwd needs a terminal to render.\n\
             Use `rwd sessions list` for non-interactive output."
        );
    }
    Ok(())
}
