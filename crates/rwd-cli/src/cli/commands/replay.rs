//! Replay command handler: fetch the recorded log, then hand off to the TUI.

use anyhow::{Context, Result};
use rwd_core::config::Config;
use rwd_core::session::SessionClient;

pub async fn run(config: &Config, session_id: &str) -> Result<()> {
    let client = SessionClient::new(config.base_url()?);
    let session = client
        .fetch_replay(session_id)
        .await
        .with_context(|| format!("fetch replay for session '{session_id}'"))?;
    tracing::info!(
        session_id,
        events = session.events.len(),
        "opening replay"
    );
    rwd_tui::run_replay(config, session)
}
