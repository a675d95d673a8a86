//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the boundary where side effects happen. The reducer stays pure
//! and produces effects; this module executes them.
//!
//! Async sources (the playback timer) send events into an inbox channel
//! that the runtime drains once per loop iteration. The live SSE stream
//! keeps its dedicated channel and is drained the same way.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, LiveStream, SessionMode};
use crate::{render, terminal, update};

/// Target frame interval while something is moving (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll interval when nothing is streaming, playing, or being typed.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

type UiEventSender = mpsc::UnboundedSender<UiEvent>;
type UiEventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Full-screen TUI runtime.
///
/// Owns the terminal and state. Terminal state is restored on drop, panic,
/// and Ctrl+C.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    /// Async sources send events here.
    inbox_tx: UiEventSender,
    /// Drained once per loop iteration.
    inbox_rx: UiEventReceiver,
    /// Cancellation token of the running playback timer, if any.
    playback: Option<CancellationToken>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Creates the runtime and takes over the terminal.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new(state: AppState) -> Result<Self> {
        // The hook must be in place before entering the alternate screen.
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            inbox_tx,
            inbox_rx,
            playback: None,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the main event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if terminal I/O fails.
    pub fn run(&mut self) -> Result<()> {
        terminal::enable_input_features()?;

        let result = self.event_loop();

        let _ = terminal::disable_input_features();

        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.tui.should_quit {
            let mut events = self.collect_events()?;

            // Frame goes first so layout and scroll coalescing settle
            // before this iteration's input is processed.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }

                // Only Tick renders; everything else batches to the next
                // tick, which caps the frame rate at the tick cadence.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }

                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects events from the stream, the inbox, and the terminal.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let tui = &self.state.tui;
        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let needs_fast_poll = tui.is_connected()
            || tui.replayer.playing
            || tui.awaiting_first_event
            || recent_terminal_activity;
        let tick_interval = if needs_fast_poll {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_stream_events(&mut events);
        while let Ok(event) = self.inbox_rx.try_recv() {
            events.push(event);
        }

        // Block on the terminal until the next tick is due, unless there is
        // already work queued.
        let time_until_tick = tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    /// Drains everything the SSE pump has buffered since the last loop.
    fn collect_stream_events(&mut self, events: &mut Vec<UiEvent>) {
        let SessionMode::Live {
            stream: LiveStream::Connected { rx },
        } = &mut self.state.tui.mode
        else {
            return;
        };
        // The pump sends a Closed item before dropping its sender, so a
        // Disconnected error here carries no extra information.
        while let Ok(item) = rx.try_recv() {
            events.push(UiEvent::Stream(item));
        }
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.tui.should_quit = true;
            }
            UiEffect::StartPlayback { period } => {
                self.stop_playback();
                self.playback = Some(spawn_playback_timer(self.inbox_tx.clone(), period));
            }
            UiEffect::StopPlayback => {
                self.stop_playback();
            }
        }
    }

    fn stop_playback(&mut self) {
        if let Some(token) = self.playback.take() {
            token.cancel();
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.stop_playback();
        let _ = terminal::restore_terminal();
    }
}

/// Spawns the repeating playback timer. Sends [`UiEvent::PlaybackTick`]
/// into the inbox every `period` until the returned token is cancelled.
fn spawn_playback_timer(tx: UiEventSender, period: Duration) -> CancellationToken {
    let token = CancellationToken::new();
    let timer_token = token.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = timer_token.cancelled() => break,
                () = tokio::time::sleep(period) => {
                    if tx.send(UiEvent::PlaybackTick).is_err() {
                        break;
                    }
                }
            }
        }
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn playback_timer_ticks_at_the_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = spawn_playback_timer(tx, Duration::from_millis(250));

        tokio::time::sleep(Duration::from_millis(260)).await;
        assert!(matches!(rx.try_recv(), Ok(UiEvent::PlaybackTick)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(matches!(rx.try_recv(), Ok(UiEvent::PlaybackTick)));

        token.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        // Nothing after cancellation; the channel eventually closes.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn playback_timer_stops_when_the_inbox_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = spawn_playback_timer(tx, Duration::from_millis(100));
        drop(rx);

        tokio::time::sleep(Duration::from_millis(300)).await;
        // The task noticed the closed channel and exited on its own; the
        // token is still usable but cancelling is now a no-op.
        token.cancel();
    }
}
