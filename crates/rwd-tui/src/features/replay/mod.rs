//! Replay transport: scrub, step, and auto-play over a recorded log.
//!
//! The transport here is pure state + effects. Every control first emits
//! [`UiEffect::StopPlayback`] so at most one playback timer is ever alive;
//! the runtime owns the actual task and its cancellation token.
//!
//! Seeking never patches state incrementally: every movement resets the
//! transcript and re-folds the log prefix through
//! [`rwd_core::log::EventLog::replay_to`], so the state at any index is
//! exactly what live application would have produced.

use std::time::Duration;

use rwd_core::events::SessionEvent;
use rwd_core::log::EventLog;

use crate::effects::UiEffect;
use crate::state::TuiState;

/// Playback speed presets, in log order. `+`/`-` move along this list.
pub const SPEED_PRESETS: &[f64] = &[0.25, 0.5, 1.0, 2.0, 4.0];

/// Replay transport state. Drives the transcript but never owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayerState {
    /// Index of the last applied event; `None` for an empty log.
    pub index: Option<usize>,
    /// True while the playback timer is running.
    pub playing: bool,
    /// Playback speed multiplier. One event per second at 1.0.
    pub speed: f64,
}

impl ReplayerState {
    pub fn new(speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
        Self {
            index: None,
            playing: false,
            speed,
        }
    }

    /// Timer period for the current speed.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed)
    }
}

/// Toggles auto-play. Starting at the end of the log (or on an empty log)
/// is inert.
pub fn toggle_play(tui: &mut TuiState) -> Vec<UiEffect> {
    let mut effects = vec![UiEffect::StopPlayback];
    if tui.replayer.playing {
        tui.replayer.playing = false;
        return effects;
    }
    if tui.log.is_empty() || at_end(tui) {
        return effects;
    }
    tui.replayer.playing = true;
    effects.push(UiEffect::StartPlayback {
        period: tui.replayer.period(),
    });
    effects
}

/// Advances one event. Pauses playback.
pub fn step_forward(tui: &mut TuiState) -> Vec<UiEffect> {
    let effects = pause(tui);
    let target = tui.replayer.index.map_or(0, |index| index + 1);
    seek(tui, target);
    effects
}

/// Rewinds one event. Pauses playback.
pub fn step_backward(tui: &mut TuiState) -> Vec<UiEffect> {
    let effects = pause(tui);
    let target = tui.replayer.index.unwrap_or(0).saturating_sub(1);
    seek(tui, target);
    effects
}

/// Jumps back to the first event. Pauses playback.
pub fn jump_to_start(tui: &mut TuiState) -> Vec<UiEffect> {
    let effects = pause(tui);
    seek(tui, 0);
    effects
}

/// Jumps to the last event. Pauses playback.
pub fn jump_to_end(tui: &mut TuiState) -> Vec<UiEffect> {
    let effects = pause(tui);
    seek(tui, tui.log.len().saturating_sub(1));
    effects
}

/// Moves to the next faster speed preset. Restarts the timer in flight so
/// the new period takes effect immediately.
pub fn speed_up(tui: &mut TuiState) -> Vec<UiEffect> {
    let next = SPEED_PRESETS
        .iter()
        .copied()
        .find(|preset| *preset > tui.replayer.speed + f64::EPSILON);
    apply_speed(tui, next)
}

/// Moves to the next slower speed preset.
pub fn slow_down(tui: &mut TuiState) -> Vec<UiEffect> {
    let next = SPEED_PRESETS
        .iter()
        .rev()
        .copied()
        .find(|preset| *preset < tui.replayer.speed - f64::EPSILON);
    apply_speed(tui, next)
}

/// One playback timer tick: advance if there is a next event, stop
/// otherwise. Stale ticks after a cancel are ignored.
pub fn handle_playback_tick(tui: &mut TuiState) -> Vec<UiEffect> {
    if !tui.replayer.playing || !tui.mode.is_replay() {
        return vec![];
    }
    match tui.replayer.index {
        Some(index) if index + 1 < tui.log.len() => {
            seek(tui, index + 1);
            vec![]
        }
        _ => {
            tui.replayer.playing = false;
            vec![UiEffect::StopPlayback]
        }
    }
}

/// Clamped full re-derivation to `target`. Also rewinds the liveness
/// clock to the latest applied event timestamp so tool liveness reflects
/// the replayed moment, not the wall clock.
pub fn seek(tui: &mut TuiState, target: usize) {
    tui.replayer.index = tui.log.replay_to(tui.transcript.state_mut(), target);
    if let Some(clock) = latest_timestamp(&tui.log, tui.replayer.index) {
        tui.clock = clock;
    }
}

/// The latest event timestamp at or before `index`.
pub fn latest_timestamp(log: &EventLog, index: Option<usize>) -> Option<i64> {
    let index = index?;
    log.iter()
        .take(index + 1)
        .rev()
        .find_map(event_timestamp)
}

fn event_timestamp(event: &SessionEvent) -> Option<i64> {
    match event {
        SessionEvent::Message { timestamp, .. }
        | SessionEvent::Tool { timestamp, .. }
        | SessionEvent::Error { timestamp, .. } => Some(*timestamp),
        _ => None,
    }
}

fn pause(tui: &mut TuiState) -> Vec<UiEffect> {
    tui.replayer.playing = false;
    vec![UiEffect::StopPlayback]
}

fn at_end(tui: &TuiState) -> bool {
    tui.replayer.index == Some(tui.log.len().saturating_sub(1)) && !tui.log.is_empty()
}

fn apply_speed(tui: &mut TuiState, next: Option<f64>) -> Vec<UiEffect> {
    let Some(speed) = next else {
        return vec![];
    };
    tui.replayer.speed = speed;
    if tui.replayer.playing {
        vec![
            UiEffect::StopPlayback,
            UiEffect::StartPlayback {
                period: tui.replayer.period(),
            },
        ]
    } else {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use rwd_core::config::Config;
    use rwd_core::session::RecordedSession;
    use serde_json::json;

    use super::*;
    use crate::state::AppState;

    fn recorded(events: Vec<serde_json::Value>) -> RecordedSession {
        serde_json::from_value(json!({
            "session_id": "s1",
            "events": events,
        }))
        .unwrap()
    }

    fn sample_app() -> AppState {
        AppState::replay(
            Config::default(),
            recorded(vec![
                json!({"type": "message", "role": "user", "content": "go", "event_id": 1, "timestamp": 100}),
                json!({"type": "step", "status": "running", "event_id": 2}),
                json!({"type": "tool", "tool_call_id": "t1", "name": "shell", "status": "called", "timestamp": 140, "event_id": 3}),
                json!({"type": "message", "role": "assistant", "content": "done", "event_id": 4, "timestamp": 150}),
            ]),
        )
    }

    #[test]
    fn replay_opens_fully_derived() {
        let app = sample_app();
        assert_eq!(app.tui.replayer.index, Some(3));
        assert_eq!(app.tui.transcript.state().entries().len(), 3);
        assert_eq!(app.tui.clock, 150);
    }

    #[test]
    fn step_backward_rewinds_derived_state_and_clock() {
        let mut app = sample_app();
        step_backward(&mut app.tui);
        assert_eq!(app.tui.replayer.index, Some(2));
        step_backward(&mut app.tui);
        assert_eq!(app.tui.replayer.index, Some(1));
        // Step has no timestamp; the clock stays at the last message.
        assert_eq!(app.tui.clock, 100);
        assert_eq!(app.tui.transcript.state().entries().len(), 2);
    }

    #[test]
    fn step_forward_clamps_at_the_last_event() {
        let mut app = sample_app();
        let effects = step_forward(&mut app.tui);
        assert_eq!(effects, vec![UiEffect::StopPlayback]);
        assert_eq!(app.tui.replayer.index, Some(3));
    }

    #[test]
    fn jump_to_start_then_end_round_trips() {
        let mut app = sample_app();
        jump_to_start(&mut app.tui);
        assert_eq!(app.tui.replayer.index, Some(0));
        assert_eq!(app.tui.transcript.state().entries().len(), 1);
        jump_to_end(&mut app.tui);
        assert_eq!(app.tui.replayer.index, Some(3));
        assert_eq!(app.tui.transcript.state().entries().len(), 3);
    }

    #[test]
    fn seek_matches_incremental_application_at_every_index() {
        let mut app = sample_app();
        for index in 0..app.tui.log.len() {
            seek(&mut app.tui, index);

            let mut incremental = rwd_core::transcript::TranscriptState::new();
            for event in app.tui.log.iter().take(index + 1) {
                incremental.apply(event);
            }
            assert_eq!(*app.tui.transcript.state(), incremental);
        }
    }

    #[test]
    fn toggle_play_from_the_end_is_inert() {
        let mut app = sample_app();
        let effects = toggle_play(&mut app.tui);
        assert_eq!(effects, vec![UiEffect::StopPlayback]);
        assert!(!app.tui.replayer.playing);
    }

    #[test]
    fn toggle_play_mid_log_starts_the_timer() {
        let mut app = sample_app();
        jump_to_start(&mut app.tui);
        let effects = toggle_play(&mut app.tui);
        assert!(app.tui.replayer.playing);
        assert_eq!(effects[0], UiEffect::StopPlayback);
        assert!(matches!(effects[1], UiEffect::StartPlayback { .. }));
    }

    #[test]
    fn playback_tick_advances_then_stops_at_the_end() {
        let mut app = sample_app();
        jump_to_start(&mut app.tui);
        app.tui.replayer.playing = true;

        assert!(handle_playback_tick(&mut app.tui).is_empty());
        assert_eq!(app.tui.replayer.index, Some(1));
        handle_playback_tick(&mut app.tui);
        handle_playback_tick(&mut app.tui);
        assert_eq!(app.tui.replayer.index, Some(3));

        // The next tick finds no further event and stops.
        let effects = handle_playback_tick(&mut app.tui);
        assert_eq!(effects, vec![UiEffect::StopPlayback]);
        assert!(!app.tui.replayer.playing);
    }

    #[test]
    fn stale_tick_after_pause_is_ignored() {
        let mut app = sample_app();
        jump_to_start(&mut app.tui);
        assert!(handle_playback_tick(&mut app.tui).is_empty());
        assert_eq!(app.tui.replayer.index, Some(0));
    }

    #[test]
    fn speed_moves_along_presets_and_restarts_in_flight() {
        let mut app = sample_app();
        assert!((app.tui.replayer.speed - 1.0).abs() < f64::EPSILON);

        // Paused speed changes emit nothing.
        assert!(speed_up(&mut app.tui).is_empty());
        assert!((app.tui.replayer.speed - 2.0).abs() < f64::EPSILON);

        jump_to_start(&mut app.tui);
        toggle_play(&mut app.tui);
        let effects = speed_up(&mut app.tui);
        assert_eq!(effects[0], UiEffect::StopPlayback);
        assert_eq!(
            effects[1],
            UiEffect::StartPlayback {
                period: Duration::from_millis(250),
            }
        );
        assert!((app.tui.replayer.speed - 4.0).abs() < f64::EPSILON);

        // Already at the fastest preset.
        assert!(speed_up(&mut app.tui).is_empty());
    }

    #[test]
    fn slow_down_stops_at_the_slowest_preset() {
        let mut app = sample_app();
        slow_down(&mut app.tui);
        slow_down(&mut app.tui);
        assert!((app.tui.replayer.speed - 0.25).abs() < f64::EPSILON);
        assert!(slow_down(&mut app.tui).is_empty());
    }

    #[test]
    fn empty_log_leaves_all_controls_inert() {
        let mut app = AppState::replay(Config::default(), recorded(vec![]));
        assert_eq!(app.tui.replayer.index, None);

        toggle_play(&mut app.tui);
        assert!(!app.tui.replayer.playing);

        step_forward(&mut app.tui);
        step_backward(&mut app.tui);
        jump_to_end(&mut app.tui);
        assert_eq!(app.tui.replayer.index, None);
        assert!(app.tui.transcript.state().entries().is_empty());
    }

    #[test]
    fn replayer_sanitizes_nonsense_speeds() {
        assert!((ReplayerState::new(0.0).speed - 1.0).abs() < f64::EPSILON);
        assert!((ReplayerState::new(f64::NAN).speed - 1.0).abs() < f64::EPSILON);
        assert!((ReplayerState::new(-2.0).speed - 1.0).abs() < f64::EPSILON);
    }
}
