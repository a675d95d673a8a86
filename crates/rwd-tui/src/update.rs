//! Pure reducer: `update(state, event) -> effects`.
//!
//! All state transitions happen here; the runtime executes the returned
//! effects. Keeping this pure makes the whole interaction surface testable
//! without a terminal.

use crossterm::event::{
    Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent,
    MouseEventKind,
};
use rwd_core::session::StreamItem;
use rwd_core::transcript::TranscriptSignal;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::render;
use crate::replay;
use crate::state::{AppState, LiveActivity, LiveStream, SessionMode};
use crate::transcript;

/// Processes a single event against the state.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => handle_tick(app),
        UiEvent::Frame { width, height } => handle_frame(app, width, height),
        UiEvent::Terminal(terminal_event) => handle_terminal_event(app, terminal_event),
        UiEvent::Stream(item) => handle_stream_item(app, item),
        UiEvent::PlaybackTick => replay::handle_playback_tick(&mut app.tui),
    }
}

fn handle_tick(app: &mut AppState) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    tui.spinner_frame = tui.spinner_frame.wrapping_add(1);
    if !tui.mode.is_replay() {
        tui.clock = chrono::Utc::now().timestamp();
    }
    vec![]
}

/// Settles layout for this frame: records the viewport geometry, refreshes
/// the line count the scroll math depends on, and applies any accumulated
/// wheel delta.
fn handle_frame(app: &mut AppState, width: u16, height: u16) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    let viewport_height = render::transcript_viewport_height(tui, height);
    let content_width = render::transcript_content_width(tui, width);
    tui.transcript.update_layout((width, height), viewport_height);
    let line_count = transcript::render_lines(tui.transcript.state(), content_width).len();
    tui.transcript.set_line_count(line_count);
    tui.transcript.apply_scroll_delta();
    vec![]
}

fn handle_terminal_event(app: &mut AppState, event: CrosstermEvent) -> Vec<UiEffect> {
    match event {
        CrosstermEvent::Key(key) => handle_key_event(app, key),
        CrosstermEvent::Mouse(mouse) => handle_mouse_event(app, mouse),
        // Resizes settle through the Frame event on the next loop.
        _ => vec![],
    }
}

fn handle_key_event(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    // Release/repeat events would double every action on Windows.
    if key.kind != KeyEventKind::Press {
        return vec![];
    }
    let tui = &mut app.tui;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        tui.should_quit = true;
        return vec![UiEffect::StopPlayback, UiEffect::Quit];
    }

    match key.code {
        KeyCode::Char('q') => {
            tui.should_quit = true;
            vec![UiEffect::StopPlayback, UiEffect::Quit]
        }

        KeyCode::Up | KeyCode::Char('k') => {
            tui.transcript.scroll_up(1);
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            tui.transcript.scroll_down(1);
            vec![]
        }
        KeyCode::PageUp => {
            tui.transcript.page_up();
            vec![]
        }
        KeyCode::PageDown => {
            tui.transcript.page_down();
            vec![]
        }
        KeyCode::Char('g') => {
            tui.transcript.scroll_to_top();
            vec![]
        }
        KeyCode::Char('G') => {
            tui.transcript.scroll_to_bottom();
            vec![]
        }

        // Replay transport. Inert in live mode.
        KeyCode::Char(' ') if tui.mode.is_replay() => replay::toggle_play(tui),
        KeyCode::Left if tui.mode.is_replay() => replay::step_backward(tui),
        KeyCode::Right if tui.mode.is_replay() => replay::step_forward(tui),
        KeyCode::Home if tui.mode.is_replay() => replay::jump_to_start(tui),
        KeyCode::End if tui.mode.is_replay() => replay::jump_to_end(tui),
        KeyCode::Char('+' | '=') if tui.mode.is_replay() => replay::speed_up(tui),
        KeyCode::Char('-' | '_') if tui.mode.is_replay() => replay::slow_down(tui),

        // End in live mode jumps to the newest content.
        KeyCode::End => {
            tui.transcript.scroll_to_bottom();
            vec![]
        }

        _ => vec![],
    }
}

fn handle_mouse_event(app: &mut AppState, mouse: MouseEvent) -> Vec<UiEffect> {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.tui.transcript.scroll_accumulator.accumulate(-1),
        MouseEventKind::ScrollDown => app.tui.transcript.scroll_accumulator.accumulate(1),
        _ => {}
    }
    vec![]
}

fn handle_stream_item(app: &mut AppState, item: StreamItem) -> Vec<UiEffect> {
    let tui = &mut app.tui;
    match item {
        StreamItem::Event(event) => {
            tui.awaiting_first_event = false;
            for signal in tui.transcript.apply(&event) {
                if let TranscriptSignal::ToolActivity { slot } = signal {
                    // Liveness counts from arrival, not from the event's
                    // timestamp; a resumed stream delivers old timestamps.
                    tui.live_activity = Some(LiveActivity {
                        slot,
                        observed_at: tui.clock,
                    });
                }
            }
            tui.log.push(event);
        }
        StreamItem::Closed { error } => {
            tui.awaiting_first_event = false;
            if let SessionMode::Live { stream } = &mut tui.mode {
                *stream = LiveStream::Closed { error };
            }
        }
    }
    vec![]
}
