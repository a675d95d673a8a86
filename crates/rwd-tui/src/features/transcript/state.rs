//! Transcript display state: the derived conversation plus scroll position.

use rwd_core::events::SessionEvent;
use rwd_core::transcript::{TranscriptSignal, TranscriptState};

/// Scroll mode for the transcript pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Auto-scroll so the newest content stays visible.
    FollowLatest,
    /// User scrolled away; offset is a line index from the top.
    Anchored { offset: usize },
}

/// Scroll position and navigation logic for the transcript pane.
///
/// Keeps all scroll math in one place so the reducer stays small. The line
/// count is cached from layout (it depends on wrap width) rather than
/// recomputed per keystroke.
#[derive(Debug, Clone)]
pub struct ScrollState {
    pub mode: ScrollMode,
    /// Total rendered line count from the last layout pass.
    pub cached_line_count: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
            cached_line_count: 0,
        }
    }
}

impl ScrollState {
    /// True while auto-scrolling to the newest content.
    pub fn is_following(&self) -> bool {
        matches!(self.mode, ScrollMode::FollowLatest)
    }

    /// The scroll offset to render at, clamped to the valid range.
    ///
    /// In follow mode the offset is derived from the cached line count, so
    /// growth auto-scrolls once layout has settled.
    pub fn get_offset(&self, viewport_height: usize) -> usize {
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        match self.mode {
            ScrollMode::FollowLatest => max_offset,
            ScrollMode::Anchored { offset } => offset.min(max_offset),
        }
    }

    /// Scrolls up, anchoring at the new offset.
    pub fn scroll_up(&mut self, lines: usize, viewport_height: usize) {
        let current = self.get_offset(viewport_height);
        self.mode = ScrollMode::Anchored {
            offset: current.saturating_sub(lines),
        };
    }

    /// Scrolls down; reaching the bottom resumes follow mode.
    pub fn scroll_down(&mut self, lines: usize, viewport_height: usize) {
        if self.is_following() {
            return;
        }
        let current = self.get_offset(viewport_height);
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        let new_offset = (current + lines).min(max_offset);
        self.mode = if new_offset >= max_offset {
            ScrollMode::FollowLatest
        } else {
            ScrollMode::Anchored { offset: new_offset }
        };
    }

    pub fn scroll_to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }

    /// Jumps to the bottom and resumes following.
    pub fn scroll_to_bottom(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }

    pub fn page_up(&mut self, viewport_height: usize) {
        self.scroll_up(viewport_height.max(1), viewport_height);
    }

    pub fn page_down(&mut self, viewport_height: usize) {
        self.scroll_down(viewport_height.max(1), viewport_height);
    }
}

/// Accumulator for mouse wheel deltas with acceleration.
///
/// Coalesces the burst of events a trackpad produces into one scroll per
/// frame. Starts at one line for precision and grows logarithmically while
/// the user keeps scrolling the same direction.
///
/// Convention: positive delta scrolls down, negative scrolls up.
#[derive(Debug, Clone, Default)]
pub struct ScrollAccumulator {
    pending_delta: i32,
    consecutive_frames: u8,
    last_direction: i8,
}

impl ScrollAccumulator {
    pub fn accumulate(&mut self, delta: i32) {
        self.pending_delta += delta;
    }

    /// Takes the pending delta and returns the signed line count to scroll
    /// this frame. Direction changes reset the acceleration.
    pub fn take_delta(&mut self) -> i32 {
        let raw_delta = std::mem::take(&mut self.pending_delta);
        if raw_delta == 0 {
            self.consecutive_frames = 0;
            self.last_direction = 0;
            return 0;
        }

        let current_direction = raw_delta.signum() as i8;
        if current_direction == self.last_direction {
            self.consecutive_frames = self.consecutive_frames.saturating_add(1);
        } else {
            self.consecutive_frames = 1;
            self.last_direction = current_direction;
        }

        // 1 + floor(log2(frames - 1)): frames 1-2 scroll one line, then
        // the step grows slowly without a hard cap.
        let multiplier = {
            let adjusted = f64::from(self.consecutive_frames.saturating_sub(1).max(1));
            (1.0 + adjusted.log2()).floor() as u32
        };

        let lines = multiplier.min(raw_delta.unsigned_abs().max(1));
        if raw_delta < 0 {
            -(lines as i32)
        } else {
            lines as i32
        }
    }
}

/// Transcript pane state: the reducer-owned [`TranscriptState`] plus the
/// viewport geometry and scroll position layered on top of it.
///
/// Mutation goes through [`TranscriptView::apply`] (live) or the replay
/// seek path, which re-derives the inner state through `state_mut`.
pub struct TranscriptView {
    state: TranscriptState,
    pub scroll: ScrollState,
    pub scroll_accumulator: ScrollAccumulator,
    /// Transcript pane height in lines, from the last Frame event.
    pub viewport_height: usize,
    /// Full terminal size, from the last Frame event.
    pub terminal_size: (u16, u16),
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            state: TranscriptState::new(),
            scroll: ScrollState::default(),
            scroll_accumulator: ScrollAccumulator::default(),
            viewport_height: 0,
            terminal_size: (0, 0),
        }
    }

    pub fn state(&self) -> &TranscriptState {
        &self.state
    }

    /// Mutable access for full re-derivation (replay seeks).
    pub fn state_mut(&mut self) -> &mut TranscriptState {
        &mut self.state
    }

    /// Folds one live event into the derived state.
    pub fn apply(&mut self, event: &SessionEvent) -> Vec<TranscriptSignal> {
        self.state.apply(event)
    }

    /// Records the current layout. Called once per frame.
    pub fn update_layout(&mut self, terminal_size: (u16, u16), viewport_height: usize) {
        self.terminal_size = terminal_size;
        self.viewport_height = viewport_height;
    }

    pub fn set_line_count(&mut self, line_count: usize) {
        self.scroll.cached_line_count = line_count;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll.scroll_up(lines, self.viewport_height);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll.scroll_down(lines, self.viewport_height);
    }

    pub fn page_up(&mut self) {
        self.scroll.page_up(self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll.page_down(self.viewport_height);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll.scroll_to_top();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll.scroll_to_bottom();
    }

    /// Applies the accumulated wheel delta as one scroll operation.
    pub fn apply_scroll_delta(&mut self) {
        let delta = self.scroll_accumulator.take_delta();
        if delta < 0 {
            self.scroll_up(delta.unsigned_abs() as usize);
        } else if delta > 0 {
            self.scroll_down(delta as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scroll_with_lines(line_count: usize) -> ScrollState {
        ScrollState {
            mode: ScrollMode::FollowLatest,
            cached_line_count: line_count,
        }
    }

    #[test]
    fn follow_mode_tracks_the_bottom_as_content_grows() {
        let mut scroll = scroll_with_lines(50);
        assert_eq!(scroll.get_offset(20), 30);
        scroll.cached_line_count = 80;
        assert_eq!(scroll.get_offset(20), 60);
    }

    #[test]
    fn scrolling_up_anchors_and_growth_no_longer_moves_the_view() {
        let mut scroll = scroll_with_lines(100);
        scroll.scroll_up(5, 20);
        assert_eq!(scroll.mode, ScrollMode::Anchored { offset: 75 });

        scroll.cached_line_count = 200;
        assert_eq!(scroll.get_offset(20), 75);
    }

    #[test]
    fn scrolling_down_to_the_bottom_resumes_following() {
        let mut scroll = scroll_with_lines(100);
        scroll.scroll_up(5, 20);
        scroll.scroll_down(4, 20);
        assert_eq!(scroll.mode, ScrollMode::Anchored { offset: 79 });
        scroll.scroll_down(1, 20);
        assert!(scroll.is_following());
    }

    #[test]
    fn anchored_offset_is_clamped_when_viewport_grows() {
        let mut scroll = scroll_with_lines(100);
        scroll.mode = ScrollMode::Anchored { offset: 95 };
        assert_eq!(scroll.get_offset(20), 80);
    }

    #[test]
    fn short_content_never_scrolls() {
        let scroll = scroll_with_lines(5);
        assert_eq!(scroll.get_offset(20), 0);
    }

    #[test]
    fn explicit_bottom_jump_resumes_follow() {
        let mut scroll = scroll_with_lines(100);
        scroll.scroll_to_top();
        assert_eq!(scroll.mode, ScrollMode::Anchored { offset: 0 });
        scroll.scroll_to_bottom();
        assert!(scroll.is_following());
    }

    #[test]
    fn accumulator_starts_slow_then_accelerates() {
        let mut acc = ScrollAccumulator::default();

        // Burst in one frame still scrolls one line.
        acc.accumulate(-1);
        acc.accumulate(-1);
        acc.accumulate(-1);
        assert_eq!(acc.take_delta(), -1);

        // Sustained scrolling grows the step.
        let mut saw_faster = false;
        for _ in 0..8 {
            acc.accumulate(-3);
            if acc.take_delta() < -1 {
                saw_faster = true;
            }
        }
        assert!(saw_faster);
    }

    #[test]
    fn accumulator_resets_on_direction_change() {
        let mut acc = ScrollAccumulator::default();
        for _ in 0..6 {
            acc.accumulate(-3);
            acc.take_delta();
        }
        acc.accumulate(5);
        assert_eq!(acc.take_delta(), 1);
    }

    #[test]
    fn idle_frame_resets_acceleration() {
        let mut acc = ScrollAccumulator::default();
        for _ in 0..6 {
            acc.accumulate(-3);
            acc.take_delta();
        }
        assert_eq!(acc.take_delta(), 0);
        acc.accumulate(-3);
        assert_eq!(acc.take_delta(), -1);
    }
}
