//! Transcript feature: derived conversation state plus viewport follow.

mod render;
mod state;

pub use render::render_lines;
pub use state::{ScrollAccumulator, ScrollMode, ScrollState, TranscriptView};
