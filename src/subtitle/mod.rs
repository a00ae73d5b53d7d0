//! Caption tracks, phrase grouping and per-frame subtitle layers.

pub mod group;
pub mod overlay;
pub mod render;
pub mod srt;
pub mod timing;

pub use group::group_spans;
pub use overlay::SubtitleOverlay;
pub use render::{SubtitleRenderer, Typeface};
pub use srt::{load_srt, write_srt};
pub use timing::{NarratedChunk, estimate_word_timings};
