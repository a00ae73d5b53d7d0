//! Maps playback time to the rendered subtitle layer for that moment.

use image::RgbaImage;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::subtitle::group::SubtitlePhrase;
use crate::subtitle::render::{SubtitleRenderer, Typeface};

/// One overlay session: a fixed phrase list, canvas and font, plus the layers
/// rendered so far, keyed by (phrase text, centered).
///
/// The cache is never evicted; a video only has a few hundred distinct phrases.
pub struct SubtitleOverlay<T> {
    phrases: Vec<SubtitlePhrase>,
    renderer: SubtitleRenderer<T>,
    initial_position_duration: f64,
    cache: HashMap<(String, bool), Arc<RgbaImage>>,
    renders: usize,
}

impl<T: Typeface> SubtitleOverlay<T> {
    /// `initial_position_duration` is how long the title card holds the middle of the
    /// frame; until then subtitles use the caption bar.
    pub fn new(mut phrases: Vec<SubtitlePhrase>, renderer: SubtitleRenderer<T>, initial_position_duration: f64) -> Self {
        phrases.sort_by(|a, b| a.start().total_cmp(&b.start()));
        Self {
            phrases,
            renderer,
            initial_position_duration,
            cache: HashMap::new(),
            renders: 0,
        }
    }

    /// The phrase on screen at `t`, if any. The first phrase (by start) whose
    /// half-open range covers `t` wins.
    pub fn active_phrase(&self, t: f64) -> Option<&SubtitlePhrase> {
        let started = self.phrases.partition_point(|p| p.start() <= t);
        self.phrases[..started].iter().find(|p| p.contains(t))
    }

    /// Layer to draw at `t`, or `None` when no phrase is active. Queries may arrive in
    /// any order.
    pub fn query(&mut self, t: f64) -> Option<Arc<RgbaImage>> {
        let text = self.active_phrase(t)?.text().to_string();
        let centered = t >= self.initial_position_duration;

        let key = (text, centered);
        if let Some(layer) = self.cache.get(&key) {
            return Some(Arc::clone(layer));
        }
        debug!("Rendering subtitle layer '{}' (centered: {})", key.0, centered);
        let layer = Arc::new(self.renderer.render(&key.0, centered));
        self.renders += 1;
        self.cache.insert(key, Arc::clone(&layer));
        Some(layer)
    }

    /// Number of layers rendered so far in this session.
    pub fn renders(&self) -> usize {
        self.renders
    }
}
