//! Word-level timestamps estimated from narrated chunk durations.

use regex::Regex;
use std::sync::LazyLock;

static WORD_OR_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w[\w'-]*)|([,.!?])").expect("static regex"));

const COMMA_PAUSE: f64 = 0.2;
const SENTENCE_END_PAUSE: f64 = 0.4;
/// Pauses never take more than this share of a chunk.
const MAX_PAUSE_SHARE: f64 = 0.5;
/// Longer words take longer to say, sub-linearly.
const LENGTH_EXPONENT: f64 = 0.75;

/// A synthesized piece of narration and how long it plays.
#[derive(Debug, Clone)]
pub struct NarratedChunk {
    pub text: String,
    pub duration: f64,
}

/// Spread each chunk's duration over its words, chunks laid end to end from zero.
pub fn estimate_word_timings(chunks: &[NarratedChunk]) -> Vec<(f64, f64, String)> {
    let mut entries = Vec::new();
    let mut chunk_start = 0.0_f64;

    for chunk in chunks {
        let dur = chunk.duration.max(0.0);
        let chunk_end = chunk_start + dur;
        let elements: Vec<&str> = WORD_OR_PUNCT.find_iter(&chunk.text).map(|m| m.as_str()).collect();

        if elements.is_empty() {
            if dur > 0.0 && !chunk.text.trim().is_empty() {
                entries.push((chunk_start, chunk_end, chunk.text.trim().to_string()));
            }
            chunk_start = chunk_end;
            continue;
        }

        let mut raw_pause = 0.0;
        let mut total_weight = 0.0;
        for &element in &elements {
            match element {
                "," => raw_pause += COMMA_PAUSE,
                "." | "!" | "?" => raw_pause += SENTENCE_END_PAUSE,
                word => total_weight += weight(word),
            }
        }
        let pause_scale = if raw_pause > dur * MAX_PAUSE_SHARE {
            dur * MAX_PAUSE_SHARE / raw_pause
        } else {
            1.0
        };
        let word_time = (dur - raw_pause * pause_scale).max(0.0);

        let mut cursor = chunk_start;
        for element in elements {
            match element {
                "," => cursor += COMMA_PAUSE * pause_scale,
                "." | "!" | "?" => cursor += SENTENCE_END_PAUSE * pause_scale,
                word => {
                    let word_duration = if total_weight > 0.0 {
                        word_time * weight(word) / total_weight
                    } else {
                        0.0
                    };
                    entries.push((cursor, cursor + word_duration, word.to_string()));
                    cursor += word_duration;
                }
            }
        }

        chunk_start = chunk_end;
    }
    entries
}

fn weight(word: &str) -> f64 {
    (word.chars().count() as f64).powf(LENGTH_EXPONENT)
}
