//! Narration: sentence chunking and Piper speech synthesis.

use anyhow::Context;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::{debug, error, warn};

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([^.!?]+[.!?]+)|([^.!?]+$)").expect("static regex"));

/// Split `text` into sentence-aligned chunks of at most `max_chars` characters.
/// A single sentence longer than `max_chars` becomes its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let sentences: Vec<String> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        warn!("No sentence breaks found; returning whole text as one chunk");
        let trimmed = text.trim();
        return if trimmed.is_empty() { Vec::new() } else { vec![trimmed.to_string()] };
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for s in sentences {
        if current.is_empty() {
            current = s;
        } else if current.chars().count() + 1 + s.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(&s);
        } else {
            chunks.push(std::mem::replace(&mut current, s));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Synthesize `text` into a WAV file with the `piper` CLI.
pub fn synthesize(model: &str, text: &str, out_path: &Path) -> anyhow::Result<()> {
    debug!("Calling Piper TTS for {}", out_path.display());
    let mut child = Command::new("piper")
        .args(["--model", model, "--output_file"])
        .arg(out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()
        .context("failed to spawn piper")?;

    {
        let stdin = child.stdin.as_mut().context("failed to open piper stdin")?;
        stdin.write_all(text.as_bytes())?;
    }

    let status = child.wait()?;
    if !status.success() {
        error!("Piper TTS command failed for chunk: {}", out_path.display());
        anyhow::bail!("TTS engine failed for chunk, command returned non-zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_sentences_up_to_limit() {
        let text = "First one. Second one! Third? Fourth sentence here.";
        let chunks = chunk_text(text, 24);
        assert_eq!(chunks, ["First one. Second one!", "Third?", "Fourth sentence here."]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 24));
    }

    #[test]
    fn trailing_fragment_is_kept() {
        let chunks = chunk_text("Done. and then nothing", 100);
        assert_eq!(chunks, ["Done. and then nothing"]);
    }

    #[test]
    fn collapses_newlines_inside_sentences() {
        let chunks = chunk_text("My title.\n\nSo this\nhappened.", 250);
        assert_eq!(chunks, ["My title. So this happened."]);
    }

    #[test]
    fn long_sentence_is_its_own_chunk() {
        let long = format!("{}.", "word ".repeat(30).trim());
        let chunks = chunk_text(&format!("Short. {} End.", long), 20);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], long);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("   ", 10).is_empty());
    }
}
