//! SRT caption tracks: parsing into normalized spans, and writing.

use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::SubtitleError;

static TIMECODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{2,}):(\d{2}):(\d{2}),(\d{3})\s*-->\s*(\d{2,}):(\d{2}):(\d{2}),(\d{3})\s*$")
        .expect("static regex")
});

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));

const STRIPPED_CHARS: [char; 8] = ['.', '[', ']', ':', ';', '(', ')', '-'];

/// One caption entry with normalized text and a non-empty time range.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleSpan {
    text: String,
    start: f64,
    end: f64,
}

impl SubtitleSpan {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Result<Self, SubtitleError> {
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return Err(SubtitleError::InvalidSpan { start, end });
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SubtitleError::EmptyText);
        }
        Ok(Self { text, start, end })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Strip tag markup and punctuation, lower-case, collapse whitespace.
pub fn normalize_text(raw: &str) -> String {
    let without_tags = MARKUP.replace_all(raw, "");
    let stripped: String = without_tags.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a `HH:MM:SS,mmm --> HH:MM:SS,mmm` line into seconds.
pub fn parse_timecode_line(line: &str) -> Result<(f64, f64), SubtitleError> {
    let caps = TIMECODE_LINE
        .captures(line)
        .ok_or_else(|| SubtitleError::InvalidTimecode(line.to_string()))?;
    let field = |i: usize| -> Result<u64, SubtitleError> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| SubtitleError::InvalidTimecode(line.to_string()))
    };
    let seconds = |h: u64, m: u64, s: u64, ms: u64| -> Result<f64, SubtitleError> {
        let whole = h
            .checked_mul(3600)
            .and_then(|hs| hs.checked_add(m * 60 + s))
            .ok_or_else(|| SubtitleError::InvalidTimecode(line.to_string()))?;
        Ok(whole as f64 + ms as f64 / 1000.0)
    };
    Ok((
        seconds(field(1)?, field(2)?, field(3)?, field(4)?)?,
        seconds(field(5)?, field(6)?, field(7)?, field(8)?)?,
    ))
}

fn parse_block(block: &str) -> Result<Option<SubtitleSpan>, SubtitleError> {
    let lines: Vec<&str> = block.lines().collect();
    if lines.len() < 3 {
        return Err(SubtitleError::MalformedBlock(format!("{} lines, need 3", lines.len())));
    }
    let (start, end) = parse_timecode_line(lines[1])?;
    let text = normalize_text(&lines[2..].join(" "));
    if text.is_empty() {
        return Ok(None);
    }
    SubtitleSpan::new(text, start, end).map(Some)
}

/// Parse an SRT payload. Malformed blocks are skipped; the result is in file order.
pub fn parse_srt(payload: &str) -> Vec<SubtitleSpan> {
    let normalized = payload.replace("\r\n", "\n");
    let mut spans = Vec::new();
    for (i, block) in normalized.trim().split("\n\n").enumerate() {
        match parse_block(block.trim_matches('\n')) {
            Ok(Some(span)) => spans.push(span),
            Ok(None) => debug!("Caption block {} has no text after normalization", i + 1),
            Err(e) => debug!("Skipping caption block {}: {}", i + 1, e),
        }
    }
    spans
}

pub fn load_srt(path: impl AsRef<Path>) -> anyhow::Result<Vec<SubtitleSpan>> {
    let payload = std::fs::read_to_string(path.as_ref())?;
    Ok(parse_srt(&payload))
}

pub fn write_srt(path: impl AsRef<Path>, entries: &[(f64, f64, String)]) -> anyhow::Result<()> {
    let mut f = File::create(path.as_ref())?;
    for (i, (start, end, text)) in entries.iter().enumerate() {
        writeln!(f, "{}", i + 1)?;
        writeln!(f, "{} --> {}", format_srt_time(*start), format_srt_time(*end))?;
        writeln!(f, "{}", text)?;
        writeln!(f)?;
    }
    Ok(())
}

pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}
