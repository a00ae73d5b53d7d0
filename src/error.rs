//! Error types for the collection and subtitle stages.

use thiserror::Error;

/// Failures that end collection for one subreddit.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("source r/{subreddit} unavailable: {reason}")]
    SourceUnavailable { subreddit: String, reason: String },

    #[error("used-post ledger unavailable: {0}")]
    LedgerUnavailable(String),
}

/// Invalid caption input.
#[derive(Debug, Error, PartialEq)]
pub enum SubtitleError {
    #[error("span ends at {end}s which is not after its start {start}s")]
    InvalidSpan { start: f64, end: f64 },

    #[error("invalid timecode line: {0}")]
    InvalidTimecode(String),

    #[error("caption text is empty after normalization")]
    EmptyText,

    #[error("malformed caption block: {0}")]
    MalformedBlock(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font {path}: {reason}")]
    FontParse { path: String, reason: String },

    #[error("canvas must be non-empty, got {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
