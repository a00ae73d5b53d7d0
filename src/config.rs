//! Pipeline configuration, built once from the command line and handed to each stage.

use crate::args::Args;
use crate::error::ConfigError;

/// Post quality thresholds. All bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterThresholds {
    pub min_score: i64,
    pub max_score: Option<i64>,
    pub min_ratio: f64,
    pub min_comments: u64,
    pub min_body_length: usize,
    pub max_body_length: usize,
    pub nsfw: bool,
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_score: 100,
            max_score: None,
            min_ratio: 0.8,
            min_comments: 10,
            min_body_length: 100,
            max_body_length: 1000,
            nsfw: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Number of posts wanted per subreddit.
    pub limit: usize,
    pub max_attempts: u32,
    /// Upper bound on a single fetch request.
    pub batch_cap: usize,
    pub batch_growth: f64,
    pub time_filter: String,
    pub filters: FilterThresholds,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            limit: 25,
            max_attempts: 5,
            batch_cap: 100,
            batch_growth: 1.5,
            time_filter: "day".to_string(),
            filters: FilterThresholds::default(),
        }
    }
}

impl CollectorConfig {
    /// Size of the first fetch: three times the target, capped.
    pub fn initial_batch(&self) -> usize {
        self.limit.saturating_mul(3).min(self.batch_cap)
    }

    pub fn next_batch(&self, current: usize) -> usize {
        ((current as f64 * self.batch_growth) as usize).min(self.batch_cap)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingConfig {
    pub max_words: usize,
    /// Seconds of silence that force a new phrase.
    pub max_gap: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_words: 8,
            max_gap: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub font_path: String,
    pub title_font_path: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationConfig {
    pub piper_model: String,
    pub chunk_chars: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub subreddits: Vec<String>,
    pub collector: CollectorConfig,
    pub grouping: GroupingConfig,
    pub render: RenderConfig,
    pub narration: NarrationConfig,
    pub ledger_path: String,
    pub background: String,
    pub out_dir: String,
    pub tmp_dir: String,
    pub videos: usize,
    pub dry_run: bool,
}

impl PipelineConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let config = Self {
            subreddits: args
                .subreddits
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            collector: CollectorConfig {
                limit: args.limit,
                max_attempts: args.max_attempts,
                time_filter: args.time_filter.clone(),
                filters: FilterThresholds {
                    min_score: args.min_score,
                    max_score: args.max_score,
                    min_ratio: args.min_ratio,
                    min_comments: args.min_comments,
                    min_body_length: args.min_body_length,
                    max_body_length: args.max_body_length,
                    nsfw: false,
                },
                ..CollectorConfig::default()
            },
            grouping: GroupingConfig {
                max_words: args.max_words,
                max_gap: args.max_gap,
            },
            render: RenderConfig {
                font_path: args.font.clone(),
                title_font_path: args.title_font.clone(),
                width: args.width,
                height: args.height,
                fps: args.fps,
            },
            narration: NarrationConfig {
                piper_model: args.piper_model.clone(),
                chunk_chars: args.chunk_chars,
            },
            ledger_path: args.ledger.clone(),
            background: args.background.clone(),
            out_dir: args.out_dir.clone(),
            tmp_dir: args.tmp_dir.clone(),
            videos: args.videos,
            dry_run: args.dry_run,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| Err(ConfigError::Invalid { field, reason });

        if self.subreddits.is_empty() {
            return invalid("subreddits", "at least one subreddit is required".into());
        }
        let c = &self.collector;
        if c.limit == 0 {
            return invalid("limit", "must be at least 1".into());
        }
        if c.max_attempts == 0 {
            return invalid("max_attempts", "must be at least 1".into());
        }
        let f = &c.filters;
        if !(0.0..=1.0).contains(&f.min_ratio) {
            return invalid("min_ratio", format!("{} is outside 0.0..=1.0", f.min_ratio));
        }
        if f.min_body_length > f.max_body_length {
            return invalid(
                "min_body_length",
                format!("{} exceeds max_body_length {}", f.min_body_length, f.max_body_length),
            );
        }
        if let Some(max) = f.max_score {
            if max < f.min_score {
                return invalid("max_score", format!("{} is below min_score {}", max, f.min_score));
            }
        }
        if self.grouping.max_words == 0 {
            return invalid("max_words", "must be at least 1".into());
        }
        if !self.grouping.max_gap.is_finite() || self.grouping.max_gap < 0.0 {
            return invalid("max_gap", format!("{} is not a non-negative number", self.grouping.max_gap));
        }
        if self.render.width == 0 || self.render.height == 0 {
            return invalid(
                "canvas",
                format!("{}x{} is empty", self.render.width, self.render.height),
            );
        }
        if self.render.fps == 0 {
            return invalid("fps", "must be at least 1".into());
        }
        if self.narration.chunk_chars == 0 {
            return invalid("chunk_chars", "must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["storyreel"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn defaults_produce_valid_config() {
        let config = PipelineConfig::from_args(&parse(&["--subreddits", "tifu"])).unwrap();
        assert_eq!(config.subreddits, vec!["tifu"]);
        assert_eq!(config.collector.limit, 25);
        assert_eq!(config.collector.max_attempts, 5);
        assert_eq!(config.grouping, GroupingConfig::default());
        assert_eq!((config.render.width, config.render.height), (1080, 1920));
    }

    #[test]
    fn subreddit_list_is_split_and_trimmed() {
        let config =
            PipelineConfig::from_args(&parse(&["--subreddits", "tifu, AmItheAsshole,,"])).unwrap();
        assert_eq!(config.subreddits, vec!["tifu", "AmItheAsshole"]);
    }

    #[test]
    fn batch_sizes_grow_and_cap() {
        let c = CollectorConfig {
            limit: 10,
            ..CollectorConfig::default()
        };
        assert_eq!(c.initial_batch(), 30);
        assert_eq!(c.next_batch(30), 45);
        assert_eq!(c.next_batch(45), 67);
        assert_eq!(c.next_batch(67), 100);

        let big = CollectorConfig {
            limit: 50,
            ..CollectorConfig::default()
        };
        assert_eq!(big.initial_batch(), 100);

        let huge = CollectorConfig {
            limit: usize::MAX,
            ..CollectorConfig::default()
        };
        assert_eq!(huge.initial_batch(), 100);
    }

    #[test]
    fn rejects_inverted_body_bounds() {
        let err = PipelineConfig::from_args(&parse(&[
            "--subreddits",
            "tifu",
            "--min-body-length",
            "500",
            "--max-body-length",
            "100",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("min_body_length"));
    }

    #[test]
    fn rejects_zero_limit_and_bad_ratio() {
        assert!(PipelineConfig::from_args(&parse(&["--subreddits", "tifu", "--limit", "0"])).is_err());
        assert!(
            PipelineConfig::from_args(&parse(&["--subreddits", "tifu", "--min-ratio", "1.5"])).is_err()
        );
    }

    #[test]
    fn rejects_zero_max_words() {
        let err =
            PipelineConfig::from_args(&parse(&["--subreddits", "tifu", "--max-words", "0"])).unwrap_err();
        assert!(err.to_string().contains("max_words"));
    }
}
