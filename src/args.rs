use clap::Parser;

/// Turn top Reddit stories into narrated short-form videos.
#[derive(Parser, Debug, Clone)]
#[command(name = "storyreel", version)]
pub struct Args {
    #[clap(
        long,
        env = "STORYTELLING_SUBREDDITS",
        value_delimiter = ',',
        default_value = "tifu,AmItheAsshole,relationship_advice,MaliciousCompliance,entitledparents"
    )]
    pub subreddits: Vec<String>,

    #[clap(long, env = "VIRAL_TIME_FILTER", default_value = "day")]
    pub time_filter: String,

    #[clap(long, env = "VIRAL_POST_LIMIT", default_value_t = 25)]
    pub limit: usize,

    #[clap(long, env = "VIRAL_MIN_SCORE", default_value_t = 100, allow_negative_numbers = true)]
    pub min_score: i64,

    #[clap(long, env = "VIRAL_MAX_SCORE")]
    pub max_score: Option<i64>,

    #[clap(long, env = "VIRAL_MIN_RATIO", default_value_t = 0.8)]
    pub min_ratio: f64,

    #[clap(long, env = "VIRAL_MIN_COMMENTS", default_value_t = 10)]
    pub min_comments: u64,

    #[clap(long, env = "VIRAL_MIN_BODY_LENGTH", default_value_t = 100)]
    pub min_body_length: usize,

    #[clap(long, env = "VIRAL_MAX_BODY_LENGTH", default_value_t = 1000)]
    pub max_body_length: usize,

    #[clap(long, default_value_t = 5)]
    pub max_attempts: u32,

    #[clap(long, default_value = "./config/used_posts.json")]
    pub ledger: String,

    #[clap(long, default_value = "./res/bg.mp4")]
    pub background: String,

    #[clap(long, default_value = "./out")]
    pub out_dir: String,

    #[clap(long, default_value = "rs_tmp")]
    pub tmp_dir: String,

    #[clap(long, default_value = "./tts/en_US-hfc_male-medium.onnx")]
    pub piper_model: String,

    #[clap(long, default_value_t = 250)]
    pub chunk_chars: usize,

    #[clap(long, env = "SUBTITLE_FONT_PATH", default_value = "./res/font.ttf")]
    pub font: String,

    /// Font for the opening title card
    #[clap(long, env = "TITLE_FONT_PATH", default_value = "./res/font.ttf")]
    pub title_font: String,

    #[clap(long, default_value_t = 8)]
    pub max_words: usize,

    #[clap(long, default_value_t = 1.0)]
    pub max_gap: f64,

    #[clap(long, default_value_t = 1080)]
    pub width: u32,

    #[clap(long, default_value_t = 1920)]
    pub height: u32,

    #[clap(long, default_value_t = 30)]
    pub fps: u32,

    /// Number of videos to produce from the collected posts
    #[clap(long, default_value_t = 1)]
    pub videos: usize,

    /// Only collect and rank posts; skip narration and rendering
    #[clap(long)]
    pub dry_run: bool,
}
