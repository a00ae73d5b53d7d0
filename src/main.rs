mod args;
mod audio;
mod collector;
mod compose;
mod config;
mod error;
mod filters;
mod ledger;
mod pipeline;
mod reddit;
mod subtitle;
mod title_card;
mod tts;

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::collector::AdaptivePostCollector;
use crate::config::PipelineConfig;
use crate::ledger::JsonLedger;
use crate::reddit::RedditSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = PipelineConfig::from_args(&args)?;
    info!(
        "Starting story video pipeline for {} subreddits",
        config.subreddits.len()
    );

    if !config.dry_run && !Path::new(&config.background).exists() {
        error!("Background video not found: {}", config.background);
        anyhow::bail!("background video not found: {}", config.background);
    }

    let ledger = Arc::new(JsonLedger::new(&config.ledger_path));
    let source = Arc::new(RedditSource::new(config.collector.time_filter.clone())?);
    let collector = Arc::new(AdaptivePostCollector::new(
        source,
        ledger.clone(),
        config.collector.clone(),
    ));

    let collected = pipeline::collect_all(collector, &config.subreddits).await;
    for (subreddit, collection) in &collected {
        pipeline::log_summary(subreddit, collection);
    }
    if config.dry_run {
        info!("Dry run: skipping video generation");
        return Ok(());
    }

    let posts: Vec<_> = collected
        .into_iter()
        .flat_map(|(_, collection)| collection.posts)
        .take(config.videos)
        .collect();
    if posts.is_empty() {
        warn!("No posts qualified; nothing to render");
        return Ok(());
    }

    let mut produced = 0;
    for post in &posts {
        info!("Producing video for {} ({})", post.id, post.title);
        match pipeline::produce_video(&config, post).await {
            Ok(path) => {
                ledger.record(post)?;
                produced += 1;
                info!("Finished {}: {}", post.id, path.display());
            }
            Err(e) => error!("Failed to produce video for {}: {:?}", post.id, e),
        }
    }

    info!("Process complete: {}/{} videos produced", produced, posts.len());
    Ok(())
}
