//! Drives collection across subreddits and turns collected posts into videos.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::audio::{concat_wavs, wav_duration_seconds};
use crate::collector::{AdaptivePostCollector, Collection};
use crate::compose::{Composition, sample_overlay, title_card_duration, title_card_segment};
use crate::config::PipelineConfig;
use crate::reddit::CandidatePost;
use crate::subtitle::{
    NarratedChunk, SubtitleOverlay, SubtitleRenderer, estimate_word_timings, group_spans, load_srt, write_srt,
};
use crate::title_card::TitleCard;
use crate::tts::{chunk_text, synthesize};

/// Collect every subreddit concurrently. A subreddit that fails is logged and skipped;
/// results come back in configuration order.
pub async fn collect_all(collector: Arc<AdaptivePostCollector>, subreddits: &[String]) -> Vec<(String, Collection)> {
    let mut tasks = JoinSet::new();
    for (order, subreddit) in subreddits.iter().cloned().enumerate() {
        let collector = Arc::clone(&collector);
        tasks.spawn(async move {
            let result = collector.collect(&subreddit).await;
            (order, subreddit, result)
        });
    }

    let mut collected = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((order, subreddit, Ok(collection))) => collected.push((order, subreddit, collection)),
            Ok((_, subreddit, Err(e))) => warn!("Skipping r/{}: {}", subreddit, e),
            Err(e) => warn!("Collection task failed: {}", e),
        }
    }
    collected.sort_by_key(|(order, _, _)| *order);
    collected.into_iter().map(|(_, s, c)| (s, c)).collect()
}

/// Log a ranked summary of collected posts.
pub fn log_summary(subreddit: &str, collection: &Collection) {
    info!(
        "r/{}: {} posts meeting the criteria ({} fetched over {} rounds)",
        subreddit,
        collection.posts.len(),
        collection.total_fetched,
        collection.attempts
    );
    for (i, post) in collection.posts.iter().enumerate() {
        info!(
            "{}. {} | r/{} | u/{} | score {} | ratio {:.2} | comments {} | {} | {}",
            i + 1,
            post.title,
            post.subreddit,
            post.author,
            post.score,
            post.upvote_ratio,
            post.num_comments,
            post.created_at.format("%Y-%m-%d %H:%M:%S"),
            post.permalink
        );
    }
}

fn fresh_dir(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        debug!("Removing existing dir '{}'", path.display());
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(())
}

/// Narrate `post`, subtitle it and render the final video. Returns the video path.
pub async fn produce_video(config: &PipelineConfig, post: &CandidatePost) -> anyhow::Result<PathBuf> {
    let work_dir = Path::new(&config.tmp_dir).join(&post.id);
    fresh_dir(&work_dir)?;
    fs::create_dir_all(&config.out_dir)?;

    let story = post.story_text();
    let chunks = chunk_text(&story, config.narration.chunk_chars);
    if chunks.is_empty() {
        anyhow::bail!("post {} has no narratable text", post.id);
    }
    info!("Split story {} into {} chunks", post.id, chunks.len());

    let mut parts = Vec::with_capacity(chunks.len());
    let mut narrated = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.into_iter().enumerate() {
        let part = work_dir.join(format!("part_{:03}.wav", i));
        debug!("Generating TTS chunk {} ({} chars)", i + 1, chunk.len());
        synthesize(&config.narration.piper_model, &chunk, &part)?;
        let duration = wav_duration_seconds(&part)?;
        debug!("Chunk {} duration: {:.2} seconds", i, duration);
        narrated.push(NarratedChunk { text: chunk, duration });
        parts.push(part);
        sleep(Duration::from_millis(150)).await;
    }

    let narration = work_dir.join("combined.wav");
    concat_wavs(&parts, &narration)?;
    let duration = wav_duration_seconds(&narration)?;
    info!("Narration for {} is {:.2} seconds", post.id, duration);

    let srt_path = work_dir.join("audio.srt");
    write_srt(&srt_path, &estimate_word_timings(&narrated))?;
    let spans = load_srt(&srt_path)?;
    let phrases = group_spans(&spans, &config.grouping);
    if phrases.is_empty() {
        warn!("No subtitles for {}; rendering without overlay", post.id);
    }
    info!("Grouped {} caption spans into {} phrases", spans.len(), phrases.len());

    let render = &config.render;
    let card_duration = title_card_duration(&post.title);
    let card = TitleCard::from_font_file(&render.title_font_path, render.width, render.height)?
        .render(&post.subreddit, &post.title);
    let mut segments: Vec<_> = title_card_segment(card, card_duration).into_iter().collect();
    debug!("Title card for {} shows for {:.1} seconds", post.id, card_duration);

    let renderer = SubtitleRenderer::from_font_file(&render.font_path, render.width, render.height)?;
    let mut overlay = SubtitleOverlay::new(phrases, renderer, card_duration);
    segments.extend(sample_overlay(&mut overlay, duration, render.fps));

    let output = Path::new(&config.out_dir).join(format!("{}.mp4", post.id));
    Composition {
        background: Path::new(&config.background),
        narration: &narration,
        work_dir: &work_dir,
        output: &output,
        size: (render.width, render.height),
        fps: render.fps,
    }
    .render(&segments)?;

    info!("Final video written to {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;
    use crate::error::CollectError;
    use crate::filters::tests::post;
    use crate::ledger::UsedIdLedger;
    use crate::reddit::PostSource;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct PerSubredditSource;

    #[async_trait]
    impl PostSource for PerSubredditSource {
        async fn fetch(&self, subreddit: &str, _batch_size: usize) -> Result<Vec<CandidatePost>, CollectError> {
            match subreddit {
                "down" => Err(CollectError::SourceUnavailable {
                    subreddit: subreddit.to_string(),
                    reason: "timeout".into(),
                }),
                name => Ok(vec![post(&format!("{}-1", name), 500, 0.95, 40, 300)]),
            }
        }
    }

    struct NoneUsed;

    impl UsedIdLedger for NoneUsed {
        fn snapshot_used_ids(&self) -> Result<HashSet<String>, CollectError> {
            Ok(HashSet::new())
        }
    }

    #[tokio::test]
    async fn failing_subreddit_does_not_stop_others() {
        let collector = Arc::new(AdaptivePostCollector::new(
            Arc::new(PerSubredditSource),
            Arc::new(NoneUsed),
            CollectorConfig {
                limit: 1,
                ..CollectorConfig::default()
            },
        ));
        let subreddits = vec!["tifu".to_string(), "down".to_string(), "AmItheAsshole".to_string()];

        let results = collect_all(collector, &subreddits).await;
        let names: Vec<&str> = results.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, ["tifu", "AmItheAsshole"]);
        assert_eq!(results[1].1.posts[0].id, "AmItheAsshole-1");
    }

    #[test]
    fn fresh_dir_clears_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("post");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("stale.wav"), b"old").unwrap();

        fresh_dir(&work).unwrap();
        assert!(work.exists());
        assert_eq!(fs::read_dir(&work).unwrap().count(), 0);
    }
}
