//! Post quality filters. Each keeps the posts that pass, in input order.

use std::collections::HashSet;

use crate::config::FilterThresholds;
use crate::reddit::CandidatePost;

pub fn by_score(posts: Vec<CandidatePost>, min_score: i64, max_score: Option<i64>) -> Vec<CandidatePost> {
    posts
        .into_iter()
        .filter(|p| p.score >= min_score && max_score.is_none_or(|max| p.score <= max))
        .collect()
}

pub fn by_ratio(posts: Vec<CandidatePost>, min_ratio: f64) -> Vec<CandidatePost> {
    posts.into_iter().filter(|p| p.upvote_ratio >= min_ratio).collect()
}

pub fn by_comments(posts: Vec<CandidatePost>, min_comments: u64) -> Vec<CandidatePost> {
    posts.into_iter().filter(|p| p.num_comments >= min_comments).collect()
}

/// Body length is counted in characters after trimming.
pub fn by_body_length(posts: Vec<CandidatePost>, min_len: usize, max_len: usize) -> Vec<CandidatePost> {
    posts
        .into_iter()
        .filter(|p| {
            let len = p.body_text.trim().chars().count();
            len >= min_len && len <= max_len
        })
        .collect()
}

pub fn by_nsfw(posts: Vec<CandidatePost>, nsfw: bool) -> Vec<CandidatePost> {
    posts.into_iter().filter(|p| p.is_nsfw == nsfw).collect()
}

/// Drops posts whose id is in `used`.
pub fn exclude_used(posts: Vec<CandidatePost>, used: &HashSet<String>) -> Vec<CandidatePost> {
    posts.into_iter().filter(|p| !used.contains(&p.id)).collect()
}

/// All quality filters applied in sequence.
#[derive(Debug, Clone)]
pub struct ScoreFilterChain {
    thresholds: FilterThresholds,
}

impl ScoreFilterChain {
    pub fn new(thresholds: FilterThresholds) -> Self {
        Self { thresholds }
    }

    pub fn apply(&self, posts: Vec<CandidatePost>) -> Vec<CandidatePost> {
        let t = &self.thresholds;
        let posts = by_score(posts, t.min_score, t.max_score);
        let posts = by_ratio(posts, t.min_ratio);
        let posts = by_comments(posts, t.min_comments);
        let posts = by_body_length(posts, t.min_body_length, t.max_body_length);
        by_nsfw(posts, t.nsfw)
    }
}
