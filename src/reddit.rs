use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use crate::error::CollectError;

/// A post as fetched from a listing. Never mutated after the fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub subreddit: String,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub body_text: String,
    pub is_nsfw: bool,
    pub url: String,
    pub permalink: String,
    pub created_at: DateTime<Utc>,
}

impl CandidatePost {
    /// The narrated story: title followed by the body.
    pub fn story_text(&self) -> String {
        let title = self.title.trim();
        let body = self.body_text.trim();
        if body.is_empty() {
            title.to_string()
        } else {
            format!("{}.\n\n{}", title.trim_end_matches(['.', '!', '?']), body)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RedditListing {
    pub data: RedditListingData,
}

#[derive(Debug, Deserialize)]
pub struct RedditListingData {
    pub children: Vec<RedditChild>,
}

#[derive(Debug, Deserialize)]
pub struct RedditChild {
    pub data: RedditPost,
}

#[derive(Debug, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub upvote_ratio: f64,
    #[serde(default)]
    pub num_comments: u64,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub created_utc: f64,
}

impl From<RedditPost> for CandidatePost {
    fn from(post: RedditPost) -> Self {
        let created_at = DateTime::from_timestamp(post.created_utc as i64, 0).unwrap_or_default();
        Self {
            id: post.id,
            title: post.title,
            author: post.author.unwrap_or_default(),
            subreddit: post.subreddit.unwrap_or_default(),
            score: post.score,
            upvote_ratio: post.upvote_ratio,
            num_comments: post.num_comments,
            body_text: post.selftext,
            is_nsfw: post.over_18,
            url: post.url.unwrap_or_default(),
            permalink: format!("https://reddit.com{}", post.permalink),
            created_at,
        }
    }
}

/// Parse a listing payload into posts, in listing order.
pub fn parse_listing(body: &str) -> serde_json::Result<Vec<CandidatePost>> {
    let listing: RedditListing = serde_json::from_str(body)?;
    Ok(listing
        .data
        .children
        .into_iter()
        .map(|child| CandidatePost::from(child.data))
        .collect())
}

/// Where candidate posts come from. An exhausted source returns an empty batch.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self, subreddit: &str, batch_size: usize) -> Result<Vec<CandidatePost>, CollectError>;
}

pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

/// Reads the public `top` listing of a subreddit.
pub struct RedditSource {
    client: reqwest::Client,
    base_url: String,
    time_filter: String,
}

impl RedditSource {
    pub fn new(time_filter: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(REDDIT_BASE_URL, time_filter)
    }

    pub fn with_base_url(base_url: impl Into<String>, time_filter: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            time_filter: time_filter.into(),
        })
    }
}

#[async_trait]
impl PostSource for RedditSource {
    async fn fetch(&self, subreddit: &str, batch_size: usize) -> Result<Vec<CandidatePost>, CollectError> {
        let url = format!(
            "{}/r/{}/top.json?limit={}&t={}",
            self.base_url, subreddit, batch_size, self.time_filter
        );
        debug!("Fetching {}", url);
        let unavailable = |reason: String| CollectError::SourceUnavailable {
            subreddit: subreddit.to_string(),
            reason,
        };

        let res = self
            .client
            .get(&url)
            .header(USER_AGENT, "storyreel/0.1")
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| unavailable(e.to_string()))?
            .text()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        parse_listing(&res).map_err(|e| unavailable(format!("malformed listing: {}", e)))
    }
}
