//! Repeated fetch, filter and dedupe rounds until enough posts qualify.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::filters::{ScoreFilterChain, exclude_used};
use crate::ledger::UsedIdLedger;
use crate::reddit::{CandidatePost, PostSource};

/// Outcome of collecting one subreddit.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Ranked by score, highest first, at most `limit` long.
    pub posts: Vec<CandidatePost>,
    pub attempts: u32,
    pub total_fetched: usize,
}

pub struct AdaptivePostCollector {
    source: Arc<dyn PostSource>,
    ledger: Arc<dyn UsedIdLedger>,
    chain: ScoreFilterChain,
    config: CollectorConfig,
}

impl AdaptivePostCollector {
    pub fn new(source: Arc<dyn PostSource>, ledger: Arc<dyn UsedIdLedger>, config: CollectorConfig) -> Self {
        Self {
            source,
            ledger,
            chain: ScoreFilterChain::new(config.filters.clone()),
            config,
        }
    }

    /// Collect up to `limit` qualifying posts from `subreddit`.
    ///
    /// Stops once `limit` posts are accepted, the source returns an empty batch,
    /// or `max_attempts` fetches have been made; the last two return whatever was
    /// accepted so far. A ledger failure aborts the whole collection.
    pub async fn collect(&self, subreddit: &str) -> Result<Collection, CollectError> {
        let limit = self.config.limit;
        let mut seen_ids = HashSet::new();
        let mut accepted: Vec<CandidatePost> = Vec::new();
        let mut batch_size = self.config.initial_batch();
        let mut attempts = 0;
        let mut total_fetched = 0;

        while accepted.len() < limit && attempts < self.config.max_attempts {
            attempts += 1;
            let batch = self.source.fetch(subreddit, batch_size).await?;
            debug!(
                "r/{} round {}: requested {}, received {}",
                subreddit,
                attempts,
                batch_size,
                batch.len()
            );
            if batch.is_empty() {
                debug!("r/{} exhausted after {} rounds", subreddit, attempts);
                break;
            }
            total_fetched += batch.len();

            let qualifying = self.chain.apply(batch);
            let used = self.ledger.snapshot_used_ids()?;
            let fresh = exclude_used(qualifying, &used);

            let before = accepted.len();
            for post in fresh {
                if seen_ids.insert(post.id.clone()) {
                    accepted.push(post);
                }
            }
            debug!(
                "r/{} round {}: {} new posts, {} total",
                subreddit,
                attempts,
                accepted.len() - before,
                accepted.len()
            );

            batch_size = self.config.next_batch(batch_size);
        }

        // stable: equal scores keep fetch order
        accepted.sort_by(|a, b| b.score.cmp(&a.score));
        accepted.truncate(limit);

        info!(
            "r/{}: fetched {} total posts, filtered to {} posts meeting criteria",
            subreddit,
            total_fetched,
            accepted.len()
        );
        Ok(Collection {
            posts: accepted,
            attempts,
            total_fetched,
        })
    }
}
