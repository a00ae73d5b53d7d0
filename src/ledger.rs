//! Record of posts that already became videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use crate::error::CollectError;
use crate::reddit::CandidatePost;

/// Read access to the ids of posts used in earlier runs.
pub trait UsedIdLedger: Send + Sync {
    fn snapshot_used_ids(&self) -> Result<HashSet<String>, CollectError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub created_at: DateTime<Utc>,
    pub id: String,
    pub title: String,
    pub url: String,
    pub score: i64,
}

impl LedgerRow {
    pub fn from_post(post: &CandidatePost) -> Self {
        Self {
            created_at: Utc::now(),
            id: post.id.clone(),
            title: post.title.clone(),
            url: if post.url.is_empty() {
                post.permalink.clone()
            } else {
                post.url.clone()
            },
            score: post.score,
        }
    }
}

/// Ledger stored as a JSON array of rows. A missing file is an empty ledger.
pub struct JsonLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn rows(&self) -> anyhow::Result<Vec<LedgerRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        let rows: Vec<LedgerRow> = serde_json::from_str(&data)?;
        Ok(rows)
    }

    /// Append one row for `post`. The new file is written next to the old one and
    /// renamed over it, so readers see either the old or the new rows.
    pub fn record(&self, post: &CandidatePost) -> anyhow::Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))?;
        let mut rows = self.rows()?;
        rows.push(LedgerRow::from_post(post));
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(&rows)?;
        let staging = self.staging_path();
        fs::write(&staging, data)?;
        fs::rename(&staging, &self.path)?;
        info!("Recorded post {} in {}", post.id, self.path.display());
        Ok(())
    }
}

impl JsonLedger {
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl UsedIdLedger for JsonLedger {
    fn snapshot_used_ids(&self) -> Result<HashSet<String>, CollectError> {
        let rows = self
            .rows()
            .map_err(|e| CollectError::LedgerUnavailable(format!("{}: {}", self.path.display(), e)))?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }
}
