//! Pick history
//!
//! Every accepted pick becomes one [`HistoryEntry`] line in `history.log`
//! under the state directory. Write failures never reach the caller.

use crate::config::{schema::Config, ConfigManager};
use crate::select::PickedMedia;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// One line of the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub id: String,
    pub path: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub attempts: u32,
}

impl HistoryEntry {
    pub fn new(picked: &PickedMedia, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            id: picked.file.id.clone(),
            path: picked.path.clone(),
            mime_type: picked.file.mime_type.clone(),
            size: picked.file.size,
            attempts: picked.attempts,
        }
    }

    fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self).map(|mut line| {
            line.push('\n');
            line
        })
    }
}

/// Append-only record of picked files
pub struct PickHistory {
    path: Option<PathBuf>,
}

impl PickHistory {
    /// History at the default location, or none if disabled in `config`
    pub fn new(config: &Config) -> Self {
        let path = config.general.history.then(ConfigManager::history_path);
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn record(&self, picked: &PickedMedia) {
        self.record_entry(&HistoryEntry::new(picked, Utc::now()))
            .await
    }

    async fn record_entry(&self, entry: &HistoryEntry) {
        let Some(path) = &self.path else {
            return;
        };
        let result = match entry.to_line() {
            Ok(line) => append_line(path, &line).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(()) => debug!("Recorded '{}' in {}", entry.path, path.display()),
            Err(e) => warn!("Could not write pick history {}: {}", path.display(), e),
        }
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
