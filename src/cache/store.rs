//! Persistent folder cache with TTL
//!
//! The whole cache is one JSON document mapping folder IDs to
//! [`CacheEntry`] values. Every write replaces the document atomically
//! (temp file + rename); an interrupted write leaves the previous document.

use crate::cache::folder::{CacheEntry, Folder};
use crate::config::schema::CacheConfig;
use crate::drive::ListingProvider;
use crate::error::{DrivepickError, DrivepickResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mapping from folder ID to its cache entry, as persisted
pub type CacheDocument = BTreeMap<String, CacheEntry>;

/// Age limits applied to cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Entries younger than this are served without a remote call
    pub ttl: Duration,
    /// Entries older than this are dropped when the cache is opened
    pub stale_after: Duration,
}

impl CachePolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            ttl: Duration::hours(i64::from(config.ttl_hours)),
            stale_after: Duration::days(i64::from(config.stale_days)),
        }
    }
}

/// Entry counts by age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// All entries
    pub entries: usize,
    /// Younger than the TTL
    pub fresh: usize,
    /// Past the TTL, refetched on next access
    pub expired: usize,
    /// Past the stale horizon, dropped on next open
    pub stale: usize,
    /// Time of the oldest entry
    pub oldest: Option<DateTime<Utc>>,
    /// Files listed across all cached folders
    pub files: usize,
}

impl CacheStats {
    fn of_document(document: &CacheDocument, policy: CachePolicy, now: DateTime<Utc>) -> Self {
        let mut stats = Self {
            entries: document.len(),
            ..Self::default()
        };
        for entry in document.values() {
            let age = now - entry.time;
            if age > policy.stale_after {
                stats.stale += 1;
            } else if age >= policy.ttl {
                stats.expired += 1;
            } else {
                stats.fresh += 1;
            }
            stats.files += entry.folder.nr_files();
            stats.oldest = Some(stats.oldest.map_or(entry.time, |t| t.min(entry.time)));
        }
        stats
    }
}

#[derive(Debug, Default)]
struct Batch {
    depth: u32,
    every: u32,
    pending: u32,
}

/// Folder cache backed by a listing provider
pub struct FolderCache {
    path: PathBuf,
    policy: CachePolicy,
    provider: Arc<dyn ListingProvider>,
    entries: RwLock<CacheDocument>,
    /// Serializes document writes so a later snapshot never loses to an earlier one
    persist_lock: Mutex<()>,
    batch: std::sync::Mutex<Batch>,
}

impl FolderCache {
    /// Open the cache document at `path`, dropping stale entries
    pub async fn open(
        path: impl Into<PathBuf>,
        policy: CachePolicy,
        provider: Arc<dyn ListingProvider>,
    ) -> DrivepickResult<Self> {
        Self::open_at(path.into(), policy, provider, Utc::now()).await
    }

    pub(crate) async fn open_at(
        path: PathBuf,
        policy: CachePolicy,
        provider: Arc<dyn ListingProvider>,
        now: DateTime<Utc>,
    ) -> DrivepickResult<Self> {
        let entries = load_document(&path).await?;
        let cache = Self {
            path,
            policy,
            provider,
            entries: RwLock::new(entries),
            persist_lock: Mutex::new(()),
            batch: std::sync::Mutex::new(Batch::default()),
        };

        let evicted = cache.sweep(now).await;
        if !evicted.is_empty() {
            info!("Dropped {} stale cache entries", evicted.len());
        }
        cache.persist().await?;
        Ok(cache)
    }

    /// Document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Age limits in use
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Get a folder by ID, fetching its name and children on a miss
    pub async fn get(&self, folder_id: &str, force_update: bool) -> DrivepickResult<Folder> {
        self.get_at(folder_id, None, force_update, Utc::now()).await
    }

    /// Get a folder whose name is already known from its parent's listing
    ///
    /// Saves the extra metadata request on a miss.
    pub async fn get_named(
        &self,
        folder_id: &str,
        name: &str,
        force_update: bool,
    ) -> DrivepickResult<Folder> {
        self.get_at(folder_id, Some(name), force_update, Utc::now())
            .await
    }

    pub(crate) async fn get_at(
        &self,
        folder_id: &str,
        name: Option<&str>,
        force_update: bool,
        now: DateTime<Utc>,
    ) -> DrivepickResult<Folder> {
        if !force_update {
            if let Some(entry) = self.entries.read().await.get(folder_id) {
                if now - entry.time < self.policy.ttl {
                    debug!("cache: hit  '{}'", entry.folder.name());
                    return Ok(entry.folder.clone());
                }
            }
        }

        debug!("cache: miss '{}'", folder_id);
        let name = match name {
            Some(name) => name.to_string(),
            None => self.provider.get_node(folder_id).await?.name,
        };
        let nodes = self.provider.list_children(folder_id).await?;
        let folder = Folder::new(folder_id, name, nodes);

        self.entries.write().await.insert(
            folder_id.to_string(),
            CacheEntry {
                time: now,
                folder: folder.clone(),
            },
        );
        self.after_write().await?;

        Ok(folder)
    }

    /// Remove entries, e.g. after the remote reported them missing
    pub async fn evict(&self, folder_ids: &[&str]) -> DrivepickResult<usize> {
        let removed = {
            let mut entries = self.entries.write().await;
            folder_ids
                .iter()
                .filter(|id| entries.remove(**id).is_some())
                .count()
        };
        if removed > 0 {
            debug!("cache: evicted {} entries", removed);
            self.persist().await?;
        }
        Ok(removed)
    }

    /// Drop every entry and persist the empty document
    pub async fn clear(&self) -> DrivepickResult<usize> {
        let removed = {
            let mut entries = self.entries.write().await;
            let n = entries.len();
            entries.clear();
            n
        };
        self.persist().await?;
        Ok(removed)
    }

    /// Entry counts by age
    pub async fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now()).await
    }

    pub(crate) async fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        CacheStats::of_document(&*self.entries.read().await, self.policy, now)
    }

    /// Stats of the document at `path` as stored, before any stale sweep
    ///
    /// Needs no provider, so it works offline.
    pub async fn inspect(path: &Path, policy: CachePolicy) -> DrivepickResult<CacheStats> {
        let document = load_document(path).await?;
        Ok(CacheStats::of_document(&document, policy, Utc::now()))
    }

    /// Copy of the in-memory document
    pub async fn snapshot(&self) -> CacheDocument {
        self.entries.read().await.clone()
    }

    /// Persist only every `every`-th write until [`end_batch`](Self::end_batch)
    ///
    /// Batches nest; the outermost one sets the interval.
    pub fn begin_batch(&self, every: u32) {
        let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
        if batch.depth == 0 {
            batch.every = every.max(1);
            batch.pending = 0;
        }
        batch.depth += 1;
    }

    /// Close a batch; the outermost close persists unconditionally
    pub async fn end_batch(&self) -> DrivepickResult<()> {
        let flush = {
            let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
            batch.depth = batch.depth.saturating_sub(1);
            if batch.depth == 0 {
                batch.pending = 0;
                true
            } else {
                false
            }
        };
        if flush {
            self.persist().await?;
        }
        Ok(())
    }

    async fn after_write(&self) -> DrivepickResult<()> {
        let due = {
            let mut batch = self.batch.lock().unwrap_or_else(|e| e.into_inner());
            if batch.depth == 0 {
                true
            } else {
                batch.pending += 1;
                if batch.pending >= batch.every {
                    batch.pending = 0;
                    true
                } else {
                    false
                }
            }
        };
        if due {
            self.persist().await?;
        }
        Ok(())
    }

    async fn sweep(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut entries = self.entries.write().await;
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| now - entry.time > self.policy.stale_after)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            debug!("cache: delete stale entry '{}'", id);
            entries.remove(id);
        }
        stale
    }

    /// Rewrite the whole document atomically
    async fn persist(&self) -> DrivepickResult<()> {
        let _guard = self.persist_lock.lock().await;
        let content = serde_json::to_vec_pretty(&*self.entries.read().await)?;
        write_atomic(&self.path, &content).await
    }
}

/// Read the cache document, treating a missing or corrupt file as empty
async fn load_document(path: &Path) -> DrivepickResult<CacheDocument> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No cache document at {}, starting empty", path.display());
            return Ok(CacheDocument::new());
        }
        Err(e) => {
            return Err(DrivepickError::io(
                format!("reading cache document {}", path.display()),
                e,
            ))
        }
    };

    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(CacheDocument::new());
    }

    // Invalid UTF-8 fails here too and takes the same reset path
    match serde_json::from_slice::<CacheDocument>(&content) {
        Ok(document) => {
            debug!("Loaded {} cache entries from {}", document.len(), path.display());
            Ok(document)
        }
        Err(e) => {
            warn!("Cache document {} is invalid ({}), resetting", path.display(), e);
            Ok(CacheDocument::new())
        }
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> DrivepickResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DrivepickError::io(format!("creating {}", parent.display()), e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache.json".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    if let Err(e) = fs::write(&tmp, content).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(DrivepickError::io(format!("writing {}", tmp.display()), e));
    }
    fs::rename(&tmp, path).await.map_err(|e| {
        DrivepickError::io(
            format!("moving {} to {}", tmp.display(), path.display()),
            e,
        )
    })
}
