//! Subtree weights and weighted top-level selection
//!
//! Building the distribution walks every folder below the root through the
//! cache, so it doubles as the bulk pre-warm. Cache writes during the walk
//! are batched.

use crate::cache::{Folder, FolderCache};
use crate::config::schema::CacheConfig;
use crate::error::{DrivepickError, DrivepickResult};
use crate::select::MAX_DEPTH;
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// A top-level folder and the number of files in its subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedFolder {
    pub id: String,
    pub name: String,
    pub weight: u64,
}

/// Top-level folders in traversal order with their weights
///
/// Zero weights are kept; they are simply never drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<WeightedFolder>,
}

impl Distribution {
    pub fn new(entries: Vec<WeightedFolder>) -> Self {
        Self { entries }
    }

    /// Sum of all weights
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Weight of a folder, if it is part of the distribution
    pub fn weight(&self, id: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedFolder> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draw a folder with probability proportional to its weight
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> DrivepickResult<&WeightedFolder> {
        let total = self.total();
        if total == 0 {
            return Err(DrivepickError::NoMediaFiles);
        }

        let r = rng.random_range(0..total);
        let mut cumulative = 0u64;
        for entry in &self.entries {
            cumulative += entry.weight;
            if r < cumulative {
                return Ok(entry);
            }
        }
        Err(DrivepickError::Internal(format!(
            "draw {} outside total weight {}",
            r, total
        )))
    }
}

/// How the subtree walk behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Folder fetches in flight across the whole walk
    pub concurrency: usize,
    /// Persist the cache every N fetched folders
    pub persist_every: u32,
    /// Refetch every folder regardless of age
    pub force: bool,
}

impl WalkOptions {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            concurrency: config.walk_concurrency.max(1),
            persist_every: config.persist_every.max(1),
            force: false,
        }
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Totals of a finished walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkReport {
    /// Folders visited, root included
    pub folders: usize,
    /// Files found below the root's subfolders
    pub files: u64,
}

/// Computes subtree file counts through the cache
pub struct WeightBuilder<'a> {
    cache: &'a FolderCache,
    options: WalkOptions,
    visited: Mutex<HashSet<String>>,
    folders: AtomicUsize,
    /// Shared by every level of the recursion
    fetches: Semaphore,
}

impl<'a> WeightBuilder<'a> {
    pub fn new(cache: &'a FolderCache, options: WalkOptions) -> Self {
        Self {
            cache,
            options,
            visited: Mutex::new(HashSet::new()),
            folders: AtomicUsize::new(0),
            fetches: Semaphore::new(options.concurrency.max(1)),
        }
    }

    /// Weight every direct subfolder of `root`
    pub async fn build_distribution(&self, root: &Folder) -> DrivepickResult<Distribution> {
        self.mark_visited(root.id());
        self.folders.fetch_add(1, Ordering::Relaxed);

        self.cache.begin_batch(self.options.persist_every);
        let result = self.weigh_children(root).await;
        self.cache.end_batch().await?;

        let distribution = Distribution::new(result?);
        info!(
            "Weighted {} top-level folders, {} files in {} folders",
            distribution.len(),
            distribution.total(),
            self.folders.load(Ordering::Relaxed)
        );
        Ok(distribution)
    }

    /// Folder and file totals after [`build_distribution`](Self::build_distribution)
    pub fn report(&self, distribution: &Distribution) -> WalkReport {
        WalkReport {
            folders: self.folders.load(Ordering::Relaxed),
            files: distribution.total(),
        }
    }

    async fn weigh_children(&self, root: &Folder) -> DrivepickResult<Vec<WeightedFolder>> {
        let children: Vec<_> = root.subfolders().cloned().collect();
        stream::iter(children)
            .map(|node| async move {
                let weight = match self.fetch_child(root.id(), &node.id, &node.name).await? {
                    Some(folder) => self.subtree_file_count(folder, 1).await?,
                    None => 0,
                };
                debug!("weight '{}' = {}", node.name, weight);
                Ok::<_, DrivepickError>(WeightedFolder {
                    id: node.id,
                    name: node.name,
                    weight,
                })
            })
            .buffered(self.options.concurrency)
            .try_collect()
            .await
    }

    /// Files in `folder` and every folder below it
    pub fn subtree_file_count<'s>(
        &'s self,
        folder: Folder,
        depth: usize,
    ) -> BoxFuture<'s, DrivepickResult<u64>> {
        async move {
            if depth > MAX_DEPTH {
                return Err(DrivepickError::TreeTooDeep {
                    id: folder.id().to_string(),
                    max_depth: MAX_DEPTH,
                });
            }

            let own = folder.nr_files() as u64;
            if folder.nr_folders() == 0 {
                return Ok(own);
            }

            let parent_id = folder.id().to_string();
            let children: Vec<_> = folder.subfolders().cloned().collect();
            let counts: Vec<u64> = stream::iter(children)
                .map(|node| {
                    let parent_id = parent_id.as_str();
                    async move {
                        match self.fetch_child(parent_id, &node.id, &node.name).await? {
                            Some(sub) => self.subtree_file_count(sub, depth + 1).await,
                            None => Ok(0),
                        }
                    }
                })
                .buffered(self.options.concurrency)
                .try_collect()
                .await?;

            Ok(own + counts.iter().sum::<u64>())
        }
        .boxed()
    }

    /// Fetch a subfolder, or `None` if it was already walked or has vanished
    async fn fetch_child(
        &self,
        parent_id: &str,
        id: &str,
        name: &str,
    ) -> DrivepickResult<Option<Folder>> {
        if !self.mark_visited(id) {
            warn!("Folder '{}' ({}) reached twice, skipping", name, id);
            return Ok(None);
        }

        let fetched = {
            let _permit = self
                .fetches
                .acquire()
                .await
                .map_err(|e| DrivepickError::Internal(format!("walk limiter closed: {}", e)))?;
            self.cache.get_named(id, name, self.options.force).await
        };

        match fetched {
            Ok(folder) => {
                self.folders.fetch_add(1, Ordering::Relaxed);
                Ok(Some(folder))
            }
            Err(e) if e.is_not_found() => {
                warn!("Folder '{}' no longer exists, refreshing its parent", name);
                self.cache.evict(&[parent_id]).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns false if the ID was seen before
    fn mark_visited(&self, id: &str) -> bool {
        self.visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.to_string())
    }
}
