//! Selection orchestrator
//!
//! Each attempt draws a weighted top-level folder, descends uniformly to a
//! file, filters it, downloads it and, for videos, probes its duration.
//! Rejected attempts are retried until the attempt budget runs out.

use crate::cache::FolderCache;
use crate::config::{Config, ConfigManager};
use crate::downloads::DOWNLOAD_PREFIX;
use crate::drive::{ContentFetch, Node, Source};
use crate::error::{DrivepickError, DrivepickResult};
use crate::select::descent::descend;
use crate::select::filter::AcceptancePolicy;
use crate::select::probe::{DurationProbe, Ffprobe};
use crate::select::weights::{Distribution, WalkOptions, WalkReport, WeightBuilder};
use crate::select::{Attempt, Pick, Rejection};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// An accepted, downloaded pick
#[derive(Debug, Clone, PartialEq)]
pub struct PickedMedia {
    /// The remote file
    pub file: Node,
    /// Path from the root, starting with the top-level folder name
    pub path: String,
    /// Where the file was downloaded to
    pub local_path: PathBuf,
    /// Attempts used, the successful one included
    pub attempts: u32,
}

struct PickerState {
    rng: StdRng,
    /// Built on first use, dropped when a stale reference is found
    distribution: Option<Distribution>,
}

/// Picks random media below a root folder
pub struct Picker {
    cache: Arc<FolderCache>,
    fetch: Arc<dyn ContentFetch>,
    probe: Arc<dyn DurationProbe>,
    root_id: String,
    acceptance: AcceptancePolicy,
    max_attempts: u32,
    walk: WalkOptions,
    download_dir: PathBuf,
    state: Mutex<PickerState>,
}

impl Picker {
    pub fn new(
        cache: Arc<FolderCache>,
        source: &Source,
        root_id: impl Into<String>,
        config: &Config,
    ) -> Self {
        Self {
            cache,
            fetch: source.fetch.clone(),
            probe: Arc::new(Ffprobe::new(config.selection.ffprobe.clone())),
            root_id: root_id.into(),
            acceptance: AcceptancePolicy::from_config(&config.selection),
            max_attempts: config.selection.max_attempts.max(1),
            walk: WalkOptions::from_config(&config.cache),
            download_dir: ConfigManager::download_dir(config),
            state: Mutex::new(PickerState {
                rng: StdRng::from_os_rng(),
                distribution: None,
            }),
        }
    }

    /// Use a different duration probe
    pub fn with_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Use a seeded generator
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.state.get_mut().rng = rng;
        self
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// The top-level distribution, building it if needed
    pub async fn distribution(&self) -> DrivepickResult<Distribution> {
        let mut state = self.state.lock().await;
        if let Some(distribution) = &state.distribution {
            return Ok(distribution.clone());
        }
        let (distribution, _) = self.walk_tree(false).await?;
        state.distribution = Some(distribution.clone());
        Ok(distribution)
    }

    /// Walk the whole tree into the cache, refetching everything if `force`
    pub async fn warm(&self, force: bool) -> DrivepickResult<WalkReport> {
        let mut state = self.state.lock().await;
        let (distribution, report) = self.walk_tree(force).await?;
        state.distribution = Some(distribution);
        Ok(report)
    }

    async fn walk_tree(&self, force: bool) -> DrivepickResult<(Distribution, WalkReport)> {
        let root = self.cache.get(&self.root_id, force).await?;
        let builder = WeightBuilder::new(&self.cache, self.walk.forced(force));
        let distribution = builder.build_distribution(&root).await?;
        let report = builder.report(&distribution);
        Ok((distribution, report))
    }

    /// Pick, download and return one acceptable media file
    pub async fn pick_media(&self) -> DrivepickResult<PickedMedia> {
        let mut state = self.state.lock().await;
        let mut last: Option<Rejection> = None;

        for attempt in 1..=self.max_attempts {
            if state.distribution.is_none() {
                let (distribution, _) = self.walk_tree(false).await?;
                state.distribution = Some(distribution);
            }

            match self.attempt(&mut state).await? {
                Attempt::Accepted(mut picked) => {
                    picked.attempts = attempt;
                    info!("Picked '{}' after {} attempt(s)", picked.path, attempt);
                    return Ok(picked);
                }
                Attempt::Rejected(rejection) => {
                    info!(
                        "Attempt {}/{} rejected: {}",
                        attempt, self.max_attempts, rejection
                    );
                    if let Rejection::StaleReference { id, trail } = &rejection {
                        self.forget_stale(id, trail).await?;
                        state.distribution = None;
                    }
                    last = Some(rejection);
                }
            }
        }

        Err(DrivepickError::AttemptsExhausted {
            attempts: self.max_attempts,
            last: last.map(|r| r.to_string()).unwrap_or_default(),
        })
    }

    async fn attempt(&self, state: &mut PickerState) -> DrivepickResult<Attempt<PickedMedia>> {
        let PickerState { rng, distribution } = state;
        let top = distribution
            .as_ref()
            .ok_or_else(|| DrivepickError::Internal("distribution not built".to_string()))?
            .pick(rng)?
            .clone();
        debug!("Top-level folder '{}'", top.name);

        let folder = match self.cache.get_named(&top.id, &top.name, false).await {
            Ok(folder) => folder,
            Err(e) if e.is_not_found() => {
                return Ok(Attempt::Rejected(Rejection::StaleReference {
                    id: top.id,
                    trail: Vec::new(),
                }))
            }
            Err(e) => return Err(e),
        };

        let mut pick = match descend(&self.cache, folder, rng).await? {
            Attempt::Accepted(pick) => pick,
            Attempt::Rejected(Rejection::EmptyDirectory { folder_id, path }) => {
                return Ok(Attempt::Rejected(Rejection::EmptyDirectory {
                    folder_id,
                    path: join_path(&top.name, &path),
                }))
            }
            Attempt::Rejected(rejection) => return Ok(Attempt::Rejected(rejection)),
        };
        pick.path = join_path(&top.name, &pick.path);

        if let Some(rejection) = self.acceptance.check_metadata(&pick) {
            return Ok(Attempt::Rejected(rejection));
        }

        self.fetch_and_probe(pick).await
    }

    async fn fetch_and_probe(&self, pick: Pick) -> DrivepickResult<Attempt<PickedMedia>> {
        fs::create_dir_all(&self.download_dir).await.map_err(|e| {
            DrivepickError::io(
                format!("creating download directory {}", self.download_dir.display()),
                e,
            )
        })?;
        let local_path = self.download_dir.join(local_file_name(&pick.file));

        match self.fetch.download(&pick.file.id, &local_path).await {
            Ok(()) => debug!("Downloaded '{}' to {}", pick.path, local_path.display()),
            Err(e) if e.is_not_found() => {
                return Ok(Attempt::Rejected(Rejection::StaleReference {
                    id: pick.file.id,
                    trail: pick.trail,
                }))
            }
            Err(e) => return Err(e),
        }

        if self.acceptance.needs_duration_check(&pick.file) {
            let rejection = match self.probe.duration_secs(&local_path).await {
                Ok(secs) => self.acceptance.check_duration(&pick.path, secs),
                Err(e) => Some(Rejection::ProbeFailed {
                    path: pick.path.clone(),
                    reason: e.to_string(),
                }),
            };
            if let Some(rejection) = rejection {
                discard(&local_path).await;
                return Ok(Attempt::Rejected(rejection));
            }
        }

        Ok(Attempt::Accepted(PickedMedia {
            file: pick.file,
            path: pick.path,
            local_path,
            attempts: 0,
        }))
    }

    /// Evict every cached folder that may still point at a vanished node
    async fn forget_stale(&self, id: &str, trail: &[String]) -> DrivepickResult<()> {
        let mut ids: Vec<&str> = trail.iter().map(String::as_str).collect();
        ids.push(&self.root_id);
        ids.push(id);
        let evicted = self.cache.evict(&ids).await?;
        debug!("Evicted {} cache entries after stale reference", evicted);
        Ok(())
    }
}

fn join_path(parent: &str, rest: &str) -> String {
    if rest.is_empty() {
        parent.to_string()
    } else {
        format!("{}/{}", parent, rest)
    }
}

/// `drivepick-<id>-<name>` with path separators replaced
fn local_file_name(file: &Node) -> String {
    let clean = |s: &str| s.replace(['/', '\\'], "_");
    format!("{}{}-{}", DOWNLOAD_PREFIX, clean(&file.id), clean(&file.name))
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        warn!("Failed to remove rejected download {}: {}", path.display(), e);
    }
}
