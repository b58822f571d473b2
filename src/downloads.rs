//! Download rotation
//!
//! Only the most recent downloads are kept on disk; older ones are deleted
//! as new picks arrive. Only files carrying [`DOWNLOAD_PREFIX`] are ever
//! touched, so the download directory may hold other files.

use crate::error::{DrivepickError, DrivepickResult};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, warn};

/// Leading part of every downloaded file name
pub const DOWNLOAD_PREFIX: &str = "drivepick-";

/// Whether `name` looks like a file this tool downloaded
pub fn is_download(name: &str) -> bool {
    name.starts_with(DOWNLOAD_PREFIX)
}

/// Bounded set of downloaded files, oldest first
#[derive(Debug)]
pub struct RecentDownloads {
    keep: usize,
    recent: VecDeque<PathBuf>,
}

impl RecentDownloads {
    /// Scan `dir` for earlier downloads, ordered by modification time
    ///
    /// Hidden files (partial downloads) and files without the download
    /// prefix are ignored. `keep` is at least 1.
    pub async fn open(dir: &Path, keep: usize) -> DrivepickResult<Self> {
        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();

        match fs::read_dir(dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await.map_err(|e| {
                    DrivepickError::io(format!("reading download directory {}", dir.display()), e)
                })? {
                    if !is_download(&entry.file_name().to_string_lossy()) {
                        continue;
                    }
                    let Ok(meta) = entry.metadata().await else {
                        continue;
                    };
                    if meta.is_file() {
                        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                        found.push((modified, entry.path()));
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(DrivepickError::io(
                    format!("reading download directory {}", dir.display()),
                    e,
                ))
            }
        }

        found.sort();
        let mut downloads = Self {
            keep: keep.max(1),
            recent: found.into_iter().map(|(_, path)| path).collect(),
        };
        downloads.rotate().await;
        Ok(downloads)
    }

    /// Track a new download, deleting the oldest ones over the limit
    pub async fn push(&mut self, path: PathBuf) {
        self.recent.retain(|p| p != &path);
        self.recent.push_back(path);
        self.rotate().await;
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.recent.iter()
    }

    async fn rotate(&mut self) {
        while self.recent.len() > self.keep {
            let Some(old) = self.recent.pop_front() else {
                break;
            };
            match fs::remove_file(&old).await {
                Ok(()) => debug!("Removed old download {}", old.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove old download {}: {}", old.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, name).await.unwrap();
        path
    }

    #[tokio::test]
    async fn keeps_only_most_recent() {
        let dir = TempDir::new().unwrap();
        let mut downloads = RecentDownloads::open(dir.path(), 2).await.unwrap();
        assert!(downloads.is_empty());

        let a = touch(&dir, "drivepick-a-a.jpg").await;
        downloads.push(a.clone()).await;
        let b = touch(&dir, "drivepick-b-b.jpg").await;
        downloads.push(b.clone()).await;
        let c = touch(&dir, "drivepick-c-c.jpg").await;
        downloads.push(c.clone()).await;

        assert_eq!(downloads.len(), 2);
        assert!(!a.exists());
        assert!(b.exists() && c.exists());
    }

    #[tokio::test]
    async fn repeated_pick_is_not_counted_twice() {
        let dir = TempDir::new().unwrap();
        let mut downloads = RecentDownloads::open(dir.path(), 2).await.unwrap();

        let a = touch(&dir, "drivepick-a-a.jpg").await;
        downloads.push(a.clone()).await;
        downloads.push(a.clone()).await;

        assert_eq!(downloads.len(), 1);
        assert!(a.exists());
    }

    #[tokio::test]
    async fn open_rotates_existing_files() {
        let dir = TempDir::new().unwrap();
        let old = touch(&dir, "drivepick-1-old.jpg").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let new = touch(&dir, "drivepick-2-new.jpg").await;
        touch(&dir, ".partial.part").await;

        let downloads = RecentDownloads::open(dir.path(), 1).await.unwrap();

        assert_eq!(downloads.iter().collect::<Vec<_>>(), [&new]);
        assert!(!old.exists());
        assert!(dir.path().join(".partial.part").exists());
    }

    #[tokio::test]
    async fn unrelated_files_survive_rotation() {
        let dir = TempDir::new().unwrap();
        let holiday = touch(&dir, "holiday.jpg").await;
        let notes = touch(&dir, "notes.txt").await;
        let first = touch(&dir, "drivepick-1-a.jpg").await;

        let mut downloads = RecentDownloads::open(dir.path(), 1).await.unwrap();
        assert_eq!(downloads.len(), 1);

        let second = touch(&dir, "drivepick-2-b.jpg").await;
        downloads.push(second.clone()).await;

        assert!(!first.exists());
        assert!(second.exists());
        assert!(holiday.exists() && notes.exists());
    }

    #[test]
    fn recognizes_download_names() {
        assert!(is_download("drivepick-1AbC-beach.jpg"));
        assert!(!is_download("beach.jpg"));
        assert!(!is_download(".drivepick-1AbC-beach.jpg.part"));
    }

    #[tokio::test]
    async fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let downloads = RecentDownloads::open(&dir.path().join("nope"), 3)
            .await
            .unwrap();
        assert!(downloads.is_empty());
    }
}
