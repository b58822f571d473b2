//! A local directory served as if it were the remote folder tree
//!
//! Node IDs are `/`-separated paths relative to the root, the root itself
//! is [`ROOT_ID`]. Useful offline and for end-to-end tests.

use crate::drive::provider::{ContentFetch, ListingProvider, Node, FOLDER_MIME_TYPE};
use crate::error::{DrivepickError, DrivepickResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// ID of the tree root
pub const ROOT_ID: &str = ".";

/// Guess a mime type from a file extension
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "heic" | "heif" => "image/heif",
        "psd" => "image/x-photoshop",
        "cr2" => "image/cr2",
        "mp4" | "m4v" => "video/mp4",
        "mpg" | "mpeg" => "video/mpeg",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "avi" => "video/x-msvideo",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Local directory tree provider
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    /// Serve the tree below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an ID to a path below the root, refusing escapes
    fn resolve(&self, id: &str) -> DrivepickResult<PathBuf> {
        if id == ROOT_ID {
            return Ok(self.root.clone());
        }
        let relative = Path::new(id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(DrivepickError::NotFound { id: id.to_string() });
        }
        Ok(self.root.join(relative))
    }

    fn child_id(parent: &str, name: &str) -> String {
        if parent == ROOT_ID {
            name.to_string()
        } else {
            format!("{}/{}", parent, name)
        }
    }

    fn map_io(id: &str, context: String, e: std::io::Error) -> DrivepickError {
        if e.kind() == ErrorKind::NotFound {
            DrivepickError::NotFound { id: id.to_string() }
        } else {
            DrivepickError::io(context, e)
        }
    }

    async fn node_at(&self, id: String, path: &Path) -> DrivepickResult<Node> {
        // Follows symlinks; a looping link shows up as an ever deeper tree.
        let meta = fs::metadata(path)
            .await
            .map_err(|e| Self::map_io(&id, format!("reading {}", path.display()), e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.clone());

        if meta.is_dir() {
            Ok(Node {
                id,
                name,
                mime_type: FOLDER_MIME_TYPE.to_string(),
                size: None,
            })
        } else {
            Ok(Node {
                id,
                name,
                mime_type: mime_for_path(path).to_string(),
                size: Some(meta.len()),
            })
        }
    }
}

#[async_trait]
impl ListingProvider for LocalTree {
    async fn get_node(&self, id: &str) -> DrivepickResult<Node> {
        let path = self.resolve(id)?;
        self.node_at(id.to_string(), &path).await
    }

    async fn list_children(&self, folder_id: &str) -> DrivepickResult<Vec<Node>> {
        let dir = self.resolve(folder_id)?;
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| Self::map_io(folder_id, format!("listing {}", dir.display()), e))?;

        let mut nodes = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DrivepickError::io(format!("listing {}", dir.display()), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let id = Self::child_id(folder_id, &name);
            match self.node_at(id, &entry.path()).await {
                Ok(node) => nodes.push(node),
                // Dangling symlink or entry removed mid-listing
                Err(DrivepickError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    fn provider_name(&self) -> &'static str {
        "local directory"
    }
}

#[async_trait]
impl ContentFetch for LocalTree {
    async fn download(&self, file_id: &str, destination: &Path) -> DrivepickResult<()> {
        let source = self.resolve(file_id)?;
        fs::copy(&source, destination).await.map_err(|e| {
            Self::map_io(
                file_id,
                format!("copying {} to {}", source.display(), destination.display()),
                e,
            )
        })?;
        Ok(())
    }
}
