//! Remote folder tree abstraction
//!
//! Listing and content fetching are consumed through traits so the cache
//! and the selectors work the same against Google Drive, a local directory,
//! or an in-memory tree in tests.

use crate::error::DrivepickResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mime type the remote uses to mark folders. Compared by equality only.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder as returned by a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    /// Opaque, stable remote identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Remote mime type
    pub mime_type: String,

    /// Size in bytes, present for files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Node {
    /// Create a folder node
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            size: None,
        }
    }

    /// Create a file node
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    /// Whether this node is a folder
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Lists the direct children of remote folders
///
/// Implementations own pagination, authentication and network retries.
/// A node that does not exist must be reported as
/// [`DrivepickError::NotFound`](crate::error::DrivepickError::NotFound).
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Fetch a single node's metadata
    async fn get_node(&self, id: &str) -> DrivepickResult<Node>;

    /// Fetch every direct child of a folder
    async fn list_children(&self, folder_id: &str) -> DrivepickResult<Vec<Node>>;

    /// Human-readable provider name for display
    fn provider_name(&self) -> &'static str;
}

/// Downloads file contents to a local path
#[async_trait]
pub trait ContentFetch: Send + Sync {
    /// Write the contents of `file_id` to `destination`
    async fn download(&self, file_id: &str, destination: &Path) -> DrivepickResult<()>;
}
