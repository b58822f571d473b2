//! Cached folder snapshots
//!
//! A [`Folder`] holds a folder's direct children together with their counts.
//! The counts are derived from the children when the folder is built and
//! checked again on deserialization, so they can never drift apart.

use crate::drive::Node;
use crate::error::{DrivepickError, DrivepickResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A materialized folder: its direct children and their counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FolderRecord", into = "FolderRecord")]
pub struct Folder {
    id: String,
    name: String,
    nr_folders: usize,
    nr_files: usize,
    nodes: Vec<Node>,
}

/// On-disk shape of a folder
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FolderRecord {
    id: String,
    name: String,
    nr_folders: usize,
    nr_files: usize,
    nodes: Vec<Node>,
}

impl Folder {
    /// Build a folder from a fresh listing, counting folders and files
    pub fn new(id: impl Into<String>, name: impl Into<String>, nodes: Vec<Node>) -> Self {
        let nr_folders = nodes.iter().filter(|n| n.is_folder()).count();
        Self {
            id: id.into(),
            name: name.into(),
            nr_folders,
            nr_files: nodes.len() - nr_folders,
            nodes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of direct subfolders
    pub fn nr_folders(&self) -> usize {
        self.nr_folders
    }

    /// Number of direct files
    pub fn nr_files(&self) -> usize {
        self.nr_files
    }

    /// All direct children in listing order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Direct subfolders in listing order
    pub fn subfolders(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_folder())
    }

    /// Direct files in listing order
    pub fn files(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_folder())
    }

    /// No children at all
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TryFrom<FolderRecord> for Folder {
    type Error = String;

    fn try_from(record: FolderRecord) -> Result<Self, Self::Error> {
        let folder = Folder::new(record.id, record.name, record.nodes);
        if folder.nr_folders != record.nr_folders || folder.nr_files != record.nr_files {
            return Err(format!(
                "folder {} claims {} folders / {} files but lists {} / {}",
                folder.id, record.nr_folders, record.nr_files, folder.nr_folders, folder.nr_files
            ));
        }
        Ok(folder)
    }
}

impl From<Folder> for FolderRecord {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            nr_folders: folder.nr_folders,
            nr_files: folder.nr_files,
            nodes: folder.nodes,
        }
    }
}

/// A folder snapshot and the time it was fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// When the listing was fetched
    pub time: DateTime<Utc>,

    /// The listing
    pub folder: Folder,
}

/// Return the nodes of the requested categories, keeping their order
pub fn filter_nodes(
    nodes: &[Node],
    include_folders: bool,
    include_files: bool,
) -> DrivepickResult<Vec<&Node>> {
    match (include_folders, include_files) {
        (false, false) => Err(DrivepickError::InvalidFilter),
        (true, true) => Ok(nodes.iter().collect()),
        (true, false) => Ok(nodes.iter().filter(|n| n.is_folder()).collect()),
        (false, true) => Ok(nodes.iter().filter(|n| !n.is_folder()).collect()),
    }
}
