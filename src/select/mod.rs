//! Random media selection over the cached folder tree
//!
//! 1. Top-level folders are weighted by the number of files in their
//!    subtree ([`weights`]), so busier folders come up more often.
//! 2. From the chosen folder, [`descent`] walks down uniformly: every
//!    subfolder is one choice and "a file from here" is one more.
//! 3. [`picker`] applies the acceptance filters and retries rejected draws.
//!
//! Draws that land on an empty folder or an unwanted file are ordinary
//! outcomes ([`Attempt::Rejected`]), not errors.

pub mod descent;
pub mod filter;
pub mod picker;
pub mod probe;
pub mod weights;

pub use descent::descend;
pub use filter::AcceptancePolicy;
pub use picker::{PickedMedia, Picker};
pub use probe::{DurationProbe, Ffprobe};
pub use weights::{Distribution, WalkOptions, WalkReport, WeightBuilder, WeightedFolder};

use crate::drive::Node;
use std::fmt;

/// Deepest folder level walked before assuming a cycle
pub const MAX_DEPTH: usize = 64;

/// A file reached by descent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    /// The chosen file
    pub file: Node,
    /// `/`-joined folder names ending in the file name
    pub path: String,
    /// IDs of the folders walked through, outermost first
    pub trail: Vec<String>,
}

/// Why a draw was thrown away
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Reached a folder with no children
    EmptyDirectory { folder_id: String, path: String },
    /// Mime type not in the supported set
    UnsupportedType { path: String, mime_type: String },
    /// File larger than the configured limit
    TooLarge { path: String, size: u64, limit: u64 },
    /// Video longer than the configured limit
    TooLong { path: String, secs: f64, limit: u64 },
    /// Duration could not be determined
    ProbeFailed { path: String, reason: String },
    /// The remote no longer has a node the cache pointed at
    StaleReference { id: String, trail: Vec<String> },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDirectory { folder_id, path } => {
                write!(f, "empty directory '{}' ({})", path, folder_id)
            }
            Self::UnsupportedType { path, mime_type } => {
                write!(f, "unsupported file type '{}' ('{}')", mime_type, path)
            }
            Self::TooLarge { path, size, limit } => {
                write!(f, "file too large, {} > {} bytes ('{}')", size, limit, path)
            }
            Self::TooLong { path, secs, limit } => {
                write!(f, "video too long, {:.1}s > {}s ('{}')", secs, limit, path)
            }
            Self::ProbeFailed { path, reason } => {
                write!(f, "could not read duration of '{}': {}", path, reason)
            }
            Self::StaleReference { id, .. } => {
                write!(f, "remote node '{}' not found, probably a stale cache entry", id)
            }
        }
    }
}

/// Outcome of one selection step
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Accepted(T),
    Rejected(Rejection),
}

impl<T> Attempt<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}
