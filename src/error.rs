//! Error types for drivepick
//!
//! All modules use `DrivepickResult<T>` as their return type. Expected
//! outcomes of random selection (empty folders, filtered files) are not
//! errors; see [`crate::select::Rejection`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for drivepick operations
pub type DrivepickResult<T> = Result<T, DrivepickError>;

/// All errors that can occur in drivepick
#[derive(Error, Debug)]
pub enum DrivepickError {
    // Remote source errors
    #[error("Remote node not found: {id}")]
    NotFound { id: String },

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Remote request to {endpoint} failed with HTTP {status}: {body}")]
    RemoteStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Access token not set. Export it in ${0}")]
    TokenMissing(String),

    // Selection errors
    #[error("No media files found anywhere below the root folder")]
    NoMediaFiles,

    #[error("Picking a random file failed {attempts} times in a row, last: {last}")]
    AttemptsExhausted { attempts: u32, last: String },

    #[error("Folder tree below {id} is deeper than {max_depth} levels, refusing to walk further")]
    TreeTooDeep { id: String, max_depth: usize },

    #[error("Cannot filter nodes: neither files nor folders were requested")]
    InvalidFilter,

    #[error("Failed to probe media duration of {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Missing configuration value: {0}")]
    ConfigMissing(String),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DrivepickError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if the remote reported the node as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::TokenMissing(_) => {
                Some("Obtain an OAuth token with the drive.readonly scope, e.g. gcloud auth print-access-token")
            }
            Self::ConfigMissing(_) => Some("Run: drivepick config set source.root_folder_id <ID>"),
            Self::NoMediaFiles => Some("Check source.root_folder_id, or run: drivepick warm --force"),
            Self::AttemptsExhausted { .. } => {
                Some("Raise selection.max_attempts or widen selection.supported_mime_types")
            }
            Self::RemoteStatus { status: 401, .. } => Some("The access token is invalid or expired"),
            _ => None,
        }
    }
}
