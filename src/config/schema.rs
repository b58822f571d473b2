//! Configuration schema for drivepick
//!
//! Configuration is stored at `~/.config/drivepick/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Remote folder tree settings
    pub source: SourceConfig,

    /// Folder metadata cache settings
    pub cache: CacheConfig,

    /// Random selection settings
    pub selection: SelectionConfig,

    /// Local download settings
    pub download: DownloadConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append every accepted pick to the history log
    pub history: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            history: true,
        }
    }
}

/// Which listing provider backs the folder tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Drive v3 REST API
    #[default]
    Google,
    /// A local directory treated as the remote tree
    Local,
}

/// Remote folder tree settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listing provider
    pub provider: ProviderKind,

    /// ID of the folder whose subfolders are weighted against each other
    pub root_folder_id: Option<String>,

    /// Shared drive ID (optional)
    pub drive_id: Option<String>,

    /// Environment variable holding the OAuth bearer token
    pub access_token_env: String,

    /// Root directory for the local provider
    pub local_root: Option<PathBuf>,

    /// Requested page size for folder listings
    pub page_size: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            root_folder_id: None,
            drive_id: None,
            access_token_env: "DRIVEPICK_TOKEN".to_string(),
            local_root: None,
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

/// Folder metadata cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache document path (defaults to the state directory)
    pub file: Option<PathBuf>,

    /// Entries younger than this are served without a remote call
    pub ttl_hours: u32,

    /// Entries older than this are dropped at startup
    pub stale_days: u32,

    /// During bulk walks, persist only every N-th write
    pub persist_every: u32,

    /// Number of sibling folders walked concurrently
    pub walk_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: None,
            ttl_hours: 720,
            stale_days: 60,
            persist_every: 5,
            walk_concurrency: 4,
        }
    }
}

/// Random selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Attempts per pick before giving up
    pub max_attempts: u32,

    /// Mime types that may be picked
    pub supported_mime_types: Vec<String>,

    /// Mime types whose duration is checked after download
    pub video_mime_types: Vec<String>,

    /// Largest accepted file in MB (unset = no limit)
    pub max_file_size_mb: Option<u64>,

    /// Longest accepted video in seconds (unset = no limit)
    pub max_video_secs: Option<u64>,

    /// ffprobe binary used for duration checks
    pub ffprobe: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            supported_mime_types: [
                "image/jpeg",
                "image/png",
                "image/heif",
                "image/x-photoshop",
                "image/cr2",
                "video/mp4",
                "video/mpeg",
                "video/quicktime",
                "video/x-ms-wmv",
                "video/x-msvideo",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            video_mime_types: ["video/mp4", "video/mpeg", "video/quicktime", "video/x-msvideo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_mb: None,
            max_video_secs: None,
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// Local download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Download directory (defaults to the state directory)
    pub dir: Option<PathBuf>,

    /// Number of recent downloads kept on disk
    pub keep: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            keep: 10,
        }
    }
}

impl Config {
    /// Check cross-field constraints, returning a description of the first violation
    pub fn validate(&self) -> Result<(), String> {
        if self.selection.max_attempts == 0 {
            return Err("selection.max_attempts must be at least 1".to_string());
        }
        if self.cache.persist_every == 0 {
            return Err("cache.persist_every must be at least 1".to_string());
        }
        if self.cache.walk_concurrency == 0 {
            return Err("cache.walk_concurrency must be at least 1".to_string());
        }
        if u64::from(self.cache.stale_days) * 24 <= u64::from(self.cache.ttl_hours) {
            return Err(format!(
                "cache.stale_days ({} days) must be longer than cache.ttl_hours ({} hours)",
                self.cache.stale_days, self.cache.ttl_hours
            ));
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            ));
        }
        Ok(())
    }
}
