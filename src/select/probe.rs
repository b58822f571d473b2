//! Media duration probing
//!
//! Duration is not part of the listing metadata, so videos are probed
//! after they have been downloaded.

use crate::error::{DrivepickError, DrivepickResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Reads the playing time of a local media file
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration in seconds
    async fn duration_secs(&self, path: &Path) -> DrivepickResult<f64>;
}

/// Duration probe backed by the `ffprobe` binary
#[derive(Debug, Clone)]
pub struct Ffprobe {
    binary: String,
}

impl Ffprobe {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// Extract `format.duration` from ffprobe's JSON output
fn parse_duration(output: &str) -> Result<f64, String> {
    let json: serde_json::Value =
        serde_json::from_str(output).map_err(|e| format!("invalid ffprobe JSON: {}", e))?;

    json["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| "ffprobe reported no duration".to_string())
}

#[async_trait]
impl DurationProbe for Ffprobe {
    async fn duration_secs(&self, path: &Path) -> DrivepickResult<f64> {
        let probe_err = |reason: String| DrivepickError::Probe {
            path: path.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| probe_err(format!("running {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(probe_err(format!("{} exited with {}", self.binary, output.status)));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout)).map_err(probe_err)
    }
}
