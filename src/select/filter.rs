//! Acceptance filters applied to descended picks

use crate::config::schema::SelectionConfig;
use crate::drive::Node;
use crate::select::{Pick, Rejection};
use std::collections::HashSet;

/// Bytes per configured megabyte
const MEGABYTE: u64 = 1_000_000;

/// Which picks are acceptable
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    supported: HashSet<String>,
    videos: HashSet<String>,
    max_file_size: Option<u64>,
    max_video_secs: Option<u64>,
}

impl AcceptancePolicy {
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self {
            supported: config.supported_mime_types.iter().cloned().collect(),
            videos: config.video_mime_types.iter().cloned().collect(),
            max_file_size: config.max_file_size_mb.map(|mb| mb.saturating_mul(MEGABYTE)),
            max_video_secs: config.max_video_secs,
        }
    }

    /// Checks that only need listing metadata, in order: mime type, then size
    ///
    /// Files without a known size pass the size check.
    pub fn check_metadata(&self, pick: &Pick) -> Option<Rejection> {
        let file = &pick.file;
        if !self.supported.contains(&file.mime_type) {
            return Some(Rejection::UnsupportedType {
                path: pick.path.clone(),
                mime_type: file.mime_type.clone(),
            });
        }

        match (self.max_file_size, file.size) {
            (Some(limit), Some(size)) if size > limit => Some(Rejection::TooLarge {
                path: pick.path.clone(),
                size,
                limit,
            }),
            _ => None,
        }
    }

    /// Whether the file's duration must be probed after download
    pub fn needs_duration_check(&self, file: &Node) -> bool {
        self.max_video_secs.is_some() && self.videos.contains(&file.mime_type)
    }

    /// Check a probed duration against the limit
    pub fn check_duration(&self, path: &str, secs: f64) -> Option<Rejection> {
        match self.max_video_secs {
            Some(limit) if secs > limit as f64 => Some(Rejection::TooLong {
                path: path.to_string(),
                secs,
                limit,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(mime: &str, size: Option<u64>) -> Pick {
        Pick {
            file: Node::file("id", "x", mime, size),
            path: "A/x".to_string(),
            trail: vec!["a".to_string()],
        }
    }

    fn policy(max_mb: Option<u64>, max_secs: Option<u64>) -> AcceptancePolicy {
        AcceptancePolicy::from_config(&SelectionConfig {
            max_file_size_mb: max_mb,
            max_video_secs: max_secs,
            ..SelectionConfig::default()
        })
    }

    #[test]
    fn unsupported_type_rejected_first() {
        let r = policy(Some(1), None).check_metadata(&pick("text/plain", Some(5_000_000)));
        assert!(matches!(r, Some(Rejection::UnsupportedType { .. })));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let p = policy(Some(2), None);
        assert!(p.check_metadata(&pick("image/jpeg", Some(2_000_000))).is_none());
        assert!(matches!(
            p.check_metadata(&pick("image/jpeg", Some(2_000_001))),
            Some(Rejection::TooLarge { limit: 2_000_000, .. })
        ));
        assert!(p.check_metadata(&pick("image/jpeg", None)).is_none());
    }

    #[test]
    fn no_size_limit_by_default() {
        let p = policy(None, None);
        assert!(p.check_metadata(&pick("video/mp4", Some(u64::MAX))).is_none());
    }

    #[test]
    fn huge_size_limit_saturates() {
        let p = policy(Some(u64::MAX), None);
        assert!(p.check_metadata(&pick("image/jpeg", Some(u64::MAX))).is_none());
    }

    #[test]
    fn duration_checked_only_for_videos_with_limit() {
        let file = Node::file("v", "v.mp4", "video/mp4", None);
        let image = Node::file("i", "i.jpg", "image/jpeg", None);
        assert!(!policy(None, None).needs_duration_check(&file));
        assert!(policy(None, Some(60)).needs_duration_check(&file));
        assert!(!policy(None, Some(60)).needs_duration_check(&image));
    }

    #[test]
    fn duration_over_limit_rejected() {
        let p = policy(None, Some(60));
        assert!(p.check_duration("v.mp4", 59.9).is_none());
        assert!(p.check_duration("v.mp4", 60.0).is_none());
        assert!(matches!(
            p.check_duration("v.mp4", 61.2),
            Some(Rejection::TooLong { limit: 60, .. })
        ));
    }
}
