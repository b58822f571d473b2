//! CLI command implementations

pub mod cache;
pub mod config;
pub mod pick;
pub mod warm;
pub mod weights;

pub use cache::execute as cache;
pub use config::execute as config;
pub use pick::execute as pick;
pub use warm::execute as warm;
pub use weights::execute as weights;

use crate::cache::{CachePolicy, FolderCache};
use crate::config::{Config, ConfigManager};
use crate::drive::{create_source, root_folder_id, Source};
use crate::error::DrivepickResult;
use crate::select::Picker;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Open the configured source and its folder cache
pub(crate) async fn open_cache(config: &Config) -> DrivepickResult<(Source, Arc<FolderCache>)> {
    let source = create_source(config)?;
    let path = ConfigManager::cache_file_path(config);
    debug!(
        "Opening {} cache at {}",
        source.listing.provider_name(),
        path.display()
    );
    let cache = FolderCache::open(
        path,
        CachePolicy::from_config(&config.cache),
        source.listing.clone(),
    )
    .await?;
    Ok((source, Arc::new(cache)))
}

/// Build a picker over the configured root folder
pub(crate) async fn open_picker(config: &Config) -> DrivepickResult<Picker> {
    let root_id = root_folder_id(config)?;
    let (source, cache) = open_cache(config).await?;
    Ok(Picker::new(cache, &source, root_id, config))
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
