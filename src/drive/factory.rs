//! Provider factory
//!
//! Picks the listing/fetch backend named in the configuration.

use crate::config::{Config, ProviderKind};
use crate::drive::google::GoogleDrive;
use crate::drive::local::LocalTree;
use crate::drive::provider::{ContentFetch, ListingProvider};
use crate::error::{DrivepickError, DrivepickResult};
use std::sync::Arc;

/// The listing and fetch halves of one backend
#[derive(Clone)]
pub struct Source {
    /// Folder listings
    pub listing: Arc<dyn ListingProvider>,
    /// File downloads
    pub fetch: Arc<dyn ContentFetch>,
}

impl Source {
    /// Use one value for both halves
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: ListingProvider + ContentFetch + 'static,
    {
        Self {
            listing: provider.clone(),
            fetch: provider,
        }
    }
}

/// Create the backend configured in `config.source`
pub fn create_source(config: &Config) -> DrivepickResult<Source> {
    match config.source.provider {
        ProviderKind::Google => Ok(Source::from_provider(Arc::new(GoogleDrive::from_config(
            &config.source,
        )?))),
        ProviderKind::Local => {
            let root = config.source.local_root.clone().ok_or_else(|| {
                DrivepickError::ConfigMissing("source.local_root".to_string())
            })?;
            Ok(Source::from_provider(Arc::new(LocalTree::new(root))))
        }
    }
}

/// The configured root folder ID, required for selection
pub fn root_folder_id(config: &Config) -> DrivepickResult<String> {
    match (&config.source.root_folder_id, config.source.provider) {
        (Some(id), _) => Ok(id.clone()),
        (None, ProviderKind::Local) => Ok(crate::drive::local::ROOT_ID.to_string()),
        (None, ProviderKind::Google) => Err(DrivepickError::ConfigMissing(
            "source.root_folder_id".to_string(),
        )),
    }
}
