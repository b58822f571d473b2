//! Remote folder tree backends
//!
//! - Google Drive v3 (`google`)
//! - A local directory (`local`)

mod factory;
pub mod google;
pub mod local;
#[cfg(test)]
pub(crate) mod memory;
mod provider;

pub use factory::{create_source, root_folder_id, Source};
pub use google::GoogleDrive;
pub use local::LocalTree;
pub use provider::{ContentFetch, ListingProvider, Node, FOLDER_MIME_TYPE};
