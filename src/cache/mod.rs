//! Persistent metadata cache of the remote folder tree
//!
//! Mirrors folder structure only: IDs, names, mime types, sizes and
//! per-folder child counts. File contents are never cached.
//!
//! # Entry Lifecycle
//!
//! | Age | On access | On open |
//! |-----|-----------|---------|
//! | < TTL | served from cache | kept |
//! | TTL ..= stale horizon | refetched | kept |
//! | > stale horizon | refetched | dropped |

pub mod folder;
pub mod store;

pub use folder::{filter_nodes, CacheEntry, Folder};
pub use store::{CacheDocument, CachePolicy, CacheStats, FolderCache};
