//! In-memory folder tree for tests

use crate::drive::provider::{ContentFetch, ListingProvider, Node};
use crate::error::{DrivepickError, DrivepickResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Folder tree held in memory, counting remote listings
#[derive(Default)]
pub struct MemoryTree {
    folders: Mutex<HashMap<String, (String, Vec<Node>)>>,
    listings: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder with its direct children
    pub fn with_folder(self, id: &str, name: &str, children: Vec<Node>) -> Self {
        self.folders
            .lock()
            .unwrap()
            .insert(id.to_string(), (name.to_string(), children));
        self
    }

    /// Delay every listing, so concurrent listings overlap
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace a folder's children remotely
    pub fn set_folder(&self, id: &str, name: &str, children: Vec<Node>) {
        self.folders
            .lock()
            .unwrap()
            .insert(id.to_string(), (name.to_string(), children));
    }

    /// Delete a folder remotely
    pub fn remove(&self, id: &str) {
        self.folders.lock().unwrap().remove(id);
    }

    /// Number of `list_children` calls served
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Highest number of `list_children` calls running at once
    pub fn max_concurrent_listings(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn find_file(&self, id: &str) -> Option<Node> {
        self.folders
            .lock()
            .unwrap()
            .values()
            .flat_map(|(_, children)| children.iter())
            .find(|n| n.id == id && !n.is_folder())
            .cloned()
    }
}

#[async_trait]
impl ListingProvider for MemoryTree {
    async fn get_node(&self, id: &str) -> DrivepickResult<Node> {
        if let Some((name, _)) = self.folders.lock().unwrap().get(id) {
            return Ok(Node::folder(id, name.clone()));
        }
        self.find_file(id)
            .ok_or_else(|| DrivepickError::NotFound { id: id.to_string() })
    }

    async fn list_children(&self, folder_id: &str) -> DrivepickResult<Vec<Node>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let children = self
            .folders
            .lock()
            .unwrap()
            .get(folder_id)
            .map(|(_, children)| children.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        children.ok_or_else(|| DrivepickError::NotFound {
            id: folder_id.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl ContentFetch for MemoryTree {
    async fn download(&self, file_id: &str, destination: &Path) -> DrivepickResult<()> {
        if self.find_file(file_id).is_none() {
            return Err(DrivepickError::NotFound {
                id: file_id.to_string(),
            });
        }
        tokio::fs::write(destination, file_id.as_bytes())
            .await
            .map_err(|e| DrivepickError::io("writing test download", e))
    }
}
