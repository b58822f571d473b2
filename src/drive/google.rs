//! Google Drive v3 listing and download over HTTPS
//!
//! `ureq` is blocking, so every request runs on the blocking pool.

use crate::config::schema::SourceConfig;
use crate::drive::provider::{ContentFetch, ListingProvider, Node};
use crate::error::{DrivepickError, DrivepickResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use ureq::Agent;
use uuid::Uuid;

const API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Characters of an error body kept in error messages
const ERROR_BODY_LIMIT: usize = 300;

/// File resource as returned by the Drive API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFile {
    id: String,
    name: String,
    mime_type: String,
    /// Drive encodes sizes as decimal strings
    size: Option<String>,
}

impl WireFile {
    fn into_node(self) -> Node {
        let size = self.size.as_deref().and_then(|s| s.parse::<u64>().ok());
        Node {
            id: self.id,
            name: self.name,
            mime_type: self.mime_type,
            size,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFileList {
    #[serde(default)]
    files: Vec<WireFile>,
    next_page_token: Option<String>,
    #[serde(default)]
    incomplete_search: bool,
}

/// Google Drive client
#[derive(Clone)]
pub struct GoogleDrive {
    agent: Agent,
    auth_header: String,
    drive_id: Option<String>,
    page_size: u32,
    base_url: String,
}

impl GoogleDrive {
    /// Create a client, reading the bearer token from the configured env var
    pub fn from_config(config: &SourceConfig) -> DrivepickResult<Self> {
        let token = std::env::var(&config.access_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DrivepickError::TokenMissing(config.access_token_env.clone()))?;

        Ok(Self::new(
            token.trim(),
            config.drive_id.clone(),
            config.page_size,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Create a client with an explicit token
    pub fn new(token: &str, drive_id: Option<String>, page_size: u32, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            auth_header: format!("Bearer {}", token),
            drive_id,
            page_size,
            base_url: API_BASE.to_string(),
        }
    }

    /// Query selecting the non-trashed children of a folder
    fn children_query(folder_id: &str) -> String {
        format!(
            "'{}' in parents and not trashed",
            folder_id.replace('\\', "\\\\").replace('\'', "\\'")
        )
    }

    /// Query parameters for one page of a folder listing
    fn list_params(&self, folder_id: &str, page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", Self::children_query(folder_id)),
            (
                "fields",
                "nextPageToken, incompleteSearch, files(id, name, mimeType, size)".to_string(),
            ),
            ("pageSize", self.page_size.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(drive_id) = &self.drive_id {
            params.push(("corpora", "drive".to_string()));
            params.push(("driveId", drive_id.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }

    /// Perform a GET and map the status to a result
    fn get(
        &self,
        endpoint: &str,
        id: &str,
        params: &[(&'static str, String)],
    ) -> DrivepickResult<ureq::http::Response<ureq::Body>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header);
        for (key, value) in params {
            request = request.query(*key, value);
        }

        let mut response = request
            .call()
            .map_err(|e| DrivepickError::Remote(format!("GET {}: {}", endpoint, e)))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(DrivepickError::NotFound { id: id.to_string() });
        }
        if !(200..300).contains(&status) {
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(DrivepickError::RemoteStatus {
                endpoint: endpoint.to_string(),
                status,
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        Ok(response)
    }

    fn read_json<T: for<'de> Deserialize<'de>>(
        endpoint: &str,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> DrivepickResult<T> {
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DrivepickError::Remote(format!("reading {} response: {}", endpoint, e)))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_node_blocking(&self, id: &str) -> DrivepickResult<Node> {
        let endpoint = format!("files/{}", id);
        let params = [
            ("fields", "id, name, mimeType, size".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let response = self.get(&endpoint, id, &params)?;
        let file: WireFile = Self::read_json(&endpoint, response)?;
        Ok(file.into_node())
    }

    fn list_children_blocking(&self, folder_id: &str) -> DrivepickResult<Vec<Node>> {
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let params = self.list_params(folder_id, page_token.as_deref());
            let response = self.get("files", folder_id, &params)?;
            let page: WireFileList = Self::read_json("files", response)?;
            pages += 1;

            // Drive may skip items on very large queries; a few missing
            // files do not matter for random selection.
            if page.incomplete_search {
                warn!("Incomplete listing for folder {}, continuing", folder_id);
            }

            nodes.extend(page.files.into_iter().map(WireFile::into_node));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Listed {} children of {} in {} page(s)",
            nodes.len(),
            folder_id,
            pages
        );
        Ok(nodes)
    }

    fn download_blocking(&self, file_id: &str, destination: &Path) -> DrivepickResult<()> {
        let endpoint = format!("files/{}", file_id);
        let params = [
            ("alt", "media".to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        let response = self.get(&endpoint, file_id, &params)?;

        let tmp = partial_path(destination);
        let result = (|| {
            let mut file = std::fs::File::create(&tmp)
                .map_err(|e| DrivepickError::io(format!("creating {}", tmp.display()), e))?;
            let mut reader = response.into_body().into_reader();
            std::io::copy(&mut reader, &mut file)
                .map_err(|e| DrivepickError::io(format!("downloading {}", file_id), e))?;
            file.flush()
                .map_err(|e| DrivepickError::io(format!("flushing {}", tmp.display()), e))?;
            std::fs::rename(&tmp, destination).map_err(|e| {
                DrivepickError::io(format!("moving download to {}", destination.display()), e)
            })
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }
}

/// Temporary sibling path a download is streamed into before the rename
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4().simple()))
}

async fn blocking<T, F>(f: F) -> DrivepickResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> DrivepickResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DrivepickError::Internal(format!("drive request task failed: {}", e)))?
}

#[async_trait]
impl ListingProvider for GoogleDrive {
    async fn get_node(&self, id: &str) -> DrivepickResult<Node> {
        let this = self.clone();
        let id = id.to_string();
        blocking(move || this.get_node_blocking(&id)).await
    }

    async fn list_children(&self, folder_id: &str) -> DrivepickResult<Vec<Node>> {
        let this = self.clone();
        let folder_id = folder_id.to_string();
        blocking(move || this.list_children_blocking(&folder_id)).await
    }

    fn provider_name(&self) -> &'static str {
        "Google Drive"
    }
}

#[async_trait]
impl ContentFetch for GoogleDrive {
    async fn download(&self, file_id: &str, destination: &Path) -> DrivepickResult<()> {
        let this = self.clone();
        let file_id = file_id.to_string();
        let destination = destination.to_path_buf();
        blocking(move || this.download_blocking(&file_id, &destination)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(drive_id: Option<&str>) -> GoogleDrive {
        GoogleDrive::new(
            "token",
            drive_id.map(str::to_string),
            50,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn size_string_parsed() {
        let json = r#"{"id":"a","name":"b.jpg","mimeType":"image/jpeg","size":"123456"}"#;
        let file: WireFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.into_node().size, Some(123456));
    }

    #[test]
    fn folder_without_size() {
        let json = r#"{"id":"a","name":"b","mimeType":"application/vnd.google-apps.folder"}"#;
        let node = serde_json::from_str::<WireFile>(json).unwrap().into_node();
        assert!(node.is_folder());
        assert_eq!(node.size, None);
    }

    #[test]
    fn file_list_page_parsed() {
        let json = r#"{
            "nextPageToken": "p2",
            "incompleteSearch": true,
            "files": [{"id":"a","name":"x.png","mimeType":"image/png","size":"9"}]
        }"#;
        let page: WireFileList = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("p2"));
        assert!(page.incomplete_search);
        assert_eq!(page.files.len(), 1);

        let last: WireFileList = serde_json::from_str("{}").unwrap();
        assert!(last.files.is_empty());
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn children_query_escapes_quotes() {
        assert_eq!(
            GoogleDrive::children_query("abc"),
            "'abc' in parents and not trashed"
        );
        assert_eq!(
            GoogleDrive::children_query("a'b"),
            "'a\\'b' in parents and not trashed"
        );
    }

    #[test]
    fn shared_drive_params_only_with_drive_id() {
        let params = client(None).list_params("root", None);
        assert!(!params.iter().any(|(k, _)| *k == "driveId"));

        let params = client(Some("D1")).list_params("root", Some("tok"));
        assert!(params.contains(&("driveId", "D1".to_string())));
        assert!(params.contains(&("corpora", "drive".to_string())));
        assert!(params.contains(&("pageToken", "tok".to_string())));
    }

    #[test]
    fn partial_path_is_hidden_sibling() {
        let tmp = partial_path(Path::new("/tmp/dl/abc-photo.jpg"));
        assert_eq!(tmp.parent(), Some(Path::new("/tmp/dl")));
        let name = tmp.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".abc-photo.jpg."));
        assert!(name.ends_with(".part"));
    }

    #[test]
    fn missing_token_reported() {
        let config = SourceConfig {
            access_token_env: "DRIVEPICK_TEST_TOKEN_THAT_IS_NOT_SET".to_string(),
            ..SourceConfig::default()
        };
        let err = GoogleDrive::from_config(&config).err().unwrap();
        assert!(matches!(err, DrivepickError::TokenMissing(_)));
    }

    #[test]
    #[serial_test::serial]
    fn token_read_from_configured_env() {
        let config = SourceConfig {
            access_token_env: "DRIVEPICK_TEST_TOKEN".to_string(),
            ..SourceConfig::default()
        };

        std::env::set_var("DRIVEPICK_TEST_TOKEN", "  ");
        assert!(GoogleDrive::from_config(&config).is_err());

        std::env::set_var("DRIVEPICK_TEST_TOKEN", "ya29.token\n");
        let drive = GoogleDrive::from_config(&config).unwrap();
        assert_eq!(drive.auth_header, "Bearer ya29.token");

        std::env::remove_var("DRIVEPICK_TEST_TOKEN");
    }
}
