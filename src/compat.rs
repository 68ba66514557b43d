//! String and boolean surface for callers ported from the legacy API.
//!
//! Every failure becomes an empty string or `false`. Errors are still
//! logged with their kind and cause before being dropped.

use std::path::Path;

use tracing::warn;

use crate::client::DriveClient;
use crate::config::ClientConfig;
use crate::error::{DriveError, Result};

/// Wraps a [`DriveClient`], collapsing every error to an empty value.
#[derive(Debug)]
pub struct CompatClient {
    inner: DriveClient,
}

impl CompatClient {
    pub fn new(inner: DriveClient) -> Self {
        Self { inner }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(DriveClient::from_config(config)?))
    }

    pub fn inner(&self) -> &DriveClient {
        &self.inner
    }

    /// Folder id of `path`, or `""` for blank paths and on failure.
    pub async fn create_folder_path(&self, path: &str) -> String {
        let result = self.inner.create_folder_path(path).await;
        or_empty("create_folder_path", path, result.map(Option::unwrap_or_default))
    }

    /// New file id, or `""` on failure.
    pub async fn upload_file(&self, local_path: &str, remote_path: &str) -> String {
        let result = self.inner.upload_file(local_path, remote_path).await;
        or_empty("upload_file", remote_path, result)
    }

    pub async fn download_file(&self, file_id: &str, local_path: &str, overwrite: bool) -> bool {
        match self.inner.download_file(file_id, Path::new(local_path), overwrite).await {
            Ok(()) => true,
            Err(err) => {
                log_swallowed("download_file", file_id, &err);
                false
            }
        }
    }

    /// New permission id, or `""` on failure.
    pub async fn set_permission(&self, file_id: &str) -> String {
        let result = self.inner.set_permission(file_id).await;
        or_empty("set_permission", file_id, result)
    }

    /// View link, or `""` when unavailable.
    pub async fn get_share_file_link(&self, file_id: &str) -> String {
        let result = self.inner.get_share_file_link(file_id).await;
        or_empty("get_share_file_link", file_id, result)
    }
}

fn or_empty(operation: &str, target: &str, result: Result<String>) -> String {
    result.unwrap_or_else(|err| {
        log_swallowed(operation, target, &err);
        String::new()
    })
}

fn log_swallowed(operation: &str, target: &str, err: &DriveError) {
    warn!(operation, target, kind = ?err.kind(), error = %err, "operation failed");
}
