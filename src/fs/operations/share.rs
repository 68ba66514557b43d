//! Sharing operations.

use tracing::info;

use crate::api::ALL_FIELDS;
use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::fs::node::ShareGrant;

impl DriveClient {
    /// Let anyone find and read `file_id`. Returns the new permission id.
    pub async fn set_permission(&self, file_id: &str) -> Result<String> {
        if file_id.trim().is_empty() {
            return Err(DriveError::InvalidArgument("File id is empty".to_string()));
        }
        let session = self.ensure_session().await?;
        let permission = self
            .service
            .create_permission(&session, file_id, &ShareGrant::public_reader())
            .await?;
        if permission.id.is_empty() {
            return Err(DriveError::InvalidResponse);
        }
        info!(id = file_id, permission = %permission.id, "granted public read access");
        Ok(permission.id)
    }

    /// The browser link of `file_id`.
    pub async fn get_share_file_link(&self, file_id: &str) -> Result<String> {
        if file_id.trim().is_empty() {
            return Err(DriveError::InvalidArgument("File id is empty".to_string()));
        }
        let session = self.ensure_session().await?;
        let node = self.service.get_node(&session, file_id, ALL_FIELDS).await?;
        node.web_view_link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| DriveError::NotFound(format!("No view link for {}", file_id)))
    }
}
