//! The remote storage service boundary.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::api::query::NodeQuery;
use crate::error::Result;
use crate::fs::node::{NodeMetadata, Permission, RemoteNode, ShareGrant};
use crate::session::Session;

/// A stream of content chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Field selection used when only the identifier matters.
pub const ID_FIELDS: &str = "id";

/// Field selection for full node metadata.
pub const ALL_FIELDS: &str = "*";

/// Field selection for search results.
pub const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, parents, size, trashed)";

/// Content for a node created with data.
pub struct UploadContent {
    pub stream: ByteStream,
    /// Exact number of bytes the stream yields
    pub size: u64,
    pub mime_type: String,
}

impl UploadContent {
    pub fn new(stream: ByteStream, size: u64) -> Self {
        Self {
            stream,
            size,
            mime_type: "application/octet-stream".to_string(),
        }
    }
}

impl std::fmt::Debug for UploadContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadContent")
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Operations of the remote storage service.
///
/// Every call runs under the given authenticated session. Implementations
/// must not retry calls whose body is a stream.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Search for nodes matching `query`.
    async fn list_nodes(&self, session: &Session, query: &NodeQuery) -> Result<Vec<RemoteNode>>;

    /// Create a node without content (folders).
    async fn create_node(&self, session: &Session, metadata: &NodeMetadata) -> Result<RemoteNode>;

    /// Create a node and upload its content in one call.
    ///
    /// The service either commits the node with its full content or rejects it.
    async fn create_node_with_content(
        &self,
        session: &Session,
        metadata: &NodeMetadata,
        content: UploadContent,
    ) -> Result<RemoteNode>;

    /// Fetch a node's metadata, restricted to `fields`.
    async fn get_node(&self, session: &Session, id: &str, fields: &str) -> Result<RemoteNode>;

    /// Stream a file node's content.
    async fn get_node_content(&self, session: &Session, id: &str) -> Result<ByteStream>;

    /// Attach a permission to a node.
    async fn create_permission(
        &self,
        session: &Session,
        node_id: &str,
        grant: &ShareGrant,
    ) -> Result<Permission>;
}
