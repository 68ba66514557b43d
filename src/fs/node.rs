//! Remote node types.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses to mark a node as a folder.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Kind of a remote node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    /// Classify a node by its MIME type.
    pub fn from_mime_type(mime_type: &str) -> Self {
        if mime_type == FOLDER_MIME_TYPE {
            NodeKind::Folder
        } else {
            NodeKind::File
        }
    }
}

/// A node in the remote store's flat namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNode {
    /// Opaque node identifier
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Parent node identifiers (at most one for nodes created here)
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub trashed: bool,
    /// Size in bytes, as the decimal string Drive reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Public view link, present when requested through `fields`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

impl RemoteNode {
    pub fn kind(&self) -> NodeKind {
        NodeKind::from_mime_type(&self.mime_type)
    }

    pub fn is_folder(&self) -> bool {
        self.kind() == NodeKind::Folder
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    /// The single parent this node was created under, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    /// Size in bytes; 0 for folders or when unknown.
    pub fn size(&self) -> u64 {
        self.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
    }
}

/// Metadata sent when creating a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl NodeMetadata {
    /// Metadata for a folder, optionally placed under `parent`.
    pub fn folder(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }

    /// Metadata for a file, optionally placed under `parent`.
    ///
    /// The MIME type is left for the server to detect.
    pub fn file(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: None,
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }
}

/// A permission to attach to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    /// Principal type, e.g. `anyone`
    #[serde(rename = "type")]
    pub principal: String,
    /// Role, e.g. `reader`
    pub role: String,
    pub allow_file_discovery: bool,
}

impl ShareGrant {
    /// Anyone may find and read the node.
    pub fn public_reader() -> Self {
        Self {
            principal: "anyone".to_string(),
            role: "reader".to_string(),
            allow_file_discovery: true,
        }
    }
}

/// A permission record returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    #[serde(default, rename = "type")]
    pub principal: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub allow_file_discovery: bool,
}
