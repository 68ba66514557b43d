//! Remote node model, path handling and the operations built on them.

pub mod node;
mod operations;
pub mod path;

pub use node::{NodeKind, NodeMetadata, Permission, RemoteNode, ShareGrant, FOLDER_MIME_TYPE};
pub use operations::PathResolver;
pub use path::{split_upload_path, PathSegments};
