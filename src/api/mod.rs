//! Google Drive v3 API client and types.

pub mod client;
pub mod error;
pub mod query;
pub mod service;

pub use client::DriveApi;
pub use error::ApiErrorReason;
pub use query::NodeQuery;
pub use service::{ByteStream, RemoteService, UploadContent, ALL_FIELDS, ID_FIELDS};
