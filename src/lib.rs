//! # drivepath
//!
//! Path-oriented client for Google Drive.
//!
//! Drive stores a flat set of nodes linked by parent references. This crate
//! lets callers address folders with slash-separated paths instead:
//!
//! - **Folders**: `create_folder_path("a/b/c")` reuses existing folders and
//!   creates the missing ones, returning the id of the deepest.
//! - **Transfers**: streamed upload to a path and download by file id, with
//!   optional progress callbacks.
//! - **Sharing**: public read permission and the browser link of a file.
//! - **Sessions**: OAuth installed-application authorization on first use,
//!   with the token cached in the working directory and refreshed when it
//!   expires.
//!
//! ## Example
//!
//! ```no_run
//! use drivepath::{ClientConfig, DriveClient};
//!
//! # async fn example() -> drivepath::Result<()> {
//! let config = ClientConfig::new("client_secret.json").with_working_dir("./state");
//! let client = DriveClient::from_config(config)?;
//!
//! let folder = client.create_folder_path("backups/2024").await?;
//! println!("folder id: {:?}", folder);
//!
//! let id = client.upload_file("db.sqlite", "backups/2024/db.sqlite").await?;
//! client.set_permission(&id).await?;
//! println!("{}", client.get_share_file_link(&id).await?);
//!
//! client.download_file(&id, "restore/db.sqlite", true).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Callers that expect empty strings and `false` instead of errors can use
//! [`CompatClient`].

pub mod api;
pub mod base64;
pub mod client;
pub mod compat;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod http;
pub mod progress;
pub mod session;

pub use api::{DriveApi, NodeQuery, RemoteService, UploadContent};
pub use client::DriveClient;
pub use compat::CompatClient;
pub use config::ClientConfig;
pub use error::{DriveError, ErrorKind, Result};
pub use fs::{NodeKind, PathResolver, PathSegments, RemoteNode};
pub use progress::{ProgressCallback, TransferProgress};
pub use session::{Authorizer, OAuthAuthorizer, Session, SessionManager, Token, TokenStore};
