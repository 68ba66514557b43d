//! Upload operations.

use std::path::Path;

use futures::stream::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::resolve::PathResolver;
use crate::api::{ByteStream, UploadContent};
use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::fs::node::NodeMetadata;
use crate::fs::path::{split_upload_path, PathSegments};
use crate::progress::{ProgressCallback, TransferProgress};

impl DriveClient {
    /// Upload a local file to `remote_path`, creating missing folders.
    ///
    /// The last component of `remote_path` names the new file; everything
    /// before it is the folder chain. Returns the id of the new file.
    ///
    /// The local file is checked before any remote call is made.
    pub async fn upload_file<P: AsRef<Path>>(&self, local_path: P, remote_path: &str) -> Result<String> {
        self.upload_internal(local_path.as_ref(), remote_path, None).await
    }

    /// Like [`upload_file`](Self::upload_file), reporting progress after
    /// every chunk. Returning `false` from the callback cancels the upload.
    pub async fn upload_file_with_progress<P: AsRef<Path>>(
        &self,
        local_path: P,
        remote_path: &str,
        progress: ProgressCallback,
    ) -> Result<String> {
        self.upload_internal(local_path.as_ref(), remote_path, Some(progress))
            .await
    }

    async fn upload_internal(
        &self,
        local_path: &Path,
        remote_path: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<String> {
        if local_path.as_os_str().is_empty() {
            return Err(DriveError::InvalidArgument("Local path is empty".to_string()));
        }
        if remote_path.trim().is_empty() {
            return Err(DriveError::InvalidArgument("Remote path is empty".to_string()));
        }

        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|e| DriveError::local_io(local_path, e))?;
        if !metadata.is_file() {
            return Err(DriveError::local_io(
                local_path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let (folder, name) = split_upload_path(remote_path).ok_or_else(|| {
            DriveError::InvalidArgument(format!("Remote path has no file name: {}", remote_path))
        })?;

        let session = self.ensure_session().await?;
        let parent = PathResolver::new(self.service.as_ref(), &session)
            .resolve(&PathSegments::parse(folder))
            .await?;

        let file = tokio::fs::File::open(local_path)
            .await
            .map_err(|e| DriveError::local_io(local_path, e))?;
        let size = metadata.len();
        let mut content = UploadContent::new(file_stream(file, local_path, size, progress), size);
        content.mime_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!(path = %local_path.display(), remote = remote_path, size, "uploading");
        let node = self
            .service
            .create_node_with_content(&session, &NodeMetadata::file(name, parent.as_deref()), content)
            .await?;
        if node.id.is_empty() {
            return Err(DriveError::InvalidResponse);
        }

        info!(remote = remote_path, id = %node.id, size, "uploaded file");
        Ok(node.id)
    }
}

/// Stream a file in chunks. The file closes when the stream is dropped.
fn file_stream(
    file: tokio::fs::File,
    path: &Path,
    size: u64,
    progress: Option<ProgressCallback>,
) -> ByteStream {
    let path = path.to_path_buf();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut progress = progress;
    let mut done = 0u64;

    ReaderStream::new(file)
        .map(move |chunk| {
            let chunk = chunk.map_err(|e| DriveError::local_io(&path, e))?;
            done += chunk.len() as u64;
            if let Some(callback) = progress.as_mut() {
                if !callback(&TransferProgress::new(done, size, name.as_str())) {
                    return Err(DriveError::Transfer("Upload cancelled".to_string()));
                }
            }
            Ok(chunk)
        })
        .boxed()
}
