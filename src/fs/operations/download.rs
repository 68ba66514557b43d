//! Download operations.

use std::path::Path;

use futures::stream::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::api::ByteStream;
use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::progress::{ProgressCallback, TransferProgress};

impl DriveClient {
    /// Download the content of file `file_id` to `local_path`.
    ///
    /// Missing parent directories are created. An existing destination is
    /// an error unless `overwrite` is set, in which case it is replaced.
    pub async fn download_file<P: AsRef<Path>>(
        &self,
        file_id: &str,
        local_path: P,
        overwrite: bool,
    ) -> Result<()> {
        self.download_internal(file_id, local_path.as_ref(), overwrite, None)
            .await
    }

    /// Like [`download_file`](Self::download_file), reporting progress after
    /// every chunk. Returning `false` from the callback cancels the download.
    pub async fn download_file_with_progress<P: AsRef<Path>>(
        &self,
        file_id: &str,
        local_path: P,
        overwrite: bool,
        progress: ProgressCallback,
    ) -> Result<()> {
        self.download_internal(file_id, local_path.as_ref(), overwrite, Some(progress))
            .await
    }

    async fn download_internal(
        &self,
        file_id: &str,
        local_path: &Path,
        overwrite: bool,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        if file_id.trim().is_empty() {
            return Err(DriveError::InvalidArgument("File id is empty".to_string()));
        }
        if local_path.as_os_str().is_empty() {
            return Err(DriveError::InvalidArgument("Local path is empty".to_string()));
        }

        let session = self.ensure_session().await?;

        if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DriveError::local_io(parent, e))?;
        }

        match tokio::fs::try_exists(local_path).await {
            Ok(true) if !overwrite => {
                return Err(DriveError::local_io(
                    local_path,
                    std::io::Error::new(std::io::ErrorKind::AlreadyExists, "destination exists"),
                ));
            }
            Ok(true) => {
                debug!(path = %local_path.display(), "removing existing file");
                tokio::fs::remove_file(local_path)
                    .await
                    .map_err(|e| DriveError::local_io(local_path, e))?;
            }
            Ok(false) => {}
            Err(e) => return Err(DriveError::local_io(local_path, e)),
        }

        let stream = self.service.get_node_content(&session, file_id).await?;
        let written = match write_stream(stream, local_path, file_id, progress).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(cleanup) = tokio::fs::remove_file(local_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %local_path.display(), error = %cleanup, "could not remove partial download");
                    }
                }
                return Err(err);
            }
        };

        info!(id = file_id, path = %local_path.display(), bytes = written, "downloaded file");
        Ok(())
    }
}

/// Write every chunk of `stream` to a new file at `path`.
async fn write_stream(
    mut stream: ByteStream,
    path: &Path,
    file_id: &str,
    mut progress: Option<ProgressCallback>,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| DriveError::local_io(path, e))?;
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DriveError::local_io(path, e))?;
        written += chunk.len() as u64;

        if let Some(callback) = progress.as_mut() {
            if !callback(&TransferProgress::new(written, 0, file_id)) {
                return Err(DriveError::Transfer("Download cancelled".to_string()));
            }
        }
    }

    file.flush().await.map_err(|e| DriveError::local_io(path, e))?;
    Ok(written)
}
