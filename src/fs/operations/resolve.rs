//! Folder chain resolution.

use tracing::{debug, info, warn};

use crate::api::{NodeQuery, RemoteService};
use crate::client::DriveClient;
use crate::error::{DriveError, Result};
use crate::fs::node::NodeMetadata;
use crate::fs::path::PathSegments;
use crate::session::Session;

/// Walks a folder path from the drive root, reusing existing folders and
/// creating the missing ones.
///
/// Each segment costs one search plus, when absent, one create. The
/// search-then-create pair is not atomic: two concurrent walks over the same
/// missing folder can both create it.
pub struct PathResolver<'a> {
    service: &'a dyn RemoteService,
    session: &'a Session,
}

impl<'a> PathResolver<'a> {
    pub fn new(service: &'a dyn RemoteService, session: &'a Session) -> Self {
        Self { service, session }
    }

    /// Resolve `segments` to the id of the deepest folder.
    ///
    /// Returns `None` for an empty path. The first segment that cannot be
    /// found or created aborts the walk with [`DriveError::Resolve`].
    pub async fn resolve(&self, segments: &PathSegments) -> Result<Option<String>> {
        let mut parent: Option<String> = None;

        for segment in segments.iter() {
            let id = self
                .resolve_segment(segment, parent.as_deref())
                .await
                .map_err(|err| {
                    warn!(path = %segments.display(), segment, error = %err, "folder resolution failed");
                    DriveError::Resolve {
                        segment: segment.to_string(),
                        source: Box::new(err),
                    }
                })?;
            parent = Some(id);
        }

        Ok(parent)
    }

    async fn resolve_segment(&self, name: &str, parent: Option<&str>) -> Result<String> {
        let query = NodeQuery::folder_named(name, parent);
        let mut found = self.service.list_nodes(self.session, &query).await?;

        if found.len() > 1 {
            warn!(
                segment = name,
                parent = parent.unwrap_or("root"),
                candidates = found.len(),
                "multiple folders share this name, using the first"
            );
        }

        if !found.is_empty() {
            let existing = found.swap_remove(0);
            if existing.id.is_empty() {
                return Err(DriveError::InvalidResponse);
            }
            debug!(segment = name, id = %existing.id, "reusing folder");
            return Ok(existing.id);
        }

        let created = self
            .service
            .create_node(self.session, &NodeMetadata::folder(name, parent))
            .await?;
        if created.id.is_empty() {
            return Err(DriveError::InvalidResponse);
        }
        info!(segment = name, id = %created.id, "created folder");
        Ok(created.id)
    }
}

impl DriveClient {
    /// Make sure every folder of `path` exists and return the id of the
    /// deepest one.
    ///
    /// Blank paths return `Ok(None)` without authorizing.
    pub async fn create_folder_path(&self, path: &str) -> Result<Option<String>> {
        let segments = PathSegments::parse(path);
        if segments.is_empty() {
            return Ok(None);
        }
        self.resolve_or_create_folder_chain(&segments).await
    }

    /// Resolve already split segments, creating missing folders.
    pub async fn resolve_or_create_folder_chain(&self, segments: &PathSegments) -> Result<Option<String>> {
        if segments.is_empty() {
            return Ok(None);
        }
        let session = self.ensure_session().await?;
        PathResolver::new(self.service.as_ref(), &session)
            .resolve(segments)
            .await
    }
}

