//! Lazily initialised, memoised session ownership.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{DriveError, Result};
use crate::session::auth::OAuthAuthorizer;
use crate::session::core::{Authorizer, Session};

/// Owns at most one authenticated [`Session`] and creates it on first need.
///
/// Concurrent first callers share a single authorization; a failed
/// authorization leaves no session behind, so a later call tries again.
pub struct SessionManager {
    authorizer: Arc<dyn Authorizer>,
    session: OnceCell<Arc<Session>>,
}

impl SessionManager {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            authorizer,
            session: OnceCell::new(),
        }
    }

    /// Manager backed by the OAuth installed-application flow.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(OAuthAuthorizer::new(config)?)))
    }

    /// Return the session, authorizing first if none exists yet.
    pub async fn ensure_session(&self) -> Result<Arc<Session>> {
        if let Some(session) = self.session.get() {
            return Ok(Arc::clone(session));
        }

        let session = self
            .session
            .get_or_try_init(|| async {
                debug!("authorizing new session");
                let token = self.authorizer.authorize().await.map_err(|err| {
                    warn!(error = %err, "authorization failed");
                    match err {
                        DriveError::Auth(_) => err,
                        other => DriveError::Auth(other.to_string()),
                    }
                })?;
                info!("session established");
                Ok::<_, DriveError>(Arc::new(Session::new(token, Arc::clone(&self.authorizer))))
            })
            .await?;

        Ok(Arc::clone(session))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.initialized()
    }

    /// The session, if one has been established.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.get().cloned()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
