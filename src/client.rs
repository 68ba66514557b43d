//! Path-oriented Drive client.

use std::sync::Arc;

use crate::api::{DriveApi, RemoteService};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::{Authorizer, Session, SessionManager};

/// Maps slash-separated paths onto Drive folders and moves files in and out.
///
/// Every operation first ensures a session exists; the session is created
/// once and reused for the lifetime of the client.
///
/// # Example
/// ```no_run
/// use drivepath::{ClientConfig, DriveClient};
///
/// # async fn example() -> drivepath::Result<()> {
/// let client = DriveClient::from_config(ClientConfig::new("client_secret.json"))?;
/// let id = client.upload_file("report.pdf", "reports/2024/report.pdf").await?;
/// let link = client.get_share_file_link(&id).await?;
/// println!("{}", link);
/// # Ok(())
/// # }
/// ```
pub struct DriveClient {
    pub(crate) service: Arc<dyn RemoteService>,
    pub(crate) sessions: SessionManager,
}

impl DriveClient {
    pub fn new(service: Arc<dyn RemoteService>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            service,
            sessions: SessionManager::new(authorizer),
        }
    }

    /// Client talking to Google Drive, authorized with the OAuth
    /// installed-application flow.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let service = DriveApi::from_config(&config)?;
        Ok(Self {
            service: Arc::new(service),
            sessions: SessionManager::from_config(config)?,
        })
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Authorize now instead of on first use.
    pub async fn ensure_session(&self) -> Result<Arc<Session>> {
        self.sessions.ensure_session().await
    }
}

impl std::fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveClient")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
