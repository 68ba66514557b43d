//! Authenticated session and the authorizer seam.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DriveError, Result};
use crate::session::token::Token;

/// Source of credential material for a session.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Produce a token, from cache or by running the authorization flow.
    async fn authorize(&self) -> Result<Token>;

    /// Exchange the refresh token of `token` for a fresh access token.
    async fn refresh(&self, token: &Token) -> Result<Token>;
}

/// An authenticated handle to the remote service.
///
/// The token never leaves the session; callers obtain a bearer value per
/// request through [`Session::access_token`].
pub struct Session {
    token: Mutex<Token>,
    authorizer: Arc<dyn Authorizer>,
}

impl Session {
    pub fn new(token: Token, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            token: Mutex::new(token),
            authorizer,
        }
    }

    /// Current access token, refreshed first if it has expired.
    pub async fn access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.is_expired() {
            if token.refresh_token.is_none() {
                return Err(DriveError::Auth(
                    "Access token expired and no refresh token is available".to_string(),
                ));
            }
            debug!("access token expired, refreshing");
            *token = self.authorizer.refresh(&token).await?;
        }
        Ok(token.access_token.clone())
    }

    /// Whether this session can still authorize requests.
    pub async fn is_valid(&self) -> bool {
        self.token.lock().await.is_usable()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
