//! OAuth tokens and the on-disk token store.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{DriveError, Result};

/// Tokens are treated as expired this many seconds early.
const EXPIRY_SKEW_SECS: u64 = 60;

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Credential material for an authenticated session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix seconds; `None` never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl Token {
    /// A token with no refresh token and no expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: None,
            token_type: default_token_type(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Expire `secs` seconds from now.
    pub fn expires_in(mut self, secs: u64) -> Self {
        self.expires_at = Some(now_secs().saturating_add(secs));
        self
    }

    /// Expire at an absolute Unix time.
    pub fn expires_at(mut self, unix_secs: u64) -> Self {
        self.expires_at = Some(unix_secs);
        self
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => now_secs().saturating_add(EXPIRY_SKEW_SECS) >= at,
            None => false,
        }
    }

    /// Whether the token can still authorize requests, directly or after a refresh.
    pub fn is_usable(&self) -> bool {
        !self.access_token.is_empty() && (!self.is_expired() || self.refresh_token.is_some())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
}

impl TokenResponse {
    /// Build a token, keeping `previous_refresh` when the server omits one
    /// (refresh grants usually do).
    pub(crate) fn into_token(self, previous_refresh: Option<&str>) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: self.expires_in.map(|secs| now_secs().saturating_add(secs)),
            scope: self.scope,
            token_type: self.token_type,
        }
    }
}

/// Persists a token as JSON so later processes can skip interactive
/// authorization.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located at `<working_dir>/token.json`.
    pub fn for_config(config: &ClientConfig) -> Self {
        Self::new(config.token_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token.
    ///
    /// A missing file yields `None`. An unreadable or malformed file is
    /// removed and also yields `None`.
    pub async fn load(&self) -> Result<Option<Token>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DriveError::local_io(&self.path, e)),
        };

        match serde_json::from_str::<Token>(&json) {
            Ok(token) => {
                debug!(path = %self.path.display(), "loaded cached token");
                Ok(Some(token))
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding malformed token cache");
                let _ = tokio::fs::remove_file(&self.path).await;
                Ok(None)
            }
        }
    }

    /// Write the token, creating the working directory if needed.
    pub async fn save(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DriveError::local_io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(token)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| DriveError::local_io(&self.path, e))?;
        debug!(path = %self.path.display(), "saved token");
        Ok(())
    }

    /// Remove the cached token, if any.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DriveError::local_io(&self.path, e)),
        }
    }
}
