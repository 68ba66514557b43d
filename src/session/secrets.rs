//! OAuth client secrets file parsing.

use std::path::Path;

use serde::Deserialize;

use crate::error::{DriveError, Result};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Client identity used in the authorization and token exchanges.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// The downloaded secrets file wraps the client in an `installed` or `web` key.
#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the JSON of a client secrets file.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)
            .map_err(|e| DriveError::Auth(format!("Malformed client secrets: {}", e)))?;
        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| DriveError::Auth("Client secrets have no 'installed' or 'web' section".to_string()))?;
        if secrets.client_id.trim().is_empty() {
            return Err(DriveError::Auth("Client secrets have an empty client_id".to_string()));
        }
        Ok(secrets)
    }

    /// Read and parse a client secrets file.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            DriveError::Auth(format!("Cannot read client secrets {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl std::fmt::Debug for ClientSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecrets")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
