//! Client configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Scope granting access to files created or opened by this application.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Base URL for Drive v3 metadata requests.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Base URL for Drive v3 media uploads.
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Name of the token cache file inside the working directory.
pub const TOKEN_FILE: &str = "token.json";

const CREDENTIALS_ENV: &str = "DRIVEPATH_CREDENTIALS";
const WORKING_DIR_ENV: &str = "DRIVEPATH_WORKING_DIR";

/// Settings shared by the authorizer and the Drive API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path to the OAuth client secrets JSON file.
    pub credential_path: Option<PathBuf>,
    /// Directory holding the token cache.
    pub working_dir: PathBuf,
    /// OAuth scopes requested during authorization.
    pub scopes: Vec<String>,
    /// Optional HTTP/SOCKS proxy URL.
    pub proxy: Option<String>,
    pub api_base: String,
    pub upload_base: String,
    /// Per-request timeout; streamed transfers are not bounded by it.
    pub request_timeout_secs: u64,
    /// Retry budget for rate-limited metadata requests.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credential_path: None,
            working_dir: current_dir(),
            scopes: vec![DRIVE_FILE_SCOPE.to_string()],
            proxy: None,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
            request_timeout_secs: 30,
            max_retries: 5,
        }
    }
}

impl ClientConfig {
    /// Create a configuration reading client secrets from `credential_path`.
    pub fn new(credential_path: impl Into<PathBuf>) -> Self {
        Self {
            credential_path: Some(credential_path.into()),
            ..Self::default()
        }
    }

    /// Build a configuration from `DRIVEPATH_CREDENTIALS` and
    /// `DRIVEPATH_WORKING_DIR`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
            if !path.trim().is_empty() {
                config.credential_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var(WORKING_DIR_ENV) {
            config = config.with_working_dir(dir);
        }
        config
    }

    /// Set the working directory. Blank values keep the current directory.
    pub fn with_working_dir(mut self, dir: impl AsRef<str>) -> Self {
        self.working_dir = normalize_working_dir(dir.as_ref());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Point the client at a different API host (used by tests and emulators).
    pub fn with_endpoints(mut self, api_base: impl Into<String>, upload_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.upload_base = upload_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Location of the persisted token.
    pub fn token_path(&self) -> PathBuf {
        self.working_dir.join(TOKEN_FILE)
    }

    pub fn credential_path(&self) -> Option<&Path> {
        self.credential_path.as_deref()
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn normalize_working_dir(dir: &str) -> PathBuf {
    if dir.trim().is_empty() {
        current_dir()
    } else {
        PathBuf::from(dir.replace('\\', "/"))
    }
}
