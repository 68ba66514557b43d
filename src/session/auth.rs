//! OAuth 2.0 installed-application authorization.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::crypto::{random_state, PkcePair};
use crate::error::{DriveError, Result};
use crate::http::HttpClient;
use crate::session::core::Authorizer;
use crate::session::loopback::LoopbackReceiver;
use crate::session::secrets::ClientSecrets;
use crate::session::token::{Token, TokenResponse, TokenStore};

/// How long to wait for the user to finish the consent screen.
const CONSENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Authorizes through the browser-based installed-application flow,
/// caching the resulting token in the working directory.
///
/// Order of preference: a still-valid cached token, a refresh of a cached
/// token, then interactive consent on a loopback redirect.
#[derive(Debug)]
pub struct OAuthAuthorizer {
    credential_path: Option<PathBuf>,
    scopes: Vec<String>,
    http: HttpClient,
    store: TokenStore,
    open_browser: bool,
}

impl OAuthAuthorizer {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = match &config.proxy {
            Some(proxy) => HttpClient::with_proxy(proxy)?,
            None => HttpClient::new(),
        };
        Ok(Self {
            store: TokenStore::for_config(&config),
            credential_path: config.credential_path,
            scopes: config.scopes,
            http: http.with_timeout(Duration::from_secs(config.request_timeout_secs)),
            open_browser: true,
        })
    }

    /// Whether to launch the system browser for consent. The URL is always
    /// printed to stderr.
    pub fn with_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    async fn load_secrets(&self) -> Result<ClientSecrets> {
        let path = self
            .credential_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DriveError::Auth("No client secrets file configured".to_string()))?;
        ClientSecrets::from_file(path).await
    }

    /// Build the consent URL.
    pub fn authorization_url(
        secrets: &ClientSecrets,
        scopes: &[String],
        redirect_uri: &str,
        challenge: &str,
        state: &str,
    ) -> Result<String> {
        let mut url = Url::parse(&secrets.auth_uri)
            .map_err(|e| DriveError::Auth(format!("Invalid auth_uri {}: {}", secrets.auth_uri, e)))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &secrets.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("code_challenge", challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url.into())
    }

    async fn interactive(&self, secrets: &ClientSecrets) -> Result<Token> {
        let receiver = LoopbackReceiver::bind().await?;
        let redirect_uri = receiver.redirect_uri().to_string();
        let pkce = PkcePair::generate();
        let state = random_state();
        let url = Self::authorization_url(secrets, &self.scopes, &redirect_uri, &pkce.challenge, &state)?;

        eprintln!("Open this URL in a browser to authorize access:\n{}", url);
        if self.open_browser {
            if let Err(err) = open::that(&url) {
                warn!(error = %err, "could not launch browser");
            }
        }

        let code = tokio::time::timeout(CONSENT_TIMEOUT, receiver.wait_for_code(&state))
            .await
            .map_err(|_| DriveError::Auth("Timed out waiting for authorization".to_string()))??;
        debug!("received authorization code");

        self.exchange_code(secrets, &code, &pkce.verifier, &redirect_uri)
            .await
    }

    async fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> Result<Token> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        self.request_token(secrets, &form, None).await
    }

    async fn refresh_with(&self, secrets: &ClientSecrets, refresh_token: &str) -> Result<Token> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ];
        self.request_token(secrets, &form, Some(refresh_token)).await
    }

    async fn request_token(
        &self,
        secrets: &ClientSecrets,
        form: &[(&str, &str)],
        previous_refresh: Option<&str>,
    ) -> Result<Token> {
        let text = self
            .http
            .post_form(&secrets.token_uri, form)
            .await
            .map_err(|err| match err {
                DriveError::Auth(_) => err,
                other => DriveError::Auth(format!("Token exchange failed: {}", other)),
            })?;
        let response: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| DriveError::Auth(format!("Malformed token response: {}", e)))?;
        Ok(response.into_token(previous_refresh))
    }

    /// Save the token; a failure only costs a future interactive login.
    async fn persist(&self, token: &Token) {
        if let Err(err) = self.store.save(token).await {
            warn!(path = %self.store.path().display(), error = %err, "failed to cache token");
        }
    }
}

#[async_trait]
impl Authorizer for OAuthAuthorizer {
    async fn authorize(&self) -> Result<Token> {
        let secrets = self.load_secrets().await?;

        let cached = match self.store.load().await {
            Ok(cached) => cached,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable token cache");
                None
            }
        };

        if let Some(cached) = cached {
            if !cached.is_expired() && !cached.access_token.is_empty() {
                debug!("using cached token");
                return Ok(cached);
            }
            if let Some(refresh_token) = cached.refresh_token.as_deref() {
                match self.refresh_with(&secrets, refresh_token).await {
                    Ok(token) => {
                        info!("refreshed cached token");
                        self.persist(&token).await;
                        return Ok(token);
                    }
                    Err(err) => warn!(error = %err, "cached refresh token rejected"),
                }
            }
        }

        let token = self.interactive(&secrets).await?;
        info!("authorization completed");
        self.persist(&token).await;
        Ok(token)
    }

    async fn refresh(&self, token: &Token) -> Result<Token> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| DriveError::Auth("No refresh token available".to_string()))?;
        let secrets = self.load_secrets().await?;
        let refreshed = self.refresh_with(&secrets, refresh_token).await?;
        self.persist(&refreshed).await;
        Ok(refreshed)
    }
}
