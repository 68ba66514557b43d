//! HTTP client wrapper for Drive API and OAuth requests.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tokio::time::timeout;

use crate::api::error::error_from_body;
use crate::error::{DriveError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for making requests to Google servers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a new HTTP client with a proxy.
    pub fn with_proxy(proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| DriveError::InvalidArgument(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .proxy(proxy)
            .build()
            .map_err(|e| DriveError::Custom(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Bound non-streaming requests by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET a URL with a bearer token, returning the body as text.
    pub async fn get(&self, url: &str, bearer: &str) -> Result<String> {
        let request = self.client.get(url).header(AUTHORIZATION, bearer_value(bearer));
        self.send_text(request).await
    }

    /// POST a JSON body with a bearer token, returning the body as text.
    pub async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<String> {
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, bearer_value(bearer))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string());
        self.send_text(request).await
    }

    /// POST an urlencoded form without authorization (token endpoint).
    pub async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String> {
        let request = self.client.post(url).form(form);
        self.send_text(request).await
    }

    /// GET a URL and hand back the response for streaming its body.
    ///
    /// Only the response headers are bounded by the timeout.
    pub async fn get_stream(&self, url: &str, bearer: &str) -> Result<Response> {
        let request = self.client.get(url).header(AUTHORIZATION, bearer_value(bearer));
        let response = timeout(self.timeout, request.send())
            .await
            .map_err(|_| DriveError::Timeout(self.timeout))??;
        check_status(response).await
    }

    /// POST a streamed body of known length, returning the response text.
    pub async fn post_stream(
        &self,
        url: &str,
        bearer: &str,
        content_type: &str,
        content_length: u64,
        body: reqwest::Body,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, bearer_value(bearer))
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .body(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.text().await?)
    }

    async fn send_text(&self, request: RequestBuilder) -> Result<String> {
        let exchange = async {
            let response = check_status(request.send().await?).await?;
            Ok::<_, DriveError>(response.text().await?)
        };
        timeout(self.timeout, exchange)
            .await
            .map_err(|_| DriveError::Timeout(self.timeout))?
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn bearer_value(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status.as_u16(), &body))
}
