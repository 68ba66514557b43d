//! Drive v3 REST client with request/response handling.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::error::is_retryable;
use crate::api::query::NodeQuery;
use crate::api::service::{ByteStream, RemoteService, UploadContent, ID_FIELDS, LIST_FIELDS};
use crate::config::{ClientConfig, DRIVE_API_BASE, UPLOAD_API_BASE};
use crate::error::{DriveError, Result};
use crate::fs::node::{NodeMetadata, Permission, RemoteNode, ShareGrant};
use crate::http::HttpClient;
use crate::session::Session;

const NODE_FIELDS: &str = "id, name, mimeType, parents, size, trashed";
const PERMISSION_FIELDS: &str = "id, type, role, allowFileDiscovery";
const PAGE_SIZE: &str = "100";
const MAX_DELAY_MS: u64 = 32_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeList {
    #[serde(default)]
    files: Vec<RemoteNode>,
    next_page_token: Option<String>,
}

enum Call<'a> {
    Get(String),
    Post(String, &'a Value),
}

/// Drive API client.
#[derive(Debug, Clone)]
pub struct DriveApi {
    http: HttpClient,
    api_base: String,
    upload_base: String,
    max_retries: u32,
}

impl DriveApi {
    /// Create a client against the public Drive endpoints.
    pub fn new() -> Self {
        Self {
            http: HttpClient::new(),
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: UPLOAD_API_BASE.to_string(),
            max_retries: 5,
        }
    }

    /// Create a client honouring the proxy, endpoints, timeout and retry
    /// settings of `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let http = match &config.proxy {
            Some(proxy) => HttpClient::with_proxy(proxy)?,
            None => HttpClient::new(),
        };
        Ok(Self {
            http: http.with_timeout(Duration::from_secs(config.request_timeout_secs)),
            api_base: config.api_base.clone(),
            upload_base: config.upload_base.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Send a metadata request, retrying with exponential backoff while the
    /// server reports rate limiting or transient failures.
    async fn execute(&self, session: &Session, call: Call<'_>) -> Result<String> {
        let mut delay_ms = 250u64;
        let mut attempts = 0u32;

        loop {
            let token = session.access_token().await?;
            let result = match &call {
                Call::Get(url) => {
                    debug!(method = "GET", %url, "drive api request");
                    self.http.get(url, &token).await
                }
                Call::Post(url, body) => {
                    debug!(method = "POST", %url, "drive api request");
                    self.http.post_json(url, &token, body).await
                }
            };
            attempts += 1;

            match result {
                Ok(text) => {
                    debug!(bytes = text.len(), "drive api response");
                    return Ok(text);
                }
                Err(err) if is_retryable(&err) && attempts <= self.max_retries => {
                    debug!(attempts, delay_ms, error = %err, "drive api busy, retrying");
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for DriveApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteService for DriveApi {
    async fn list_nodes(&self, session: &Session, query: &NodeQuery) -> Result<Vec<RemoteNode>> {
        let q = query.to_query_string();
        let mut nodes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("q", q.as_str()), ("fields", LIST_FIELDS), ("pageSize", PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let url = endpoint(&self.api_base, &["files"], &params)?;
            let text = self.execute(session, Call::Get(url)).await?;
            let page: NodeList = serde_json::from_str(&text)?;
            nodes.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(nodes)
    }

    async fn create_node(&self, session: &Session, metadata: &NodeMetadata) -> Result<RemoteNode> {
        let url = endpoint(&self.api_base, &["files"], &[("fields", NODE_FIELDS)])?;
        let body = serde_json::to_value(metadata)?;
        let text = self.execute(session, Call::Post(url, &body)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_node_with_content(
        &self,
        session: &Session,
        metadata: &NodeMetadata,
        content: UploadContent,
    ) -> Result<RemoteNode> {
        let url = endpoint(
            &self.upload_base,
            &["files"],
            &[("uploadType", "multipart"), ("fields", ID_FIELDS)],
        )?;
        let boundary = format!("drivepath_{:016x}", rand::random::<u64>());
        let (head, tail) = multipart_frame(&serde_json::to_string(metadata)?, &content.mime_type, &boundary);
        let content_length = head.len() as u64 + content.size + tail.len() as u64;

        let body = stream::once(async move { Ok::<_, DriveError>(Bytes::from(head)) })
            .chain(content.stream)
            .chain(stream::once(async move { Ok(Bytes::from(tail)) }));

        let token = session.access_token().await?;
        debug!(method = "POST", %url, content_length, "drive api upload");
        let text = self
            .http
            .post_stream(
                &url,
                &token,
                &format!("multipart/related; boundary={}", boundary),
                content_length,
                reqwest::Body::wrap_stream(body),
            )
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_node(&self, session: &Session, id: &str, fields: &str) -> Result<RemoteNode> {
        let url = endpoint(&self.api_base, &["files", id], &[("fields", fields)])?;
        let text = self.execute(session, Call::Get(url)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_node_content(&self, session: &Session, id: &str) -> Result<ByteStream> {
        let url = endpoint(&self.api_base, &["files", id], &[("alt", "media")])?;
        let token = session.access_token().await?;
        debug!(method = "GET", %url, "drive api download");
        let response = self.http.get_stream(&url, &token).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DriveError::Transfer(e.to_string())))
            .boxed())
    }

    async fn create_permission(
        &self,
        session: &Session,
        node_id: &str,
        grant: &ShareGrant,
    ) -> Result<Permission> {
        let url = endpoint(
            &self.api_base,
            &["files", node_id, "permissions"],
            &[("fields", PERMISSION_FIELDS)],
        )?;
        let body = serde_json::to_value(grant)?;
        let text = self.execute(session, Call::Post(url, &body)).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Join `segments` onto `base` (percent-encoding each) and append `query`.
fn endpoint(base: &str, segments: &[&str], query: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|e| DriveError::InvalidArgument(format!("Invalid API base {}: {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| DriveError::InvalidArgument(format!("API base cannot be a base: {}", base)))?;
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// The parts surrounding the content in a `multipart/related` upload body.
fn multipart_frame(metadata_json: &str, mime_type: &str, boundary: &str) -> (String, String) {
    let head = format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: {mime}\r\n\r\n",
        b = boundary,
        meta = metadata_json,
        mime = mime_type
    );
    let tail = format!("\r\n--{}--\r\n", boundary);
    (head, tail)
}
