#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

use drivepath::api::{ByteStream, NodeQuery, RemoteService, UploadContent};
use drivepath::fs::{NodeMetadata, Permission, RemoteNode, ShareGrant, FOLDER_MIME_TYPE};
use drivepath::{Authorizer, DriveClient, DriveError, Result, Session, Token};

/// In-memory stand-in for the Drive API.
#[derive(Default)]
pub struct MockDrive {
    nodes: Mutex<Vec<RemoteNode>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    permissions: Mutex<Vec<(String, ShareGrant)>>,
    next_id: AtomicUsize,
    /// Folder creation fails for this name
    fail_create: Mutex<Option<String>>,
    /// Content streams end with an error after the first chunk
    fail_content: Mutex<bool>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
}

/// Route library diagnostics to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl MockDrive {
    pub fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(Self::default())
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.list_calls,
            &self.create_calls,
            &self.upload_calls,
            &self.get_calls,
            &self.content_calls,
            &self.permission_calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    pub fn fail_create_for(&self, name: &str) {
        *self.fail_create.lock().unwrap() = Some(name.to_string());
    }

    pub fn fail_content_streams(&self) {
        *self.fail_content.lock().unwrap() = true;
    }

    fn allocate_id(&self) -> String {
        format!("node-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Insert a node directly, bypassing call counters.
    pub fn seed_folder(&self, name: &str, parent: Option<&str>) -> String {
        let id = self.allocate_id();
        self.nodes.lock().unwrap().push(RemoteNode {
            id: id.clone(),
            name: name.to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
            ..RemoteNode::default()
        });
        id
    }

    pub fn seed_file(&self, name: &str, data: &[u8]) -> String {
        let id = self.allocate_id();
        self.nodes.lock().unwrap().push(RemoteNode {
            id: id.clone(),
            name: name.to_string(),
            mime_type: "text/plain".to_string(),
            size: Some(data.len().to_string()),
            ..RemoteNode::default()
        });
        self.contents.lock().unwrap().insert(id.clone(), data.to_vec());
        id
    }

    pub fn nodes(&self) -> Vec<RemoteNode> {
        self.nodes.lock().unwrap().clone()
    }

    pub fn folders_named(&self, name: &str) -> Vec<RemoteNode> {
        self.nodes()
            .into_iter()
            .filter(|n| n.is_folder() && n.name == name)
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<RemoteNode> {
        self.nodes().into_iter().find(|n| n.id == id)
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.contents.lock().unwrap().get(id).cloned()
    }

    pub fn permissions(&self) -> Vec<(String, ShareGrant)> {
        self.permissions.lock().unwrap().clone()
    }

    fn matches(node: &RemoteNode, query: &NodeQuery) -> bool {
        if node.trashed {
            return false;
        }
        if query.is_folders_only() && !node.is_folder() {
            return false;
        }
        if let Some(name) = query.name() {
            if node.name != name {
                return false;
            }
        }
        match query.parent() {
            Some(parent) => node.parents.iter().any(|p| p == parent),
            None => true,
        }
    }
}

#[async_trait]
impl RemoteService for MockDrive {
    async fn list_nodes(&self, _session: &Session, query: &NodeQuery) -> Result<Vec<RemoteNode>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| Self::matches(n, query))
            .cloned()
            .collect())
    }

    async fn create_node(&self, _session: &Session, metadata: &NodeMetadata) -> Result<RemoteNode> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.lock().unwrap().as_deref() == Some(metadata.name.as_str()) {
            return Err(DriveError::Api {
                status: 403,
                reason: "insufficientPermissions".to_string(),
                message: "not allowed".to_string(),
            });
        }
        let node = RemoteNode {
            id: self.allocate_id(),
            name: metadata.name.clone(),
            mime_type: metadata.mime_type.clone().unwrap_or_default(),
            parents: metadata.parents.clone(),
            ..RemoteNode::default()
        };
        self.nodes.lock().unwrap().push(node.clone());
        Ok(node)
    }

    async fn create_node_with_content(
        &self,
        _session: &Session,
        metadata: &NodeMetadata,
        content: UploadContent,
    ) -> Result<RemoteNode> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let chunks: Vec<Bytes> = content.stream.try_collect().await?;
        let data: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        if data.len() as u64 != content.size {
            return Err(DriveError::Transfer("size mismatch".to_string()));
        }

        let node = RemoteNode {
            id: self.allocate_id(),
            name: metadata.name.clone(),
            mime_type: content.mime_type.clone(),
            parents: metadata.parents.clone(),
            size: Some(data.len().to_string()),
            ..RemoteNode::default()
        };
        self.contents.lock().unwrap().insert(node.id.clone(), data);
        self.nodes.lock().unwrap().push(node.clone());
        Ok(node)
    }

    async fn get_node(&self, _session: &Session, id: &str, _fields: &str) -> Result<RemoteNode> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let mut node = self
            .node(id)
            .ok_or_else(|| DriveError::NotFound(id.to_string()))?;
        let shared = self.permissions().iter().any(|(target, _)| target == id);
        if shared {
            node.web_view_link = Some(format!("https://drive.example.com/file/d/{}/view", id));
        }
        Ok(node)
    }

    async fn get_node_content(&self, _session: &Session, id: &str) -> Result<ByteStream> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let data = self
            .content(id)
            .ok_or_else(|| DriveError::NotFound(id.to_string()))?;

        if *self.fail_content.lock().unwrap() {
            let first = Bytes::from(data[..data.len() / 2].to_vec());
            return Ok(stream::iter(vec![
                Ok(first),
                Err(DriveError::Transfer("connection reset".to_string())),
            ])
            .boxed());
        }

        let chunks: Vec<Result<Bytes>> = data
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(stream::iter(chunks).boxed())
    }

    async fn create_permission(
        &self,
        _session: &Session,
        node_id: &str,
        grant: &ShareGrant,
    ) -> Result<Permission> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        if self.node(node_id).is_none() {
            return Err(DriveError::NotFound(node_id.to_string()));
        }
        let mut permissions = self.permissions.lock().unwrap();
        permissions.push((node_id.to_string(), grant.clone()));
        Ok(Permission {
            id: format!("perm-{}", permissions.len()),
            principal: grant.principal.clone(),
            role: grant.role.clone(),
            allow_file_discovery: grant.allow_file_discovery,
        })
    }
}

/// Authorizer that counts calls and can be slowed down or made to fail.
#[derive(Default)]
pub struct CountingAuthorizer {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub fail: bool,
}

impl CountingAuthorizer {
    pub fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        init_tracing();
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        init_tracing();
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for CountingAuthorizer {
    async fn authorize(&self) -> Result<Token> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(DriveError::Auth("credentials rejected".to_string()));
        }
        Ok(Token::new("test-access").with_refresh_token("test-refresh").expires_in(3600))
    }

    async fn refresh(&self, token: &Token) -> Result<Token> {
        Ok(token.clone())
    }
}

pub fn client_with(drive: &Arc<MockDrive>, auth: &Arc<CountingAuthorizer>) -> DriveClient {
    DriveClient::new(drive.clone(), auth.clone())
}

pub fn setup_temp_dir() -> TempDir {
    init_tracing();
    TempDir::new().expect("Failed to create temp directory")
}

/// One request as seen by [`StubServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/drive/v3/files?q=...`
    pub target: String,
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP server answering each connection with the next scripted reply,
/// then closing it. Stops accepting once the script runs out.
pub struct StubServer {
    pub base: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl StubServer {
    pub async fn start(replies: Vec<(&'static str, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut recorded = Vec::new();
            for (status, body) in replies {
                let (stream, _) = listener.accept().await.unwrap();
                recorded.push(answer(stream, status, &body).await);
            }
            recorded
        });
        Self { base, handle }
    }

    /// Wait for the script to finish and return what was received.
    pub async fn requests(self) -> Vec<RecordedRequest> {
        self.handle.await.unwrap()
    }
}

async fn answer(stream: tokio::net::TcpStream, status: &str, response: &str) -> RecordedRequest {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.unwrap();

    let reply = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response.len(),
        response
    );
    let mut stream = reader.into_inner();
    stream.write_all(reply.as_bytes()).await.unwrap();
    let _ = stream.shutdown().await;

    RecordedRequest {
        method,
        target,
        headers,
        body,
    }
}
