mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use common::{client_with, setup_temp_dir, CountingAuthorizer, MockDrive};
use drivepath::{Authorizer, ClientConfig, OAuthAuthorizer, SessionManager, Token, TokenStore};

#[tokio::test]
async fn test_concurrent_first_calls_authorize_once() {
    let auth = CountingAuthorizer::slow(Duration::from_millis(50));
    let manager = Arc::new(SessionManager::new(auth.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = manager.clone();
            tokio::spawn(async move { manager.ensure_session().await })
        })
        .collect();

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(auth.count(), 1);
    assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_operations_share_one_session() {
    let drive = MockDrive::new();
    let auth = CountingAuthorizer::new();
    let client = client_with(&drive, &auth);

    client.create_folder_path("a").await.unwrap();
    client.create_folder_path("b").await.unwrap();
    let id = drive.seed_file("f", b"f");
    client.set_permission(&id).await.unwrap();

    assert_eq!(auth.count(), 1);
    assert!(client.sessions().is_authenticated());
}

#[tokio::test]
async fn test_session_absent_after_failure() {
    let auth = CountingAuthorizer::failing();
    let manager = SessionManager::new(auth.clone());

    assert!(manager.ensure_session().await.is_err());
    assert!(manager.ensure_session().await.is_err());
    assert!(manager.session().is_none());
    assert_eq!(auth.count(), 2);
}

/// Serve one token endpoint request, returning the request body.
async fn serve_token_once(listener: TcpListener, response: &'static str) -> String {
    serve_once(listener, "200 OK", response).await
}

async fn serve_once(listener: TcpListener, status: &str, response: &str) -> String {
    let (stream, _) = listener.accept().await.unwrap();
    let mut reader = BufReader::new(stream);

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap();
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.unwrap();

    let reply = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response.len(),
        response
    );
    let mut stream = reader.into_inner();
    stream.write_all(reply.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();
    String::from_utf8(body).unwrap()
}

async fn write_secrets(dir: &std::path::Path, token_uri: &str) -> std::path::PathBuf {
    let path = dir.join("client_secret.json");
    let json = format!(
        r#"{{"installed":{{"client_id":"cid","client_secret":"csecret","token_uri":"{}"}}}}"#,
        token_uri
    );
    tokio::fs::write(&path, json).await.unwrap();
    path
}

#[tokio::test]
async fn test_expired_cache_is_refreshed_and_persisted() {
    let dir = setup_temp_dir();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let token_uri = format!("http://{}/token", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_token_once(
        listener,
        r#"{"access_token":"fresh-access","expires_in":3599,"token_type":"Bearer"}"#,
    ));

    let secrets = write_secrets(dir.path(), &token_uri).await;
    let config = ClientConfig::new(&secrets).with_working_dir(dir.path().to_string_lossy());
    let store = TokenStore::for_config(&config);
    store
        .save(&Token::new("stale").with_refresh_token("keep-me").expires_at(1))
        .await
        .unwrap();

    let authorizer = OAuthAuthorizer::new(config).unwrap().with_browser(false);
    let token = authorizer.authorize().await.unwrap();

    let request = server.await.unwrap();
    assert!(request.contains("grant_type=refresh_token"));
    assert!(request.contains("refresh_token=keep-me"));
    assert!(request.contains("client_id=cid"));

    assert_eq!(token.access_token, "fresh-access");
    assert_eq!(token.refresh_token.as_deref(), Some("keep-me"));
    assert!(!token.is_expired());

    let persisted = store.load().await.unwrap().unwrap();
    assert_eq!(persisted, token);
}

#[tokio::test]
async fn test_session_refreshes_through_oauth_authorizer() {
    let dir = setup_temp_dir();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let token_uri = format!("http://{}/token", listener.local_addr().unwrap());
    let server = tokio::spawn(serve_token_once(
        listener,
        r#"{"access_token":"second","expires_in":3599}"#,
    ));

    let secrets = write_secrets(dir.path(), &token_uri).await;
    let config = ClientConfig::new(&secrets).with_working_dir(dir.path().to_string_lossy());
    let authorizer = OAuthAuthorizer::new(config).unwrap().with_browser(false);

    let expired = Token::new("first").with_refresh_token("r1").expires_at(1);
    let refreshed = authorizer.refresh(&expired).await.unwrap();
    server.await.unwrap();

    assert_eq!(refreshed.access_token, "second");
    assert_eq!(refreshed.refresh_token.as_deref(), Some("r1"));
    let cached = authorizer.token_store().load().await.unwrap().unwrap();
    assert_eq!(cached.access_token, "second");
}

#[tokio::test]
async fn test_rejected_refresh_is_auth_error() {
    let dir = setup_temp_dir();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(
        listener,
        "400 Bad Request",
        r#"{"error":"invalid_grant","error_description":"Token has been revoked."}"#,
    ));

    let secrets = write_secrets(dir.path(), &format!("http://{}/token", addr)).await;
    let config = ClientConfig::new(&secrets).with_working_dir(dir.path().to_string_lossy());
    let authorizer = OAuthAuthorizer::new(config).unwrap().with_browser(false);

    let err = authorizer
        .refresh(&Token::new("x").with_refresh_token("revoked"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert_eq!(err.kind(), drivepath::ErrorKind::Auth);
    assert!(err.to_string().contains("invalid_grant"));
}
