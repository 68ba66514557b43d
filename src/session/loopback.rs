//! Loopback HTTP receiver for the OAuth redirect.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{DriveError, Result};

const SUCCESS_PAGE: &str =
    "<html><body><h3>Authorization complete.</h3><p>You can close this window.</p></body></html>";
const FAILURE_PAGE: &str =
    "<html><body><h3>Authorization failed.</h3><p>Return to the application for details.</p></body></html>";

/// Time allowed for the final browser response to flush after the code arrives.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Outcome carried by a redirect request.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Redirect {
    Code { code: String, state: Option<String> },
    Denied(String),
    /// Not an authorization redirect (e.g. a bare `/` reload)
    Unrelated,
}

/// Shared between the redirect handler and the waiting authorizer.
struct RedirectState {
    expected_state: String,
    outcome: Mutex<Option<oneshot::Sender<Result<String>>>>,
}

impl RedirectState {
    /// Hand the first outcome to the waiter; later ones are dropped.
    fn deliver(&self, outcome: Result<String>) {
        let sender = match self.outcome.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }
}

/// Listens on `127.0.0.1` for the browser redirect carrying the
/// authorization code.
pub(crate) struct LoopbackReceiver {
    listener: TcpListener,
    redirect_uri: String,
}

impl LoopbackReceiver {
    /// Bind an ephemeral port on the loopback interface.
    pub(crate) async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| DriveError::Auth(format!("Cannot bind loopback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| DriveError::Auth(format!("Cannot read loopback address: {}", e)))?
            .port();
        Ok(Self {
            listener,
            redirect_uri: format!("http://127.0.0.1:{}/", port),
        })
    }

    pub(crate) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Serve redirects until one carries a code or an error.
    ///
    /// The code is only accepted when its `state` equals `expected_state`.
    /// Connections are served concurrently, so an idle browser connection
    /// does not hold up the real redirect.
    pub(crate) async fn wait_for_code(self, expected_state: &str) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(RedirectState {
            expected_state: expected_state.to_string(),
            outcome: Mutex::new(Some(tx)),
        });
        let app = Router::new()
            .route("/", get(handle_redirect))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .with_state(state);

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let serve = axum::serve(self.listener, app).with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        });
        let mut server = tokio::spawn(async move { serve.await });

        let outcome = tokio::select! {
            outcome = rx => outcome
                .unwrap_or_else(|_| Err(DriveError::Auth("Loopback receiver closed".to_string()))),
            finished = &mut server => {
                let reason = match finished {
                    Ok(Ok(())) => "stopped".to_string(),
                    Ok(Err(e)) => e.to_string(),
                    Err(e) => e.to_string(),
                };
                return Err(DriveError::Auth(format!("Loopback server failed: {}", reason)));
            }
        };

        let _ = stop_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            debug!("loopback server still draining, aborting");
            server.abort();
        }
        outcome
    }
}

async fn handle_redirect(
    State(state): State<Arc<RedirectState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    match classify_redirect(&params) {
        Redirect::Unrelated => (StatusCode::NOT_FOUND, Html("")),
        Redirect::Denied(reason) => {
            warn!(%reason, "authorization denied in browser");
            state.deliver(Err(DriveError::Auth(format!("Authorization denied: {}", reason))));
            (StatusCode::OK, Html(FAILURE_PAGE))
        }
        Redirect::Code { code, state: returned } => {
            if returned.as_deref() != Some(state.expected_state.as_str()) {
                state.deliver(Err(DriveError::Auth("Authorization state mismatch".to_string())));
                return (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE));
            }
            debug!("authorization redirect received");
            state.deliver(Ok(code));
            (StatusCode::OK, Html(SUCCESS_PAGE))
        }
    }
}

/// Interpret the query parameters of a redirect such as `/?code=abc&state=xyz`.
pub(crate) fn classify_redirect(params: &HashMap<String, String>) -> Redirect {
    if let Some(error) = params.get("error") {
        return Redirect::Denied(error.clone());
    }
    match params.get("code") {
        Some(code) if !code.is_empty() => Redirect::Code {
            code: code.clone(),
            state: params.get("state").cloned(),
        },
        _ => Redirect::Unrelated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> HashMap<String, String> {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_classify_code() {
        assert_eq!(
            classify_redirect(&params("state=s1&code=4%2F0Adeu&scope=x")),
            Redirect::Code {
                code: "4/0Adeu".to_string(),
                state: Some("s1".to_string())
            }
        );
    }

    #[test]
    fn test_classify_denied() {
        assert_eq!(
            classify_redirect(&params("error=access_denied&state=s1")),
            Redirect::Denied("access_denied".to_string())
        );
    }

    #[test]
    fn test_classify_unrelated() {
        assert_eq!(classify_redirect(&params("")), Redirect::Unrelated);
        assert_eq!(classify_redirect(&params("code=")), Redirect::Unrelated);
    }

    #[tokio::test]
    async fn test_receives_code_over_http() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let base = receiver.redirect_uri().to_string();
        assert!(base.starts_with("http://127.0.0.1:"));

        let waiter = tokio::spawn(receiver.wait_for_code("expected"));

        let client = reqwest::Client::new();
        let favicon = client.get(format!("{}favicon.ico", base)).send().await.unwrap();
        assert_eq!(favicon.status(), 404);

        let page = client
            .get(format!("{}?code=abc&state=expected", base))
            .send()
            .await
            .unwrap();
        assert!(page.status().is_success());

        assert_eq!(waiter.await.unwrap().unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_redirect() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let base = receiver.redirect_uri().to_string();
        let addr = base
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        let waiter = tokio::spawn(receiver.wait_for_code("st"));

        // A speculative browser connection that never sends a request.
        let _idle = tokio::net::TcpStream::connect(addr.as_str()).await.unwrap();

        let page = tokio::time::timeout(
            Duration::from_secs(5),
            reqwest::get(format!("{}?code=abc&state=st", base)),
        )
        .await
        .expect("redirect was not served while another connection sat idle")
        .unwrap();
        assert!(page.status().is_success());

        let code = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("receiver did not return")
            .unwrap()
            .unwrap();
        assert_eq!(code, "abc");
    }

    #[tokio::test]
    async fn test_rejects_state_mismatch() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let base = receiver.redirect_uri().to_string();
        let waiter = tokio::spawn(receiver.wait_for_code("expected"));

        let response = reqwest::get(format!("{}?code=abc&state=forged", base))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        assert!(matches!(waiter.await.unwrap(), Err(DriveError::Auth(_))));
    }

    #[tokio::test]
    async fn test_denied_in_browser() {
        let receiver = LoopbackReceiver::bind().await.unwrap();
        let base = receiver.redirect_uri().to_string();
        let waiter = tokio::spawn(receiver.wait_for_code("s"));

        let _ = reqwest::get(format!("{}?error=access_denied&state=s", base)).await;

        assert!(matches!(
            waiter.await.unwrap(),
            Err(DriveError::Auth(m)) if m.contains("access_denied")
        ));
    }
}
