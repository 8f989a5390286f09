//! Test helpers shared across the workspace.
//!
//! [`EchoServer`] is a real HTTP server on `127.0.0.1:0` that records every request and answers
//! with a JSON echo of it. Two routes behave differently:
//! - `/status/{code}` answers with that status (still echoing the request)
//! - paths registered with [`EchoServer::start_serving`] answer with the fixed document

use anyhow::Context as _;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Raw query string, exactly as sent (empty if none).
    pub query: String,
    /// Lower-cased header names, in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let headers: serde_json::Map<String, Value> = self
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        json!({
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "headers": headers,
            "body": self.body,
        })
    }
}

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    documents: HashMap<String, String>,
}

pub struct EchoServer {
    addr: SocketAddr,
    shared: Arc<Shared>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl EchoServer {
    /// Start an echo server.
    ///
    /// # Panics
    ///
    /// Panics if no loopback port can be bound.
    pub async fn start() -> Self {
        Self::try_start(Vec::new())
            .await
            .expect("start echo server")
    }

    /// Start an echo server that also serves fixed documents at the given paths.
    ///
    /// # Panics
    ///
    /// Panics if no loopback port can be bound.
    pub async fn start_serving(documents: &[(&str, &str)]) -> Self {
        let documents = documents
            .iter()
            .map(|(p, d)| ((*p).to_string(), (*d).to_string()))
            .collect();
        Self::try_start(documents)
            .await
            .expect("start echo server")
    }

    /// # Errors
    ///
    /// Returns an error if binding the loopback listener fails.
    pub async fn try_start(documents: Vec<(String, String)>) -> anyhow::Result<Self> {
        let shared = Arc::new(Shared {
            requests: Mutex::new(Vec::new()),
            documents: documents.into_iter().collect(),
        });

        let app = Router::new()
            .route("/status/{code}", axum::routing::any(status_handler))
            .fallback(echo_handler)
            .with_state(Arc::clone(&shared));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind echo server")?;
        let addr = listener.local_addr().context("echo server local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        Ok(Self {
            addr,
            shared,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// `http://127.0.0.1:<port>` with no trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared.requests.lock().clone()
    }

    /// Shut down gracefully and wait for the server task.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for EchoServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn record(
    shared: &Shared,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> RecordedRequest {
    let recorded = RecordedRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or("").to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(body).into_owned(),
    };
    shared.requests.lock().push(recorded.clone());
    recorded
}

async fn echo_handler(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = record(&shared, &method, &uri, &headers, &body);
    if let Some(document) = shared.documents.get(uri.path()) {
        return document.clone().into_response();
    }
    axum::Json(recorded.to_json()).into_response()
}

async fn status_handler(
    State(shared): State<Arc<Shared>>,
    axum::extract::Path(code): axum::extract::Path<u16>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let recorded = record(&shared, &method, &uri, &headers, &body);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(recorded.to_json())).into_response()
}
