//! Mock property-management backend
//!
//! Every request is recorded. Responses are scripted per `(method, path)`;
//! anything unscripted gets a Laravel-style 404.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Path prefix the client's base URL points at
pub const API_PREFIX: &str = "/api";

/// A request as the backend saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path below `/api`
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockBackendState {
    responses: HashMap<(String, String), Scripted>,
    requests: Vec<RecordedRequest>,
}

/// Mock backend server
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<RwLock<MockBackendState>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockBackendState::default()));

        let app = Router::new().fallback(handle_any).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to hand to the client (`http://127.0.0.1:<port>/api`)
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, API_PREFIX)
    }

    /// Script a raw response body
    pub async fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.script(method, path, status, body.into(), None).await;
    }

    /// Script a JSON response
    pub async fn respond_json(&self, method: &str, path: &str, status: u16, body: Value) {
        self.script(method, path, status, body.to_string(), None).await;
    }

    /// Script a JSON response that is only sent after `delay`
    pub async fn respond_after(
        &self,
        method: &str,
        path: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) {
        self.script(method, path, status, body.to_string(), Some(delay))
            .await;
    }

    async fn script(
        &self,
        method: &str,
        path: &str,
        status: u16,
        body: String,
        delay: Option<Duration>,
    ) {
        let mut state = self.state.write().await;
        state.responses.insert(
            (method.to_uppercase(), path.to_string()),
            Scripted {
                status,
                body,
                delay,
            },
        );
    }

    /// All requests received so far, oldest first
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().await.requests.clone()
    }

    /// Requests received for one path
    pub async fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .read()
            .await
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn handle_any(
    State(state): State<Arc<RwLock<MockBackendState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix(API_PREFIX)
        .unwrap_or(uri.path())
        .to_string();

    let scripted = {
        let mut state = state.write().await;
        state.requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.clone(),
            headers,
            body,
        });
        state
            .responses
            .get(&(method.to_string(), path))
            .cloned()
    };

    let Some(scripted) = scripted else {
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"message":"Not Found"}"#.to_string(),
        )
            .into_response();
    };

    if let Some(delay) = scripted.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(scripted.status).unwrap();
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        scripted.body,
    )
        .into_response()
}
