//! Mock Lark API for tests
//!
//! An axum server on `127.0.0.1:0` mounted under `/open-apis`. The token
//! endpoint issues `t-mock`; every other request is captured and answered
//! with the configured reply.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use common::{ApiConfig, Secret, TENANT_ACCESS_TOKEN_PATH};
use tokio::net::TcpListener;

use crate::client::LarkClient;

pub(crate) const MOCK_TOKEN: &str = "t-mock";

/// A request as the mock server received it.
#[derive(Clone, Debug)]
pub(crate) struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl CapturedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub(crate) fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

struct MockState {
    token_reply: serde_json::Value,
    status: StatusCode,
    reply: String,
    token_calls: AtomicUsize,
    captured: Mutex<Vec<CapturedRequest>>,
}

pub(crate) struct MockLark {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockLark {
    /// Serve `{"code":0,"msg":"success","data":<data>}` for every API call.
    pub(crate) async fn ok(data: serde_json::Value) -> Self {
        Self::json(serde_json::json!({ "code": 0, "msg": "success", "data": data })).await
    }

    /// Serve a failing envelope with HTTP 200.
    pub(crate) async fn api_error(code: i64, msg: &str) -> Self {
        Self::json(serde_json::json!({ "code": code, "msg": msg })).await
    }

    pub(crate) async fn json(reply: serde_json::Value) -> Self {
        Self::start(StatusCode::OK, reply.to_string(), default_token_reply()).await
    }

    pub(crate) async fn start(
        status: StatusCode,
        reply: String,
        token_reply: serde_json::Value,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = Arc::new(MockState {
            token_reply,
            status,
            reply,
            token_calls: AtomicUsize::new(0),
            captured: Mutex::new(Vec::new()),
        });

        let app = axum::Router::new()
            .route(
                &format!("/open-apis{TENANT_ACCESS_TOKEN_PATH}"),
                post(token_handler),
            )
            .fallback(api_handler)
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/open-apis"),
            state,
        }
    }

    pub(crate) fn api_config(&self) -> ApiConfig {
        ApiConfig::with_base_url(&self.base_url).timeout_secs(5)
    }

    /// Client authenticating through the mock token endpoint.
    pub(crate) fn client(&self) -> LarkClient {
        LarkClient::new(
            &self.api_config(),
            "test-app-id",
            Secret::new("test-app-secret"),
        )
        .unwrap()
    }

    pub(crate) fn token_exchanges(&self) -> usize {
        self.state.token_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> CapturedRequest {
        self.requests()
            .pop()
            .expect("no API request reached the mock server")
    }
}

fn default_token_reply() -> serde_json::Value {
    serde_json::json!({
        "code": 0,
        "msg": "ok",
        "tenant_access_token": MOCK_TOKEN,
        "expire": 7200,
    })
}

/// Base URL on a server that accepts connections but never answers.
pub(crate) async fn start_silent() -> String {
    let addr = lark_auth::testing::start_silent_listener().await;
    format!("http://{addr}/open-apis")
}

async fn token_handler(State(state): State<Arc<MockState>>) -> Response {
    state.token_calls.fetch_add(1, Ordering::SeqCst);
    axum::Json(state.token_reply.clone()).into_response()
}

async fn api_handler(State(state): State<Arc<MockState>>, request: Request<Body>) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    let body = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap();

    state.captured.lock().unwrap().push(CapturedRequest {
        method,
        path,
        query,
        headers,
        body,
    });

    (
        state.status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        state.reply.clone(),
    )
        .into_response()
}
