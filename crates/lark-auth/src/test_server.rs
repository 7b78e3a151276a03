//! Local token endpoint for tests
//!
//! Binds an axum server on `127.0.0.1:0` that answers the tenant token
//! exchange. Each successful exchange hands out `t-<n>` where `n` counts the
//! exchanges, so tests can tell a cached token from a fresh one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use common::TENANT_ACCESS_TOKEN_PATH;
use tokio::net::TcpListener;

/// How the mock endpoint answers every exchange.
#[derive(Clone)]
pub(crate) struct TokenReply {
    status: StatusCode,
    code: i64,
    msg: String,
    expire: i64,
    delay: Duration,
}

impl TokenReply {
    pub(crate) fn ok(expire: i64) -> Self {
        Self {
            status: StatusCode::OK,
            code: 0,
            msg: "ok".into(),
            expire,
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn rejected(code: i64, msg: &str) -> Self {
        Self {
            code,
            msg: msg.into(),
            ..Self::ok(0)
        }
    }

    pub(crate) fn http_status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::ok(7200)
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One request as the endpoint saw it.
#[derive(Clone, Debug)]
pub(crate) struct CapturedRequest {
    pub headers: HashMap<String, String>,
    pub body: serde_json::Value,
}

struct ServerState {
    reply: TokenReply,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<CapturedRequest>>>,
}

pub(crate) struct TokenServer {
    pub token_url: String,
    pub calls: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<CapturedRequest>>>,
}

impl TokenServer {
    pub(crate) fn exchanges(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> CapturedRequest {
        self.last_request
            .lock()
            .unwrap()
            .clone()
            .expect("token endpoint was never called")
    }
}

pub(crate) async fn start(reply: TokenReply) -> TokenServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let last_request = Arc::new(Mutex::new(None));
    let state = Arc::new(ServerState {
        reply,
        calls: calls.clone(),
        last_request: last_request.clone(),
    });

    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(TENANT_ACCESS_TOKEN_PATH, post(token_handler))
            .with_state(state);
        axum::serve(listener, app).await.unwrap();
    });

    TokenServer {
        token_url: format!("http://{addr}{TENANT_ACCESS_TOKEN_PATH}"),
        calls,
        last_request,
    }
}

/// Token URL on a server that accepts connections but never answers.
pub(crate) async fn start_silent() -> String {
    let addr = crate::testing::start_silent_listener().await;
    format!("http://{addr}{TENANT_ACCESS_TOKEN_PATH}")
}

async fn token_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let n = state.calls.fetch_add(1, Ordering::SeqCst) + 1;

    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect();
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    *state.last_request.lock().unwrap() = Some(CapturedRequest { headers, body });

    let reply = &state.reply;
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }
    if reply.status != StatusCode::OK {
        return (reply.status, "token service unavailable").into_response();
    }

    let body = if reply.code == 0 {
        serde_json::json!({
            "code": 0,
            "msg": reply.msg,
            "tenant_access_token": format!("t-{n}"),
            "expire": reply.expire,
        })
    } else {
        serde_json::json!({ "code": reply.code, "msg": reply.msg })
    };
    axum::Json(body).into_response()
}
