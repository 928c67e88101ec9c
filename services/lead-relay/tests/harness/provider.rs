// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fake Azure Communication Services endpoint.
//!
//! Records every request and answers with a per-channel status code.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const ACCESS_KEY: &str = "test-key";

/// A request received by the fake provider.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug)]
struct ProviderState {
    requests: Mutex<Vec<RecordedRequest>>,
    email_status: AtomicU16,
    sms_status: AtomicU16,
}

pub struct FakeProvider {
    pub addr: SocketAddr,
    state: Arc<ProviderState>,
}

impl FakeProvider {
    /// Bind an ephemeral port and serve in the background.
    pub async fn start() -> Self {
        let state = Arc::new(ProviderState {
            requests: Mutex::new(Vec::new()),
            email_status: AtomicU16::new(202),
            sms_status: AtomicU16::new(202),
        });

        // `:` in `/emails:send` is not routable, so everything goes through
        // the fallback.
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake provider");
        });

        Self { addr, state }
    }

    pub fn connection_string(&self) -> String {
        format!("endpoint=http://{}/;accesskey={ACCESS_KEY}", self.addr)
    }

    pub fn set_email_status(&self, status: u16) {
        self.state.email_status.store(status, Ordering::SeqCst);
    }

    pub fn set_sms_status(&self, status: u16) {
        self.state.sms_status.store(status, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("requests lock")
            .clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<ProviderState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let status = if path == "/emails:send" {
        state.email_status.load(Ordering::SeqCst)
    } else {
        state.sms_status.load(Ordering::SeqCst)
    };

    let recorded = RecordedRequest {
        path,
        query: uri.query().map(String::from),
        api_key: headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };
    state
        .requests
        .lock()
        .expect("requests lock")
        .push(recorded);

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = if status.is_success() {
        r#"{"id":"fake"}"#.to_string()
    } else {
        r#"{"error":{"code":"Unavailable"}}"#.to_string()
    };
    (status, body)
}
