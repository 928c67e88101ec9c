// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the lead relay.
//!
//! Provides a fake messaging provider, a fully wired application, flood
//! simulation patterns and request generators.

#![allow(dead_code)]

pub mod generators;
pub mod metrics;
pub mod provider;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use lead_relay::{
    config::{Config, ProviderConfig, ThrottleConfig},
    db::{Client, Database},
    handlers::{ApiResponse, AppState},
    limiter::AdmissionGate,
    metrics::Metrics,
    notify::{
        azure::{AzureEmail, AzureSms},
        Dispatcher,
    },
    server,
};
use provider::FakeProvider;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const SENDER_EMAIL: &str = "noreply@relay.example";
pub const SENDER_PHONE: &str = "+15550000000";

/// A wired application backed by an in-memory database and a fake provider.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub provider: FakeProvider,
    /// Active client seeded at startup
    pub client_id: Uuid,
    pub client: Client,
}

pub fn test_client() -> Client {
    Client {
        name: "Acme Plumbing".to_string(),
        email: "office@acme.example".to_string(),
        phone: "+15551112222".to_string(),
        website: Some("https://acme.example".to_string()),
        verified: true,
        deleted_at: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_throttle(throttle: ThrottleConfig) -> Self {
        Self::with_config(Config {
            throttle,
            ..Config::default()
        })
        .await
    }

    pub async fn with_config(mut config: Config) -> Self {
        let provider = FakeProvider::start().await;
        config.provider = ProviderConfig {
            connection_string: provider.connection_string(),
            email_from: SENDER_EMAIL.to_string(),
            sms_from: SENDER_PHONE.to_string(),
            timeout_secs: 5,
        };

        let db = Database::memory().await.expect("in-memory database");
        let client_id = Uuid::new_v4();
        let client = test_client();
        db.upsert_client(&client_id, &client)
            .await
            .expect("seed client");

        let http = reqwest::Client::new();
        let dispatcher = Dispatcher::new(
            AzureEmail::new(http.clone(), config.provider.connection_string.clone()),
            AzureSms::new(http, config.provider.connection_string.clone()),
            config.provider.timeout(),
        );

        let state = Arc::new(AppState {
            gate: AdmissionGate::new(&config.throttle),
            dispatcher,
            db,
            metrics: Metrics::new().expect("metrics registry"),
            config,
        });

        Self {
            router: server::router(state.clone()),
            state,
            provider,
            client_id,
            client,
        }
    }

    /// Send a request as if it arrived from `peer`.
    pub async fn send(&self, mut request: Request<Body>, peer: &str) -> Response {
        let addr: SocketAddr = peer.parse().expect("peer address");
        request.extensions_mut().insert(ConnectInfo(addr));
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, peer: &str) -> Response {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request, peer).await
    }

    pub async fn post_lead(&self, id: &str, body: serde_json::Value, peer: &str) -> Response {
        self.post_raw(id, body.to_string(), peer).await
    }

    pub async fn post_raw(&self, id: &str, body: String, peer: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/leads/{id}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        self.send(request, peer).await
    }
}

/// Decode a JSON envelope.
pub async fn envelope(response: Response) -> ApiResponse {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    serde_json::from_slice(&bytes).expect("JSON envelope")
}

pub async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    String::from_utf8_lossy(&bytes).into_owned()
}
