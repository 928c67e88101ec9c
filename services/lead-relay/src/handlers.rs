// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the lead relay.
//!
//! Every request first passes the admission gate ([`throttle`]). Lead
//! submissions are then validated, matched to a client, and fanned out to
//! email and SMS; one working channel is enough for the lead to count as
//! delivered.

use crate::config::Config;
use crate::db::{Database, Lead};
use crate::error::AppError;
use crate::limiter::{Admission, AdmissionGate};
use crate::metrics::Metrics;
use crate::notify::azure::{AzureEmail, AzureSms};
use crate::notify::{template, ChannelKind, Dispatcher, Verdict};
use crate::validator::{self, LeadSubmission, ValidationResult};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type LeadDispatcher = Dispatcher<AzureEmail, AzureSms>;

/// Shared application state.
pub struct AppState {
    pub gate: AdmissionGate,
    pub dispatcher: LeadDispatcher,
    pub db: Database,
    pub metrics: Metrics,
    pub config: Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub status: Status,
    pub message: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

/// Envelope of every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub meta: Meta,
    pub data: BTreeMap<String, String>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: BTreeMap<String, String>) -> Json<Self> {
        Json(Self::new(Status::Success, message.into(), data))
    }

    pub fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self::new(Status::Error, message.into(), BTreeMap::new()))
    }

    fn new(status: Status, message: String, data: BTreeMap<String, String>) -> Self {
        Self {
            meta: Meta {
                status,
                message,
                timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            },
            data,
        }
    }
}

/// Health check endpoint: succeeds when storage answers.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, AppError> {
    if let Err(e) = state.db.ping().await {
        warn!(error = %e, "Health check failed");
        return Err(AppError::Unavailable("Database connection failed.".to_string()));
    }
    Ok(ApiResponse::success(
        "Database is up and running.",
        BTreeMap::new(),
    ))
}

/// Accept a lead for client `id` and notify the client.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let client_id =
        Uuid::parse_str(&id).map_err(|_| AppError::BadRequest("id must be a UUID".to_string()))?;

    let Json(lead) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    if let ValidationResult::Invalid(err) = validator::validate(&lead) {
        info!(%client_id, error = %err, "Lead validation failed");
        return Err(AppError::BadRequest(err.to_string()));
    }

    let client = state
        .db
        .find_active_client(&client_id)
        .await?
        .ok_or(AppError::ClientNotFound)?;

    let notification =
        template::lead_notification(&lead, &client.email, &client.phone, &state.config.provider);
    let outcome = state.dispatcher.dispatch(notification).await;
    state.metrics.record_dispatch(&outcome);

    let verdict = outcome.verdict();
    if !verdict.delivered() {
        return Err(AppError::DeliveryFailed);
    }

    let delivered = outcome.delivered();
    let record = Lead {
        client_id: client_id.to_string(),
        name: lead.name,
        email: lead.email,
        phone: lead.phone,
        message: lead.message,
        delivered: delivered.iter().map(|c| c.as_str().to_string()).collect(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    if let Err(e) = state.db.record_lead(&record).await {
        // The client has already been notified.
        warn!(%client_id, error = %e, "Failed to record lead");
    }

    let message = match verdict {
        Verdict::PartialSuccess { failed } => {
            format!("Lead delivered; the {failed} notification could not be sent.")
        }
        _ => "Email and SMS have been sent to the client.".to_string(),
    };
    info!(%client_id, verdict = verdict.as_str(), "Lead delivered");

    let data = [ChannelKind::Email, ChannelKind::Sms]
        .into_iter()
        .map(|channel| {
            let status = if delivered.contains(&channel) {
                "sent"
            } else {
                "failed"
            };
            (channel.as_str().to_string(), status.to_string())
        })
        .collect();

    Ok(ApiResponse::success(message, data))
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, AppError> {
    state.metrics.set_tracked_keys(state.gate.tracked_keys());
    state
        .metrics
        .render()
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Admission middleware applied to every route.
pub async fn throttle(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request, state.config.http.trust_proxy_headers);

    match state.gate.check(&key) {
        Admission::Allowed { remaining } => {
            state.metrics.record_admission(true);
            debug!(client = %key, remaining, "Request admitted");
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Admission::Limited { retry_after } => {
            state.metrics.record_admission(false);
            debug!(
                client = %key,
                retry_after_ms = retry_after.as_millis() as u64,
                "Request throttled"
            );
            AppError::Throttled { retry_after }.into_response()
        }
    }
}

/// Derive the admission key for a request.
///
/// Forwarding headers are only honoured when the service runs behind a
/// trusted proxy; otherwise the socket peer address is used.
pub fn client_key(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let headers = request.headers();
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()));
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded.or(real_ip) {
            return normalize_ip(ip);
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn normalize_ip(raw: &str) -> String {
    raw.parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|_| raw.to_lowercase())
}
