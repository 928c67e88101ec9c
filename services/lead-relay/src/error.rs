// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP-facing error type.

use crate::db::StoreError;
use crate::handlers::ApiResponse;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Client not found.")]
    ClientNotFound,

    #[error("Too many requests. Please try again later.")]
    Throttled { retry_after: Duration },

    #[error("Failed to send Email and SMS.")]
    DeliveryFailed,

    #[error("{0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ClientNotFound => StatusCode::NOT_FOUND,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeliveryFailed | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        // Internal details stay in the log.
        let message = match &self {
            Self::Store(_) | Self::Internal(_) => "Internal server error.".to_string(),
            other => other.to_string(),
        };
        let body = ApiResponse::error(message);

        match self {
            Self::Throttled { retry_after } => {
                let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
