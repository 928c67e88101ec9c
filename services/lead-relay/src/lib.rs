// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Relay
//!
//! Accepts lead submissions from client websites and forwards them to the
//! client over email and SMS:
//!
//! - Per-IP token-bucket admission with idle eviction
//! - Lead validation (name, phone, email, message)
//! - Concurrent email + SMS delivery through Azure Communication Services
//! - Success / partial success / failure merge of the two channels
//! - Lead history in SurrealDB

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod notify;
pub mod server;
pub mod validator;

pub use config::Config;
pub use error::AppError;
pub use handlers::AppState;
pub use limiter::{Admission, AdmissionGate};
pub use notify::{DispatchOutcome, Dispatcher, Verdict};
pub use validator::{LeadSubmission, ValidationResult};
