// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Dual-channel client notification.
//!
//! A [`Notification`] is delivered over email and SMS at the same time by the
//! [`Dispatcher`]. Each channel's failure is kept separately in a
//! [`DispatchOutcome`] and never aborts the other channel.

pub mod azure;
pub mod dispatcher;
pub mod template;

pub use dispatcher::Dispatcher;

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Email,
    Sms,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical notification, rendered for both channels.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient_email: String,
    pub recipient_phone: String,
    pub sender_email: String,
    pub sender_phone: String,
    pub subject: String,
    /// Email body
    pub html: String,
    /// SMS body
    pub text: String,
    pub reply_to: Option<String>,
}

/// Why a single channel failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid provider connection string")]
    InvalidConnectionString,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("delivery task aborted: {0}")]
    Aborted(String),
}

/// A channel that can deliver a [`Notification`].
pub trait NotificationChannel: Send + Sync + 'static {
    fn kind(&self) -> ChannelKind;

    fn deliver(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Merged verdict over both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    PartialSuccess { failed: ChannelKind },
    Failure,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess { .. } => "partial",
            Self::Failure => "failure",
        }
    }

    /// At least one channel delivered.
    pub fn delivered(&self) -> bool {
        !matches!(self, Self::Failure)
    }
}

/// Per-channel results of a dispatch.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub email_error: Option<DeliveryError>,
    pub sms_error: Option<DeliveryError>,
}

impl DispatchOutcome {
    pub fn verdict(&self) -> Verdict {
        match (&self.email_error, &self.sms_error) {
            (None, None) => Verdict::Success,
            (Some(_), None) => Verdict::PartialSuccess {
                failed: ChannelKind::Email,
            },
            (None, Some(_)) => Verdict::PartialSuccess {
                failed: ChannelKind::Sms,
            },
            (Some(_), Some(_)) => Verdict::Failure,
        }
    }

    pub fn error(&self, channel: ChannelKind) -> Option<&DeliveryError> {
        match channel {
            ChannelKind::Email => self.email_error.as_ref(),
            ChannelKind::Sms => self.sms_error.as_ref(),
        }
    }

    /// Channels that delivered successfully.
    pub fn delivered(&self) -> Vec<ChannelKind> {
        [ChannelKind::Email, ChannelKind::Sms]
            .into_iter()
            .filter(|c| self.error(*c).is_none())
            .collect()
    }
}
