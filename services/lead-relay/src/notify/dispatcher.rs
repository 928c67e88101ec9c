// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fan-out/fan-in over the email and SMS channels.

use super::{ChannelKind, DeliveryError, DispatchOutcome, Notification, NotificationChannel};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Sends one notification over both channels concurrently.
pub struct Dispatcher<E, S> {
    email: Arc<E>,
    sms: Arc<S>,
    timeout: Duration,
}

impl<E, S> Clone for Dispatcher<E, S> {
    fn clone(&self) -> Self {
        Self {
            email: Arc::clone(&self.email),
            sms: Arc::clone(&self.sms),
            timeout: self.timeout,
        }
    }
}

impl<E, S> Dispatcher<E, S>
where
    E: NotificationChannel,
    S: NotificationChannel,
{
    /// `timeout` bounds each channel independently.
    pub fn new(email: E, sms: S, timeout: Duration) -> Self {
        Self {
            email: Arc::new(email),
            sms: Arc::new(sms),
            timeout,
        }
    }

    /// Deliver over both channels and wait for both to finish.
    pub async fn dispatch(&self, notification: Notification) -> DispatchOutcome {
        let notification = Arc::new(notification);

        let email = spawn_delivery(Arc::clone(&self.email), Arc::clone(&notification), self.timeout);
        let sms = spawn_delivery(Arc::clone(&self.sms), notification, self.timeout);

        let (email, sms) = tokio::join!(email, sms);

        let outcome = DispatchOutcome {
            email_error: settle(ChannelKind::Email, email),
            sms_error: settle(ChannelKind::Sms, sms),
        };
        debug!(verdict = outcome.verdict().as_str(), "Dispatch complete");
        outcome
    }
}

fn spawn_delivery<C: NotificationChannel>(
    channel: Arc<C>,
    notification: Arc<Notification>,
    timeout: Duration,
) -> JoinHandle<Result<(), DeliveryError>> {
    tokio::spawn(async move {
        let kind = channel.kind();
        let result = match tokio::time::timeout(timeout, channel.deliver(&notification)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(timeout)),
        };
        if result.is_ok() {
            debug!(channel = %kind, "Notification delivered");
        }
        result
    })
}

fn settle(
    channel: ChannelKind,
    joined: Result<Result<(), DeliveryError>, tokio::task::JoinError>,
) -> Option<DeliveryError> {
    let error = match joined {
        Ok(Ok(())) => return None,
        Ok(Err(e)) => e,
        Err(e) => DeliveryError::Aborted(e.to_string()),
    };
    warn!(%channel, error = %error, "Channel delivery failed");
    Some(error)
}
