// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Azure Communication Services channels.
//!
//! Both channels share one contract: build a JSON payload, POST it with the
//! `api-key` header, and treat any status of 300 or above as a failure whose
//! status and body are reported back.

use super::{ChannelKind, DeliveryError, Notification, NotificationChannel};
use serde::Serialize;
use tracing::debug;
use url::Url;

const EMAIL_API_VERSION: &str = "2023-03-31";

/// Parsed `endpoint=...;accesskey=...` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub endpoint: String,
    pub access_key: String,
}

impl ConnectionString {
    pub fn parse(raw: &str) -> Result<Self, DeliveryError> {
        let mut endpoint = None;
        let mut access_key = None;

        for part in raw.split(';').map(str::trim) {
            if let Some(value) = part.strip_prefix("endpoint=") {
                endpoint = Some(value);
            } else if let Some(value) = part.strip_prefix("accesskey=") {
                access_key = Some(value);
            }
        }

        match (endpoint, access_key) {
            (Some(endpoint), Some(key)) if !endpoint.is_empty() && !key.is_empty() => {
                Url::parse(endpoint).map_err(|_| DeliveryError::InvalidConnectionString)?;
                Ok(Self {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    access_key: key.to_string(),
                })
            }
            _ => Err(DeliveryError::InvalidConnectionString),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct EmailRecipients<'a> {
    to: Vec<EmailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct EmailContent<'a> {
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailMessage<'a> {
    sender_address: &'a str,
    recipients: EmailRecipients<'a>,
    content: EmailContent<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reply_to: Vec<EmailAddress<'a>>,
}

impl<'a> EmailMessage<'a> {
    fn from_notification(n: &'a Notification) -> Self {
        Self {
            sender_address: &n.sender_email,
            recipients: EmailRecipients {
                to: vec![EmailAddress {
                    address: &n.recipient_email,
                }],
            },
            content: EmailContent {
                subject: &n.subject,
                html: &n.html,
            },
            reply_to: n
                .reply_to
                .as_deref()
                .map(|address| EmailAddress { address })
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SmsMessage<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    message: &'a str,
}

impl<'a> SmsMessage<'a> {
    fn from_notification(n: &'a Notification) -> Self {
        Self {
            from: &n.sender_phone,
            to: vec![&n.recipient_phone],
            message: &n.text,
        }
    }
}

/// POST `payload` and map the response onto the delivery contract.
async fn post_json<T: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &str,
    access_key: &str,
    payload: &T,
) -> Result<(), DeliveryError> {
    let response = http
        .post(url)
        .header("api-key", access_key)
        .json(payload)
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() >= 300 {
        let body = response.text().await.unwrap_or_default();
        return Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    debug!(%url, status = status.as_u16(), "Provider accepted request");
    Ok(())
}

/// Email channel.
pub struct AzureEmail {
    http: reqwest::Client,
    connection_string: String,
}

impl AzureEmail {
    pub fn new(http: reqwest::Client, connection_string: impl Into<String>) -> Self {
        Self {
            http,
            connection_string: connection_string.into(),
        }
    }
}

impl NotificationChannel for AzureEmail {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let acs = ConnectionString::parse(&self.connection_string)?;
        let url = format!(
            "{}/emails:send?api-version={EMAIL_API_VERSION}",
            acs.endpoint
        );
        let payload = EmailMessage::from_notification(notification);
        post_json(&self.http, &url, &acs.access_key, &payload).await
    }
}

/// SMS channel.
pub struct AzureSms {
    http: reqwest::Client,
    connection_string: String,
}

impl AzureSms {
    pub fn new(http: reqwest::Client, connection_string: impl Into<String>) -> Self {
        Self {
            http,
            connection_string: connection_string.into(),
        }
    }
}

impl NotificationChannel for AzureSms {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let acs = ConnectionString::parse(&self.connection_string)?;
        let url = format!("{}/sms", acs.endpoint);
        let payload = SmsMessage::from_notification(notification);
        post_json(&self.http, &url, &acs.access_key, &payload).await
    }
}
