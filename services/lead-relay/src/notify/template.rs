// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Rendering of lead notifications.

use super::Notification;
use crate::config::ProviderConfig;
use crate::validator::LeadSubmission;

pub const SUBJECT: &str = "New Website Lead";

/// Build the notification sent to a client about a new lead.
pub fn lead_notification(
    lead: &LeadSubmission,
    recipient_email: &str,
    recipient_phone: &str,
    provider: &ProviderConfig,
) -> Notification {
    Notification {
        recipient_email: recipient_email.to_string(),
        recipient_phone: recipient_phone.to_string(),
        sender_email: provider.email_from.clone(),
        sender_phone: provider.sms_from.clone(),
        subject: SUBJECT.to_string(),
        html: html_body(lead),
        text: sms_body(lead),
        reply_to: Some(lead.email.clone()),
    }
}

/// Plain-text body for SMS.
pub fn sms_body(lead: &LeadSubmission) -> String {
    format!(
        "{SUBJECT}\n\nName: {}\nEmail: {}\nPhone: {}\n",
        lead.name, lead.email, lead.phone
    )
}

/// HTML body for email. Every submitted value is escaped.
pub fn html_body(lead: &LeadSubmission) -> String {
    let message = lead.message.as_deref().unwrap_or_default();
    format!(
        r#"<!doctype html>
<html>
  <head>
    <title>{SUBJECT}</title>
    <meta charset="UTF-8" />
    <meta name="robots" content="noindex, nofollow" />
    <meta name="referrer" content="no-referrer" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
  </head>
  <body style="background: #f5f5f5; font-family: Arial, sans-serif; margin: 0; padding: 0">
    <div style="max-width: 600px; margin: 20px auto; background: #fff; border-radius: 8px; padding: 20px">
      <h1 style="text-align: center; color: #333">{SUBJECT}</h1>
      <div style="margin-top: 20px; color: #555">
        <p><strong>Name:</strong> {name}</p>
        <p><strong>Email:</strong> {email}</p>
        <p><strong>Phone:</strong> {phone}</p>
        <p><strong>Message:</strong> {message}</p>
      </div>
      <p style="margin-top: 20px; text-align: center; color: #999; font-size: 14px">This email was sent via the Contact Us form.</p>
    </div>
  </body>
</html>
"#,
        name = escape_html(&lead.name),
        email = escape_html(&lead.email),
        phone = escape_html(&lead.phone),
        message = escape_html(message),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
