// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Lead submission validator.
//!
//! Enforces field presence and length bounds, the `+<digits>` phone format
//! and a conservative email address shape before a lead reaches the
//! notification or storage layers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Lead submitted through a website contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("phone number must start with + and contain at least 10 digits")]
    InvalidPhone,

    #[error("email must be a valid email address")]
    InvalidEmail,
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Submission is valid
    Valid,
    /// Submission is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// Validate a full submission, reporting the first failing field.
pub fn validate(lead: &LeadSubmission) -> ValidationResult {
    let checks = [
        check_required("name", &lead.name, 2, 31),
        check_required("phone", &lead.phone, 10, 15),
        check_required("email", &lead.email, 5, 255),
    ];
    if let Some(err) = checks.into_iter().find_map(Result::err) {
        debug!(error = %err, "Lead rejected");
        return ValidationResult::Invalid(err);
    }

    if let Some(message) = &lead.message {
        if let Err(err) = check_length("message", message, 2, 255) {
            return ValidationResult::Invalid(err);
        }
    }

    if !is_valid_phone(&lead.phone) {
        return ValidationResult::Invalid(ValidationError::InvalidPhone);
    }
    if !is_valid_email(&lead.email) {
        return ValidationResult::Invalid(ValidationError::InvalidEmail);
    }

    ValidationResult::Valid
}

fn check_required(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    check_length(field, value, min, max)
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Length { field, min, max })
    }
}

/// `+` followed by 10 to 15 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    match phone.strip_prefix('+') {
        Some(digits) => (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Single `@`, a local part of `[A-Za-z0-9._%+-]` and a dotted domain of
/// `[A-Za-z0-9-]` labels.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));

    let labels: Vec<&str> = domain.split('.').collect();
    let domain_ok = labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    local_ok && domain_ok
}
