//! Structured errors returned by every API call

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::session::StoreError;

/// Field name -> messages, as sent by the backend under `errors`
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response within the per-call timeout
    #[error("Request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// Connection refused/reset, DNS failure, TLS failure, ...
    #[error("Network error: {0}")]
    Network(String),

    /// Body was neither JSON nor contained an embedded JSON value
    #[error("Invalid JSON response (HTTP {status})")]
    InvalidJson { status: u16 },

    /// Non-2xx HTTP status
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        validation_errors: Option<ValidationErrors>,
    },

    /// Payload did not match the expected type
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// Rejected client-side before any request was sent
    #[error("Validation failed")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Session(#[from] StoreError),
}

impl ApiError {
    /// Build the error for a non-2xx response from its (possibly unparseable) body
    pub fn from_status(status: u16, reason: Option<&str>, body: Option<&Value>) -> Self {
        let message = body
            .and_then(|b| string_field(b, "message").or_else(|| string_field(b, "error")))
            .unwrap_or_else(|| match reason {
                Some(reason) => format!("Request failed with status {} ({})", status, reason),
                None => format!("Request failed with status {}", status),
            });

        let validation_errors = body.and_then(|b| {
            b.get("errors")
                .or_else(|| b.get("data").and_then(|d| d.get("errors")))
                .and_then(normalize_validation_errors)
        });

        ApiError::Status {
            status,
            message,
            validation_errors,
        }
    }

    /// HTTP status code, when the failure came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::InvalidJson { status } => Some(*status),
            _ => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApiError::Status {
                validation_errors, ..
            } => validation_errors.as_ref(),
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Short text suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout { .. } => "Request timed out. Please try again.".to_string(),
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::InvalidJson { .. } => "Invalid response from server".to_string(),
            ApiError::Validation(_) => "Please correct the highlighted fields".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Normalize `{ field: "msg" | ["msg", ...] }` into a field -> messages map.
/// Returns None for anything that is not a non-empty object.
pub fn normalize_validation_errors(errors: &Value) -> Option<ValidationErrors> {
    let object = errors.as_object()?;
    let map: ValidationErrors = object
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}
