use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Successful call result returned by every verb on [`crate::ApiClient`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Payload decoded into the caller's type.
    pub data: T,
    /// Optional human readable message from the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub success: bool,
    pub status_code: u16,
}

impl<T> ApiResponse<T> {
    /// Drops the envelope and returns the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Field name to list of validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Normalized failure shape carried by every [`crate::ApiError`].
///
/// `status_code` is `0` when no response was received from the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorEnvelope {
    /// Envelope for a failure where the server never answered.
    pub fn without_response(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.trim().is_empty() {
                "Network Error".to_owned()
            } else {
                message
            },
            status_code: 0,
            errors: None,
            timestamp: None,
            path: None,
        }
    }

    /// Validation messages for a single field, if any.
    pub fn field_errors(&self, field: &str) -> Option<&[String]> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.get(field))
            .map(Vec::as_slice)
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status {})", self.message, self.status_code)
    }
}
