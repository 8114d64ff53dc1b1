use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{
    types::FieldErrors,
    wire::{ErrorBody, ResponseBody, ENVELOPE_KEYS},
    ApiError, ApiResponse, ErrorEnvelope,
};

/// Decodes a 2xx body into the response envelope.
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<ApiResponse<T>, ApiError> {
    let decode_error = |detail: String| {
        ApiError::Decode(ErrorEnvelope {
            message: format!("invalid response body: {detail}"),
            status_code: status.as_u16(),
            errors: None,
            timestamp: None,
            path: None,
        })
    };

    let value = if body.trim().is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_str::<JsonValue>(body).map_err(|err| decode_error(err.to_string()))?
    };

    let is_envelope = value
        .as_object()
        .is_some_and(|map| ENVELOPE_KEYS.iter().any(|key| map.contains_key(*key)));

    let raw = if is_envelope {
        serde_json::from_value::<ResponseBody>(value)
            .map_err(|err| decode_error(err.to_string()))?
    } else {
        ResponseBody {
            data: value,
            message: None,
            success: None,
            status_code: None,
        }
    };

    let data = serde_json::from_value::<T>(raw.data)
        .map_err(|err| decode_error(format!("data does not match expected type: {err}")))?;

    Ok(ApiResponse {
        data,
        message: raw.message,
        success: raw.success.unwrap_or(true),
        status_code: raw.status_code.unwrap_or_else(|| status.as_u16()),
    })
}

/// Normalizes a non-success response into an error envelope.
///
/// Bodies that are not JSON, or JSON without a usable `message`, fall back to
/// `Request failed with status code <n>`.
pub(crate) fn decode_error_envelope(status: StatusCode, body: &str) -> ErrorEnvelope {
    let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();

    let message = parsed
        .message
        .and_then(|message| match message {
            JsonValue::String(text) if !text.trim().is_empty() => Some(text),
            // NestJS style: validation messages as an array.
            JsonValue::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                (!joined.is_empty()).then_some(joined)
            }
            _ => None,
        })
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    ErrorEnvelope {
        message,
        status_code: status.as_u16(),
        errors: parsed.errors.and_then(normalize_field_errors),
        timestamp: parsed.timestamp.and_then(|value| match value {
            JsonValue::String(text) => Some(text),
            JsonValue::Number(number) => Some(number.to_string()),
            _ => None,
        }),
        path: parsed.path,
    }
}

fn normalize_field_errors(value: JsonValue) -> Option<FieldErrors> {
    let JsonValue::Object(map) = value else {
        return None;
    };

    let errors: FieldErrors = map
        .into_iter()
        .filter_map(|(field, messages)| {
            let messages = match messages {
                JsonValue::String(text) => vec![text],
                JsonValue::Array(items) => items
                    .into_iter()
                    .filter_map(|item| match item {
                        JsonValue::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
                _ => return None,
            };
            Some((field, messages))
        })
        .collect();

    (!errors.is_empty()).then_some(errors)
}
