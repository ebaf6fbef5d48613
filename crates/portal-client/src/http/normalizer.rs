//! Response normalization
//!
//! Converts a raw HTTP response into the uniform [`ApiResponseEnvelope`] or
//! an [`ApiError`]. Upstream shapes vary: already-enveloped JSON, bare JSON,
//! plain text and empty bodies all end up in one of those two outcomes.

use serde_json::Value;

use crate::http::envelope::ApiResponseEnvelope;
use crate::http::error::{parse_field_errors, ApiError};
use crate::http::transport::RawResponse;

const NO_CONTENT: u16 = 204;
const SUCCESS_MESSAGE: &str = "Operation completed successfully";
const TEXT_SUCCESS_MESSAGE: &str = "Operation completed";
const UNKNOWN_ERROR: &str = "Unknown error";

/// Normalize a raw response.
///
/// Never fails for a well-formed response; the only errors are the explicit
/// [`ApiError`]s built for failing statuses.
pub fn normalize_response(response: &RawResponse) -> Result<ApiResponseEnvelope, ApiError> {
    if response.status == NO_CONTENT {
        return Ok(ApiResponseEnvelope::message_only(true, SUCCESS_MESSAGE));
    }

    let ok = response.is_ok();

    let parsed = match serde_json::from_str::<Value>(&response.body) {
        Ok(parsed) => parsed,
        Err(_) => return normalize_text(response, ok),
    };

    if !ok {
        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_message(&response.status_text));
        let errors = parse_field_errors(parsed.get("errors"));
        return Err(ApiError::from_response(response.status, message, errors));
    }

    if is_envelope(&parsed) {
        return Ok(pass_through(parsed));
    }

    Ok(ApiResponseEnvelope::with_data(SUCCESS_MESSAGE, parsed))
}

fn normalize_text(response: &RawResponse, ok: bool) -> Result<ApiResponseEnvelope, ApiError> {
    let text = response.body.trim();

    if !ok {
        let message = if text.is_empty() {
            fallback_message(&response.status_text)
        } else {
            text.to_string()
        };
        return Err(ApiError::from_response(response.status, message, None));
    }

    let message = if text.is_empty() { TEXT_SUCCESS_MESSAGE } else { text };
    Ok(ApiResponseEnvelope::message_only(ok, message))
}

fn fallback_message(status_text: &str) -> String {
    if status_text.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        status_text.to_string()
    }
}

fn is_envelope(parsed: &Value) -> bool {
    parsed
        .as_object()
        .is_some_and(|object| object.contains_key("success") && object.contains_key("message"))
}

/// Keep a server envelope as sent, including a negative `success`
fn pass_through(parsed: Value) -> ApiResponseEnvelope {
    let success = match parsed.get("success") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Null) | None => false,
        Some(_) => true,
    };

    let message = match parsed.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let data = parsed.get("data").filter(|data| !data.is_null()).cloned();
    let errors = parse_field_errors(parsed.get("errors"));

    ApiResponseEnvelope {
        success,
        message,
        data,
        errors,
    }
}
