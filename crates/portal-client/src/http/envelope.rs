//! Uniform success envelope returned by every API call

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::error::{ApiError, FieldErrors};

/// The only shape a successful call resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponseEnvelope<T = Value> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponseEnvelope<T> {
    /// Successful envelope with a payload
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    /// Envelope without a payload
    pub fn message_only(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Transform the payload, keeping the rest of the envelope
    pub fn map_data<U, F>(self, f: F) -> ApiResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ApiResponseEnvelope {
            success: self.success,
            message: self.message,
            data: self.data.map(f),
            errors: self.errors,
        }
    }
}

impl ApiResponseEnvelope<Value> {
    /// Decode the JSON payload into a caller type.
    ///
    /// A missing or `null` payload stays `None`; a payload of the wrong
    /// shape becomes an encoding error tagged with the response status.
    pub fn decode<T: DeserializeOwned>(
        self,
        status: u16,
    ) -> Result<ApiResponseEnvelope<T>, ApiError> {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value).map_err(|e| {
                ApiError::encoding(status, format!("Failed to decode response data: {}", e))
            })?),
        };

        Ok(ApiResponseEnvelope {
            success: self.success,
            message: self.message,
            data,
            errors: self.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Employee {
        id: u32,
        name: String,
    }

    #[test]
    fn test_decode_typed_payload() {
        let envelope = ApiResponseEnvelope::with_data("ok", json!({"id": 7, "name": "Ada"}));
        let typed: ApiResponseEnvelope<Employee> = envelope.decode(200).unwrap();
        assert_eq!(
            typed.data,
            Some(Employee {
                id: 7,
                name: "Ada".to_string()
            })
        );
        assert_eq!(typed.message, "ok");
    }

    #[test]
    fn test_decode_null_payload_is_none() {
        let envelope = ApiResponseEnvelope::with_data("ok", Value::Null);
        let typed: ApiResponseEnvelope<Employee> = envelope.decode(200).unwrap();
        assert!(typed.data.is_none());
    }

    #[test]
    fn test_decode_mismatch_is_encoding_error() {
        let envelope = ApiResponseEnvelope::with_data("ok", json!("not an employee"));
        let err = envelope.decode::<Employee>(201).unwrap_err();
        assert_eq!(err.status, 201);
        assert_eq!(err.kind, crate::http::ErrorKind::Encoding);
        assert!(err.message.starts_with("Failed to decode response data"));
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let envelope: ApiResponseEnvelope = ApiResponseEnvelope::message_only(true, "done");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "message": "done"})
        );
    }

    #[test]
    fn test_map_data() {
        let envelope = ApiResponseEnvelope::with_data("ok", 2);
        let doubled = envelope.map_data(|n| n * 2);
        assert_eq!(doubled.into_data(), Some(4));
    }
}
