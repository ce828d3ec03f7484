use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Response envelope used by most backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Request rejected: {message}")]
    Rejected {
        message: String,
        errors: HashMap<String, Vec<String>>,
    },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Whether a JSON value looks like an `ApiEnvelope`
fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .map(|obj| obj.get("success").map_or(false, Value::is_boolean))
        .unwrap_or(false)
}

/// Decode a response body that may or may not be wrapped in an envelope.
///
/// Envelopes with `success: false` become [`EnvelopeError::Rejected`]. A
/// successful envelope without `data` decodes `T` from the envelope itself,
/// which covers endpoints that put their payload next to `success`.
pub fn decode_tolerant<T: DeserializeOwned>(value: Value) -> Result<T, EnvelopeError> {
    if !is_envelope(&value) {
        return Ok(serde_json::from_value(value)?);
    }

    let success = value.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request was not successful")
            .to_string();
        let errors = value
            .get("errors")
            .cloned()
            .map(serde_json::from_value::<HashMap<String, Vec<String>>>)
            .transpose()
            .unwrap_or_default()
            .unwrap_or_default();
        return Err(EnvelopeError::Rejected { message, errors });
    }

    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => Ok(serde_json::from_value(data)?),
            _ => Ok(serde_json::from_value(Value::Object(map))?),
        },
        other => Ok(serde_json::from_value(other)?),
    }
}
