//! Response classification: PDF bytes or a service error?
//!
//! The API answers `200 OK` in both cases. A failure is a JSON object with a
//! nested `error` object; anything else is the PDF itself and is passed
//! through untouched.

use crate::error::ServiceError;
use bytes::Bytes;
use serde_json::Value;

/// Classify a raw response body.
///
/// Returns the body unchanged on success, or the [`ServiceError`] built from
/// the payload's `error` object.
pub fn classify(body: Bytes) -> Result<Bytes, ServiceError> {
    match service_error(&body) {
        Some(err) => Err(err),
        None => Ok(body),
    }
}

/// Extract the service error from `body`, if it is an error payload.
pub fn service_error(body: &[u8]) -> Option<ServiceError> {
    // PDF output starts with "%PDF"; skip the JSON parse entirely.
    if body.starts_with(b"%PDF") {
        return None;
    }
    let Ok(Value::Object(mut payload)) = serde_json::from_slice::<Value>(body) else {
        return None;
    };
    match payload.remove("error")? {
        Value::Null => None,
        obj @ Value::Object(_) => Some(
            serde_json::from_value(obj.clone()).unwrap_or_else(|_| lenient_service_error(obj)),
        ),
        other => Some(ServiceError {
            code: 0,
            kind: "unknown".into(),
            info: match other {
                Value::String(s) => s,
                v => v.to_string(),
            },
            extra: serde_json::Map::new(),
        }),
    }
}

/// Build a `ServiceError` from an error object whose fields have unexpected
/// types (e.g. `"code": "134"`).
fn lenient_service_error(obj: Value) -> ServiceError {
    let Value::Object(mut map) = obj else {
        return ServiceError {
            code: 0,
            kind: "unknown".into(),
            info: obj.to_string(),
            extra: serde_json::Map::new(),
        };
    };
    let text = |v: Option<Value>| match v {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(v) => v.to_string(),
    };
    let code = match map.remove("code") {
        Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    };
    ServiceError {
        code,
        kind: text(map.remove("type")),
        info: text(map.remove("info")),
        extra: map,
    }
}
