//! Response envelope: `{ "status": "OK" | ..., "data": ..., "message": ... }`

use serde_json::Value;

use crate::transport::RawResponse;
use crate::GatewayError;

/// Status value of a successful envelope
pub const STATUS_OK: &str = "OK";

/// Check the HTTP status and the envelope, returning the `data` payload.
///
/// A missing `data` field yields `Value::Null`.
pub fn open(response: RawResponse) -> Result<Value, GatewayError> {
    if !response.is_success() {
        return Err(GatewayError::Network {
            status: response.status,
            reason: response.reason,
        });
    }

    let envelope: Value = serde_json::from_str(&response.body).map_err(|e| {
        tracing::error!(error = %e, body = %response.body, "backend response is not valid JSON");
        GatewayError::MalformedResponse
    })?;

    let status = envelope.get("status").and_then(Value::as_str);
    if status != Some(STATUS_OK) {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| envelope.to_string());
        return Err(GatewayError::Backend(message));
    }

    Ok(match envelope {
        Value::Object(mut fields) => fields.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ok_envelope_yields_data() {
        let data = open(RawResponse::ok(r#"{"status":"OK","data":[1,2]}"#)).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn ok_without_data_is_null() {
        assert_eq!(open(RawResponse::ok(r#"{"status":"OK"}"#)).unwrap(), Value::Null);
    }

    #[test]
    fn http_failure_is_network_error() {
        let err = open(RawResponse {
            status: 503,
            reason: "Service Unavailable".into(),
            body: "down".into(),
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Network error: 503 Service Unavailable");
    }

    #[test]
    fn backend_message_is_verbatim() {
        let err = open(RawResponse::ok(r#"{"status":"ERROR","message":"Hoja no encontrada"}"#)).unwrap_err();
        match err {
            GatewayError::Backend(message) => assert_eq!(message, "Hoja no encontrada"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn backend_without_message_serializes_envelope() {
        let err = open(RawResponse::ok(r#"{"status":"ERROR"}"#)).unwrap_err();
        match err {
            GatewayError::Backend(message) => assert_eq!(message, r#"{"status":"ERROR"}"#),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = open(RawResponse::ok("<html>login</html>")).unwrap_err();
        assert!(matches!(err, GatewayError::MalformedResponse));
    }
}
