//! Response classification.
//!
//! # Design
//! The device backend speaks two conventions and endpoints pick one:
//!
//! - `Strategy::Legacy`: only HTTP 200 with a JSON body succeeds. Failures
//!   carry an `error` string, and even a 200 may still signal a logical
//!   failure through `{success, error}`, which `check_json_success` catches.
//! - `Strategy::Uniform`: JSON is mandatory, any 2xx succeeds, and failures
//!   carry `{message, code}`.
//!
//! The two differ in their content-type and status preconditions, so they
//! stay separate rather than sharing a code path.

use serde_json::Value;

use crate::error::OperationError;
use crate::http::HttpResponse;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Which backend convention an endpoint follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Legacy,
    Uniform,
}

/// Classify `response` with the given strategy. For `Legacy` this is only
/// the transport-level step; callers apply `check_json_success` afterwards
/// where the endpoint uses the envelope.
pub fn classify(strategy: Strategy, response: &HttpResponse) -> Result<Value, OperationError> {
    match strategy {
        Strategy::Legacy => read_legacy_response(response),
        Strategy::Uniform => read_uniform_response(response),
    }
}

/// Legacy transport-level check: 200 + JSON resolves with the parsed body,
/// anything else rejects with the best message available.
pub fn read_legacy_response(response: &HttpResponse) -> Result<Value, OperationError> {
    let is_json = response.is_json();

    if response.status == 200 && is_json {
        return parse_legacy_body(response);
    }

    if is_json {
        let body = parse_legacy_body(response)?;
        let details = match body.get("error") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
            Some(other) => other.to_string(),
        };
        tracing::debug!(status = response.status, %details, "legacy response rejected");
        return Err(OperationError::backend(details, None));
    }

    let details = if response.body.is_empty() {
        response.reason_phrase()
    } else {
        response.body.clone()
    };
    tracing::debug!(status = response.status, %details, "legacy non-JSON response rejected");
    Err(OperationError::backend(details, None))
}

fn parse_legacy_body(response: &HttpResponse) -> Result<Value, OperationError> {
    serde_json::from_str(&response.body).map_err(|err| {
        tracing::debug!(status = response.status, error = %err, "legacy body is not JSON");
        OperationError::malformed(UNKNOWN_ERROR)
    })
}

/// Enforce the `{success, error}` envelope on an already parsed body.
pub fn check_json_success(envelope: Value) -> Result<Value, OperationError> {
    if let Some(error) = envelope.get("error").filter(|e| is_truthy(e)) {
        let details = match error {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        return Err(OperationError::backend(details, None));
    }
    if !envelope.get("success").is_some_and(is_truthy) {
        return Err(OperationError::backend(UNKNOWN_ERROR, None));
    }
    Ok(envelope)
}

/// Uniform check: JSON is required, any 2xx resolves with the body whatever
/// its shape, everything else rejects with `message` and `code`.
pub fn read_uniform_response(response: &HttpResponse) -> Result<Value, OperationError> {
    if !response.is_json() {
        return Err(OperationError::malformed(
            "Malformed API response, content type must be JSON",
        ));
    }

    let body: Value = serde_json::from_str(&response.body).map_err(|_| {
        OperationError::malformed("Malformed API response, JSON body cannot be parsed")
    })?;

    if response.is_success() {
        return Ok(body);
    }

    let details = match body.get("message").filter(|m| is_truthy(m)) {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => format!("{UNKNOWN_ERROR}: {body}"),
    };
    let code = body.get("code").and_then(Value::as_str).map(str::to_string);
    tracing::debug!(status = response.status, %details, ?code, "uniform response rejected");
    Err(OperationError::backend(details, code))
}

/// JavaScript truthiness, which is what the envelope convention assumes.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn response(status: u16, content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: content_type
                .map(|ct| vec![("Content-Type".to_string(), ct.to_string())])
                .unwrap_or_default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn legacy_accepts_200_json_with_charset() {
        let resp = response(200, Some("application/json; charset=utf-8"), r#"{"success":true}"#);
        assert_eq!(read_legacy_response(&resp).unwrap(), json!({"success": true}));
    }

    #[test]
    fn legacy_rejects_201_even_with_json() {
        let resp = response(201, Some("application/json"), r#"{"success":true,"error":null}"#);
        let err = read_legacy_response(&resp).unwrap_err();
        assert_eq!(err.details, "Unknown error");
    }

    #[test]
    fn legacy_uses_json_error_field() {
        let resp = response(500, Some("application/json"), r#"{"success":false,"error":"disk full"}"#);
        assert_eq!(read_legacy_response(&resp).unwrap_err().details, "disk full");
    }

    #[test]
    fn legacy_uses_text_body_or_reason_phrase() {
        let resp = response(400, Some("text/html"), "The CSRF token is missing.");
        assert_eq!(read_legacy_response(&resp).unwrap_err().details, "The CSRF token is missing.");

        let resp = response(404, None, "");
        assert_eq!(read_legacy_response(&resp).unwrap_err().details, "Not Found");
    }

    #[test]
    fn legacy_unparsable_json_is_unknown_error() {
        let resp = response(200, Some("application/json"), "{not json");
        let err = read_legacy_response(&resp).unwrap_err();
        assert_eq!(err.details, "Unknown error");
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }

    #[test]
    fn envelope_check() {
        assert!(check_json_success(json!({"success": true, "error": null})).is_ok());
        assert_eq!(
            check_json_success(json!({"success": true, "error": "boom"})).unwrap_err().details,
            "boom"
        );
        assert_eq!(
            check_json_success(json!({"success": false, "error": ""})).unwrap_err().details,
            "Unknown error"
        );
        assert_eq!(check_json_success(json!({})).unwrap_err().details, "Unknown error");
    }

    #[test]
    fn uniform_requires_json_content_type() {
        let resp = response(200, Some("text/plain"), r#"{"hostname":"a"}"#);
        let err = read_uniform_response(&resp).unwrap_err();
        assert_eq!(err.details, "Malformed API response, content type must be JSON");
        assert!(err.code.is_none());
    }

    #[test]
    fn uniform_rejects_unparsable_body() {
        let resp = response(200, Some("application/json"), "<html>");
        let err = read_uniform_response(&resp).unwrap_err();
        assert_eq!(err.details, "Malformed API response, JSON body cannot be parsed");
    }

    #[test]
    fn uniform_accepts_any_2xx_shape() {
        let resp = response(204, Some("application/json"), "[1,2]");
        assert_eq!(read_uniform_response(&resp).unwrap(), json!([1, 2]));
    }

    #[test]
    fn uniform_error_carries_message_and_code() {
        let resp = response(
            400,
            Some("application/json"),
            r#"{"message":"Invalid hostname","code":"INVALID_HOSTNAME"}"#,
        );
        let err = read_uniform_response(&resp).unwrap_err();
        assert_eq!(err.details, "Invalid hostname");
        assert_eq!(err.code.as_deref(), Some("INVALID_HOSTNAME"));
    }

    #[test]
    fn uniform_error_without_message_dumps_body() {
        let resp = response(500, Some("application/json"), r#"{"oops":1}"#);
        let err = read_uniform_response(&resp).unwrap_err();
        assert_eq!(err.details, r#"Unknown error: {"oops":1}"#);
        assert!(err.code.is_none());
    }

    #[test]
    fn uniform_unknown_error_keeps_backend_key_order() {
        let resp = response(500, Some("application/json"), r#"{"zeta":1,"alpha":2}"#);
        let err = read_uniform_response(&resp).unwrap_err();
        assert_eq!(err.details, r#"Unknown error: {"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn legacy_null_error_field_is_unknown_error() {
        let resp = response(500, Some("application/json"), r#"{"success":false,"error":null}"#);
        assert_eq!(read_legacy_response(&resp).unwrap_err().details, "Unknown error");
    }

    #[test]
    fn strategy_dispatch() {
        let resp = response(202, Some("application/json"), "{}");
        assert!(classify(Strategy::Uniform, &resp).is_ok());
        assert!(classify(Strategy::Legacy, &resp).is_err());
    }
}
