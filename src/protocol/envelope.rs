//! Reply envelope decoding
//!
//! Normalizes both envelope shapes into one [`Envelope`]: the primary code
//! and message, the payload object holding `data`, `dataInfo`, `recordId`
//! and `modId`, and the three script-stage codes.

use serde_json::{Map, Value};

use super::errors::{ProtocolError, ProtocolResult};
use super::generation::EnvelopeShape;

/// Status codes of the three script stages. Absent stages report 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptErrors {
    pub pre_request: i64,
    pub pre_sort: i64,
    pub post_request: i64,
}

impl ScriptErrors {
    pub fn any(&self) -> bool {
        self.pre_request != 0 || self.pre_sort != 0 || self.post_request != 0
    }
}

/// Decoded reply envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: i64,
    pub message: String,
    pub payload: Map<String, Value>,
    pub script_errors: ScriptErrors,
}

impl Envelope {
    /// Returns true when the primary code reports success
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Records array of the payload; absent means no records
    pub fn data(&self) -> ProtocolResult<&[Value]> {
        match self.payload.get("data") {
            None | Some(Value::Null) => Ok(&[][..]),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(_) => Err(ProtocolError::malformed("\"data\" is not an array")),
        }
    }

    /// Text of a scalar payload member such as `recordId`
    pub fn payload_text(&self, key: &str) -> Option<String> {
        self.payload.get(key).and_then(scalar_text)
    }
}

pub(crate) fn decode(shape: EnvelopeShape, raw: &str) -> ProtocolResult<Envelope> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| ProtocolError::malformed(format!("reply is not JSON: {}", e)))?;
    let root = match root {
        Value::Object(map) => map,
        _ => return Err(ProtocolError::malformed("reply is not a JSON object")),
    };

    match shape {
        EnvelopeShape::Flat => decode_flat(root),
        EnvelopeShape::Messages => decode_messages(root),
    }
}

fn decode_flat(root: Map<String, Value>) -> ProtocolResult<Envelope> {
    let code = root
        .get("errorCode")
        .ok_or_else(|| ProtocolError::malformed("missing \"errorCode\""))
        .and_then(|v| parse_code("errorCode", v))?;
    let message = root
        .get("errorMessage")
        .or_else(|| root.get("result"))
        .and_then(scalar_text)
        .unwrap_or_default();

    Ok(Envelope {
        code,
        message,
        payload: root,
        script_errors: ScriptErrors::default(),
    })
}

fn decode_messages(mut root: Map<String, Value>) -> ProtocolResult<Envelope> {
    let first = match root.get("messages") {
        Some(Value::Array(messages)) => messages
            .first()
            .ok_or_else(|| ProtocolError::malformed("\"messages\" is empty"))?,
        Some(_) => return Err(ProtocolError::malformed("\"messages\" is not an array")),
        None => return Err(ProtocolError::malformed("missing \"messages\"")),
    };
    let code = first
        .get("code")
        .ok_or_else(|| ProtocolError::malformed("message without \"code\""))
        .and_then(|v| parse_code("code", v))?;
    let message = first.get("message").and_then(scalar_text).unwrap_or_default();

    let payload = match root.remove("response") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(ProtocolError::malformed("\"response\" is not an object")),
    };

    let script_errors = ScriptErrors {
        pre_request: optional_code(&payload, "scriptError.prerequest")?,
        pre_sort: optional_code(&payload, "scriptError.presort")?,
        post_request: optional_code(&payload, "scriptError")?,
    };

    Ok(Envelope {
        code,
        message,
        payload,
        script_errors,
    })
}

fn optional_code(payload: &Map<String, Value>, key: &str) -> ProtocolResult<i64> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(0),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(value) => parse_code(key, value),
    }
}

/// Parse a status code sent either as a JSON number or as text
fn parse_code(key: &str, value: &Value) -> ProtocolResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ProtocolError::malformed(format!("\"{}\" is not a status code: {}", key, value)))
}

/// Render a scalar JSON value as text; objects and arrays keep their JSON form
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_envelope() {
        let raw = r#"{"messages":[{"code":"0","message":"OK"}],"response":{"data":[]}}"#;
        let env = decode(EnvelopeShape::Messages, raw).unwrap();
        assert!(env.is_ok());
        assert_eq!(env.message, "OK");
        assert!(env.data().unwrap().is_empty());
        assert!(!env.script_errors.any());
    }

    #[test]
    fn test_numeric_code_accepted() {
        let raw = r#"{"messages":[{"code":401,"message":"No records match the request"}]}"#;
        let env = decode(EnvelopeShape::Messages, raw).unwrap();
        assert_eq!(env.code, 401);
        assert!(env.payload.is_empty());
    }

    #[test]
    fn test_script_errors_decoded() {
        let raw = r#"{"messages":[{"code":"0","message":"OK"}],
            "response":{"scriptError":"3","scriptError.prerequest":"0","scriptError.presort":"101"}}"#;
        let env = decode(EnvelopeShape::Messages, raw).unwrap();
        assert_eq!(env.script_errors.post_request, 3);
        assert_eq!(env.script_errors.pre_request, 0);
        assert_eq!(env.script_errors.pre_sort, 101);
    }

    #[test]
    fn test_flat_envelope() {
        let raw = r#"{"errorCode":"0","result":"OK","data":[{"recordId":"1"}],"recordId":"1"}"#;
        let env = decode(EnvelopeShape::Flat, raw).unwrap();
        assert_eq!(env.code, 0);
        assert_eq!(env.message, "OK");
        assert_eq!(env.data().unwrap().len(), 1);
        assert_eq!(env.payload_text("recordId").as_deref(), Some("1"));
        assert_eq!(env.script_errors, ScriptErrors::default());
    }

    #[test]
    fn test_not_json_is_malformed() {
        let err = decode(EnvelopeShape::Messages, "<html>502</html>").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_missing_messages_is_malformed() {
        let err = decode(EnvelopeShape::Messages, r#"{"response":{}}"#).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let raw = r#"{"messages":[{"code":"0","message":"OK"}],"response":{}}"#;
        assert!(decode(EnvelopeShape::Flat, raw).unwrap_err().is_malformed());
    }

    #[test]
    fn test_garbage_script_code_is_malformed() {
        let raw = r#"{"messages":[{"code":"0"}],"response":{"scriptError":"oops"}}"#;
        assert!(decode(EnvelopeShape::Messages, raw).unwrap_err().is_malformed());
    }

    #[test]
    fn test_data_not_array_is_malformed() {
        let raw = r#"{"messages":[{"code":"0"}],"response":{"data":{}}}"#;
        let env = decode(EnvelopeShape::Messages, raw).unwrap();
        assert!(env.data().is_err());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&serde_json::json!(12)).as_deref(), Some("12"));
        assert_eq!(scalar_text(&serde_json::json!("x")).as_deref(), Some("x"));
        assert_eq!(scalar_text(&Value::Null), None);
    }
}
