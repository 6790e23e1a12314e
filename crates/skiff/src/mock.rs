//! Mock overlay: a caller-supplied canned response that fully replaces
//! the dispatch pipeline.

use std::path::PathBuf;

use serde_json::Value;

use crate::core::is_json;
use crate::data::envelope::Payload;
use crate::error::{Error, Result};

/// Where the canned response comes from.
///
/// A [`Text`] payload ending in `.json` is treated as a file path and
/// resolved to the file's contents at arm time.
///
/// [`Text`]: MockSource::Text
#[derive(Debug, Clone)]
pub enum MockSource {
    Value(Value),
    Text(String),
    File(PathBuf),
}

impl From<Value> for MockSource {
    fn from(value: Value) -> Self {
        MockSource::Value(value)
    }
}

impl From<&str> for MockSource {
    fn from(s: &str) -> Self {
        MockSource::Text(s.to_string())
    }
}

impl From<String> for MockSource {
    fn from(s: String) -> Self {
        MockSource::Text(s)
    }
}

impl From<PathBuf> for MockSource {
    fn from(path: PathBuf) -> Self {
        MockSource::File(path)
    }
}

/// Resolve and validate a mock source at arm time.
///
/// When structured decoding is disabled on the client, a non-JSON payload
/// is re-serialized to a JSON string before storage, so the raw accessor
/// always returns JSON-shaped text.
pub(crate) fn arm(source: MockSource, allow_empty: bool, decode_enabled: bool) -> Result<Payload> {
    let payload = match source {
        MockSource::Text(text) if text.ends_with(".json") => Payload::Text(read_mock_file(text.into())?),
        MockSource::Text(text) => Payload::Text(text),
        MockSource::File(path) => Payload::Text(read_mock_file(path)?),
        MockSource::Value(value) => Payload::Structured(value),
    };

    if !allow_empty && is_empty(&payload) {
        return Err(Error::EmptyMock);
    }

    if decode_enabled {
        return Ok(payload);
    }

    Ok(match payload {
        Payload::Text(text) if !is_json(&text) => Payload::Text(Value::String(text).to_string()),
        Payload::Structured(value) => Payload::Text(value.to_string()),
        keep => keep,
    })
}

fn read_mock_file(path: PathBuf) -> Result<String> {
    if !path.is_file() {
        return Err(Error::MockFileNotFound(path));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn is_empty(payload: &Payload) -> bool {
    match payload {
        Payload::Text(text) => text.is_empty(),
        Payload::Structured(value) => match value {
            Value::Null | Value::Bool(false) => true,
            Value::Bool(true) => false,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Number(n) => n.as_i64() == Some(0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payload_is_rejected_unless_allowed() {
        assert!(matches!(arm("".into(), false, true), Err(Error::EmptyMock)));
        assert!(arm("".into(), true, true).is_ok());
        assert!(matches!(arm(json!(null).into(), false, true), Err(Error::EmptyMock)));
    }

    #[test]
    fn missing_mock_file_is_an_arm_time_error() {
        let result = arm("/nonexistent/canned.json".into(), false, true);
        assert!(matches!(result, Err(Error::MockFileNotFound(_))));
    }

    #[test]
    fn json_file_payload_is_resolved_to_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canned.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();

        let payload = arm(path.to_string_lossy().to_string().into(), false, true).unwrap();
        assert_eq!(payload, Payload::Text(r#"{"a": 1}"#.to_string()));
    }

    #[test]
    fn structured_payload_survives_when_decoding_is_enabled() {
        let payload = arm(json!({"a": 1}).into(), false, true).unwrap();
        assert_eq!(payload, Payload::Structured(json!({"a": 1})));
    }

    #[test]
    fn non_json_text_is_reencoded_when_decoding_is_disabled() {
        let payload = arm("hello".into(), false, false).unwrap();
        assert_eq!(payload, Payload::Text(r#""hello""#.to_string()));
    }

    #[test]
    fn structured_payload_is_reencoded_when_decoding_is_disabled() {
        let payload = arm(json!({"a": 1}).into(), false, false).unwrap();
        assert_eq!(payload, Payload::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn json_text_is_left_untouched_when_decoding_is_disabled() {
        let payload = arm(r#"{"a": 1}"#.into(), false, false).unwrap();
        assert_eq!(payload, Payload::Text(r#"{"a": 1}"#.to_string()));
    }
}
