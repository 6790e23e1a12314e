use serde_json::Value;

use super::sniff::{is_json, is_xml, xml_to_value};

/// Decide how a raw payload should be decoded.
///
/// Branch order:
/// 1. content-type starts with `application/json`, or decoding was
///    requested and the payload parses as JSON → JSON value;
/// 2. content-type contains `/xml` or `+xml`, or decoding was requested
///    and the payload validates as XML → structured mapping;
/// 3. otherwise the payload is returned unchanged as text.
///
/// When a content-type forces a branch but the payload does not actually
/// parse, the result is null rather than a fallback to raw text.
pub fn interpret(raw: &str, content_type: Option<&str>, decode: bool) -> Value {
    let ct = content_type.unwrap_or("");

    if ct.starts_with("application/json") || (decode && is_json(raw)) {
        return serde_json::from_str(raw).unwrap_or(Value::Null);
    }

    if ct.contains("/xml") || ct.contains("+xml") || (decode && is_xml(raw)) {
        return xml_to_value(raw).unwrap_or(Value::Null);
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_content_type_decodes_as_json() {
        let value = interpret(r#"{"a": 1}"#, Some("application/json; charset=utf-8"), false);
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn xml_content_type_decodes_as_mapping() {
        let value = interpret("<root><x>1</x></root>", Some("application/xml"), false);
        assert_eq!(value, json!({"x": "1"}));
    }

    #[test]
    fn plus_xml_content_types_also_decode() {
        let value = interpret("<root><x>1</x></root>", Some("application/atom+xml"), false);
        assert_eq!(value, json!({"x": "1"}));
    }

    #[test]
    fn plain_text_without_decode_is_returned_unchanged() {
        let value = interpret("<root><x>1</x></root>", Some("text/plain"), false);
        assert_eq!(value, json!("<root><x>1</x></root>"));
    }

    #[test]
    fn decode_request_sniffs_without_content_type() {
        assert_eq!(interpret(r#"{"a": 1}"#, None, true), json!({"a": 1}));
        assert_eq!(interpret("<r><x>1</x></r>", None, true), json!({"x": "1"}));
        assert_eq!(interpret("plain", None, true), json!("plain"));
    }

    #[test]
    fn forced_json_branch_with_garbage_yields_null() {
        let value = interpret("not json at all", Some("application/json"), false);
        assert_eq!(value, Value::Null);
    }
}
