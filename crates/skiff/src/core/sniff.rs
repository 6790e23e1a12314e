//! Payload sniffing: decide whether raw text is JSON or XML, and convert
//! XML documents into structured values.

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};

pub fn is_json(text: &str) -> bool {
    !text.trim().is_empty() && serde_json::from_str::<Value>(text).is_ok()
}

pub fn is_xml(text: &str) -> bool {
    text.trim_start().starts_with('<') && xml_to_value(text).is_some()
}

/// Convert an XML document into a structured value.
///
/// The root element's name is dropped: its children become the top-level
/// mapping, so `<root><x>1</x></root>` yields `{"x": "1"}`. Repeated
/// sibling names collapse into an array. Text-only elements become
/// strings; attributes are ignored.
pub fn xml_to_value(text: &str) -> Option<Value> {
    let mut reader = Reader::from_str(text);

    // (element name, child mapping, accumulated text)
    let mut stack: Vec<(String, Map<String, Value>, String)> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_some() {
                    return None; // second root element
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push((name, Map::new(), String::new()));
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some((_, children, _)) => insert_child(children, name, Value::String(String::new())),
                    None => {
                        if root.is_some() {
                            return None;
                        }
                        root = Some(Value::String(String::new()));
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().ok()?;
                if let Some((_, _, buffer)) = stack.last_mut() {
                    buffer.push_str(text.trim());
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                if let Some((_, _, buffer)) = stack.last_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Ok(Event::End(_)) => {
                let (name, children, text) = stack.pop()?;
                let value = if !children.is_empty() {
                    Value::Object(children)
                } else {
                    Value::String(text)
                };
                match stack.last_mut() {
                    Some((_, parent_children, _)) => insert_child(parent_children, name, value),
                    None => root = Some(value),
                }
            }
            Ok(Event::Eof) => break,
            // declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(_) => return None,
        }
    }

    if stack.is_empty() { root } else { None }
}

fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_objects_and_arrays_are_recognized() {
        assert!(is_json(r#"{"a": 1}"#));
        assert!(is_json("[1, 2, 3]"));
        assert!(!is_json("plain text"));
        assert!(!is_json(""));
    }

    #[test]
    fn xml_detection_requires_a_parseable_document() {
        assert!(is_xml("<root><x>1</x></root>"));
        assert!(!is_xml("not xml"));
        assert!(!is_xml("<unclosed>"));
    }

    #[test]
    fn root_element_name_is_dropped() {
        let value = xml_to_value("<root><x>1</x></root>").unwrap();
        assert_eq!(value, json!({"x": "1"}));
    }

    #[test]
    fn nested_elements_become_nested_objects() {
        let value = xml_to_value("<r><a><b>1</b></a></r>").unwrap();
        assert_eq!(value, json!({"a": {"b": "1"}}));
    }

    #[test]
    fn repeated_siblings_collapse_into_an_array() {
        let value = xml_to_value("<r><item>1</item><item>2</item></r>").unwrap();
        assert_eq!(value, json!({"item": ["1", "2"]}));
    }

    #[test]
    fn text_only_root_becomes_a_string() {
        let value = xml_to_value("<r>hello</r>").unwrap();
        assert_eq!(value, json!("hello"));
    }

    #[test]
    fn escaped_entities_are_unescaped() {
        let value = xml_to_value("<r><x>a &amp; b</x></r>").unwrap();
        assert_eq!(value, json!({"x": "a & b"}));
    }

    #[test]
    fn declaration_is_tolerated() {
        let value = xml_to_value(r#"<?xml version="1.0"?><r><x>1</x></r>"#).unwrap();
        assert_eq!(value, json!({"x": "1"}));
    }
}
