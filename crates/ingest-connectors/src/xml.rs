//! XML to JSON bridge for the OAI-PMH source.
//!
//! Converts an XML document into a `serde_json::Value` with the shape the
//! downstream extraction code expects:
//! - attributes become `"@name"` keys
//! - element text becomes `"#text"` (collapsed to a plain string when the
//!   element has no attributes or children)
//! - repeated sibling elements become arrays
//! - namespace prefixes are kept in key names (`edm:ProvidedCHO`)

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::ConnectorError;

/// Parse an XML document into a JSON value keyed by the root element name.
pub fn xml_to_value(xml: &str) -> Result<Value, ConnectorError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Stack of (element name, accumulated node) for open elements.
    let mut stack: Vec<(String, Map<String, Value>)> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = qualified_name(e.name().as_ref())?;
                let mut node = Map::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| ConnectorError::Xml(e.to_string()))?;
                    let key = format!("@{}", qualified_name(attr.key.as_ref())?);
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ConnectorError::Xml(e.to_string()))?;
                    node.insert(key, Value::String(value.into_owned()));
                }
                stack.push((name, node));
            }
            Ok(Event::Empty(e)) => {
                let name = qualified_name(e.name().as_ref())?;
                let mut node = Map::new();
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| ConnectorError::Xml(e.to_string()))?;
                    let key = format!("@{}", qualified_name(attr.key.as_ref())?);
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ConnectorError::Xml(e.to_string()))?;
                    node.insert(key, Value::String(value.into_owned()));
                }
                attach(&mut stack, &mut root, name, collapse(node));
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| ConnectorError::Xml(e.to_string()))?
                    .into_owned();
                if text.is_empty() {
                    continue;
                }
                if let Some((_, node)) = stack.last_mut() {
                    insert_value(node, "#text".to_string(), Value::String(text));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8(e.to_vec())
                    .map_err(|e| ConnectorError::Xml(e.to_string()))?;
                if let Some((_, node)) = stack.last_mut() {
                    insert_value(node, "#text".to_string(), Value::String(text));
                }
            }
            Ok(Event::End(_)) => {
                let (name, node) = stack
                    .pop()
                    .ok_or_else(|| ConnectorError::Xml("Unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, name, collapse(node));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ConnectorError::Xml(e.to_string())),
        }
    }

    match root {
        Some((name, value)) => {
            let mut doc = Map::new();
            doc.insert(name, value);
            Ok(Value::Object(doc))
        }
        None => Err(ConnectorError::Xml("Empty document".to_string())),
    }
}

fn qualified_name(raw: &[u8]) -> Result<String, ConnectorError> {
    std::str::from_utf8(raw)
        .map(|s| s.to_string())
        .map_err(|e| ConnectorError::Xml(format!("Invalid UTF-8 in name: {}", e)))
}

/// Collapse a text-only element to its string; empty elements become null.
fn collapse(node: Map<String, Value>) -> Value {
    if node.is_empty() {
        return Value::Null;
    }
    if node.len() == 1 {
        if let Some(text) = node.get("#text") {
            return text.clone();
        }
    }
    Value::Object(node)
}

/// Attach a completed element to its parent, or record it as the root.
fn attach(
    stack: &mut [(String, Map<String, Value>)],
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) {
    if let Some((_, parent)) = stack.last_mut() {
        insert_value(parent, name, value);
    } else if root.is_none() {
        *root = Some((name, value));
    }
}

/// Insert a key, promoting repeated keys to arrays.
fn insert_value(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(key, value);
        }
    }
}
