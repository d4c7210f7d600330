//! Unwrapping of provider-native result envelopes
//!
//! An MCP `tools/call` result looks like
//! `{"content": [{"type": "text", "text": "..."}], "isError": false}`.
//! The model only needs the payload, so the envelope is peeled off before the
//! result is written to the transcript. Values that are not envelopes pass
//! through unchanged.

use serde_json::Value;

/// Whether `value` looks like an MCP `CallToolResult`
pub fn is_envelope(value: &Value) -> bool {
    match value.get("content").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .all(|item| item.get("type").and_then(Value::as_str).is_some()),
        None => value.get("structuredContent").is_some(),
    }
}

/// Text carried by the envelope's text items, joined by newlines
pub fn envelope_text(value: &Value) -> Option<String> {
    let items = value.get("content")?.as_array()?;
    let texts: Vec<&str> = items
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// Extract the raw payload from a tool provider result
pub fn unwrap_envelope(value: Value) -> Value {
    if !is_envelope(&value) {
        return value;
    }

    if let Some(structured) = value.get("structuredContent") {
        return structured.clone();
    }

    let items = value
        .get("content")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let all_text = items
        .iter()
        .all(|item| item.get("type").and_then(Value::as_str) == Some("text"));

    if all_text {
        Value::String(envelope_text(&value).unwrap_or_default())
    } else {
        Value::Array(items)
    }
}
