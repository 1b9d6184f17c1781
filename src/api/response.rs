//! Response body handling: lenient JSON parsing and envelope unwrapping

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// Offsets where an embedded object or array may start
#[allow(clippy::expect_used)] // Literal pattern, checked by tests
static JSON_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\{\[]").expect("valid start pattern"));

/// Parse a response body read as text.
///
/// Empty bodies parse to `null`. When the body is not valid JSON, the first
/// object or array embedded in it is used instead: some backend endpoints emit
/// PHP warnings or HTML around the payload. Returns None when nothing parses.
pub fn parse_body(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let extracted = extract_embedded_json(trimmed);
    if extracted.is_some() {
        tracing::warn!(
            body_len = text.len(),
            "Response body contained stray text around JSON, extracted embedded payload"
        );
    }
    extracted
}

/// Find the first JSON object or array embedded in surrounding text.
///
/// Each `{` / `[` is tried in order; the value is read up to its own closing
/// bracket so braces in the text before or after it do not matter.
pub fn extract_embedded_json(text: &str) -> Option<Value> {
    JSON_START.find_iter(text).find_map(|m| {
        serde_json::Deserializer::from_str(&text[m.start()..])
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

/// `{ "data": X }` -> `X`. Anything else, including `{ "data": null }`, is returned unchanged.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(inner) if !inner.is_null() => inner,
            Some(inner) => {
                map.insert("data".to_string(), inner);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Top-level `message` string of a response, used for success toasts
pub fn response_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
}
