//! Pulling JSON results out of free-form model output
//!
//! Local models rarely return bare JSON. They wrap it in Markdown fences,
//! prefix it with prose, or emit a `<think>` block first. Extraction tries, in
//! order: the whole text, the first fenced code block, the span from the
//! first opening bracket to the last matching closing bracket, and finally
//! the span from the first `[` to the last `]`.

use super::AgentError;
use serde_json::Value;

const PREVIEW_CHARS: usize = 200;

/// Parse model output into a list of result values
///
/// A top-level array is returned as is. A single object is treated as a
/// one-element list, unless its only member is an array, in which case that
/// array is returned (some models wrap lists as `{"items": [...]}`).
pub fn extract_items(text: &str) -> Result<Vec<Value>, AgentError> {
    let cleaned = strip_reasoning(text);
    let cleaned = cleaned.trim();

    let value = parse_candidates(cleaned).ok_or_else(|| AgentError::MalformedOutput {
        reason: "no JSON array or object found".to_string(),
        preview: preview(cleaned),
    })?;

    match value {
        Value::Array(items) => Ok(items),
        Value::Object(object) => {
            if object.len() == 1 {
                if let Some(Value::Array(items)) = object.values().next() {
                    return Ok(items.clone());
                }
            }
            Ok(vec![Value::Object(object)])
        }
        other => Err(AgentError::MalformedOutput {
            reason: format!("expected a JSON array or object, got {}", other),
            preview: preview(cleaned),
        }),
    }
}

fn parse_candidates(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    if let Some(fenced) = fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced.trim()) {
            return Some(value);
        }
    }

    if let Some(value) =
        bracketed_span(text).and_then(|span| serde_json::from_str::<Value>(span).ok())
    {
        return Some(value);
    }

    // Prose ahead of the payload may itself contain braces
    array_span(text).and_then(|span| serde_json::from_str::<Value>(span).ok())
}

/// Drop `<think>...</think>` sections emitted by reasoning models
fn strip_reasoning(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Contents of the first ``` fenced block, without the language tag
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// From the first `[` or `{` to the last matching closer
fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let closer = if text[start..].starts_with('[') { ']' } else { '}' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// From the first `[` to the last `]`
fn array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", head)
    } else {
        head
    }
}
