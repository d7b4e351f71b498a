use crate::models::FlatRow;
use serde_json::{Value, json};
use tracing::warn;

/// Column name of the structured-data object split out of the generated
/// sheet and re-serialized as a single string.
pub const MARKER_KEY: &str = "JSON-LD_Marker";

/// Flatten a raw model response into a tabular row. Pops `JSON-LD_Marker`
/// (defaulting to `{}` when absent), then folds the remaining keys into
/// dotted column names; arrays stay as one serialized value. Malformed
/// JSON is logged and yields an empty row; this function never fails.
pub fn flatten_response(raw: &str) -> FlatRow {
    let cleaned = strip_markdown_fence(raw);
    let mut value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(err) => {
            warn!(target = "seosheet.flatten", error = %err, "json_decode_failed");
            return FlatRow::empty();
        }
    };

    let marker = value
        .as_object_mut()
        .and_then(|obj| obj.remove(MARKER_KEY))
        .unwrap_or_else(|| json!({}));

    let mut columns = Vec::new();
    if let Some(obj) = value.as_object() {
        for (key, nested) in obj {
            flatten_into(key, nested, &mut columns);
        }
    }

    FlatRow {
        columns,
        marker: marker.to_string(),
    }
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{prefix}.{key}"), nested, out);
            }
        }
        other => out.push((prefix.to_string(), scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Models routinely wrap JSON output in a markdown code fence even in
/// JSON-object mode; strip it before parsing.
pub fn strip_markdown_fence(input: &str) -> String {
    let trimmed = input.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut body = Vec::new();
    for line in trimmed.lines().skip(1) {
        if line.trim_start().starts_with("```") {
            break;
        }
        body.push(line);
    }
    body.join("\n")
}
