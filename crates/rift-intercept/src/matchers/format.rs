//! Rendering of compared values inside mismatch reasons.

use serde_json::{Map, Value};

/// Compact JSON with object keys sorted, so reasons are stable.
pub(crate) fn render(value: &Value) -> String {
    sorted(value).to_string()
}

pub(crate) fn render_pairs(pairs: &[(String, String)]) -> String {
    let object: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    render(&Value::Object(object))
}

/// Escaped byte string, e.g. `b"--x\r\n"`.
pub(crate) fn render_bytes(bytes: &[u8]) -> String {
    format!("b\"{}\"", bytes.escape_ascii())
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
