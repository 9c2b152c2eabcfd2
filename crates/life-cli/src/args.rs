//! `key=value` token parsing for job payload arguments.
//!
//! Values are coerced the way the payload expects them: booleans, nulls,
//! numbers, and JSON objects/arrays are recognized; everything else stays a
//! string.

use anyhow::bail;
use serde_json::{Map, Value};

pub fn parse_pairs(tokens: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut out = Map::new();
    for token in tokens {
        let Some((key, raw)) = token.split_once('=') else {
            bail!("expected key=value argument, got '{token}'");
        };
        out.insert(key.to_string(), coerce(raw));
    }
    Ok(out)
}

fn coerce(raw: &str) -> Value {
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "none" => return Value::Null,
        _ => {}
    }
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(v) = serde_json::from_str(raw) {
            return v;
        }
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::from(f);
    }
    Value::String(raw.to_string())
}
