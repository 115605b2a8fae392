//! JSON field extraction shared by the per-source normalizers.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

/// Non-blank trimmed string at `key`.
pub(crate) fn str_at<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Array at `key`, or an empty slice when absent / not an array / null.
pub(crate) fn array_at<'a>(v: &'a Value, key: &str) -> &'a [Value] {
    v.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Merge tool lists in the order given. Entries may be bare strings or
/// objects carrying a `name`. Duplicates (exact match) keep their first
/// position.
pub(crate) fn merge_tool_names<'a>(lists: impl IntoIterator<Item = &'a [Value]>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for list in lists {
        for entry in list {
            let name = match entry {
                Value::String(s) => Some(s.trim()),
                Value::Object(_) => str_at(entry, "name"),
                _ => None,
            };
            if let Some(n) = name.filter(|n| !n.is_empty()) {
                if seen.insert(n.to_string()) {
                    out.push(n.to_string());
                }
            }
        }
    }
    out
}

/// Explicit schema: only a JSON object counts.
pub(crate) fn explicit_schema(v: Option<&Value>) -> Option<Value> {
    v.filter(|s| s.is_object()).cloned()
}

/// Build an object schema from environment-variable declarations.
///
/// Each declaration `{name, description?, isSecret?, isRequired?}` becomes a
/// string property; `isSecret` is carried as the property's `secret` flag.
/// Returns `None` when no declaration has a usable name.
pub(crate) fn synthesize_config_schema<'a>(
    env_vars: impl IntoIterator<Item = &'a Value>,
) -> Option<Value> {
    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for var in env_vars {
        let Some(name) = str_at(var, "name") else {
            continue;
        };
        if properties.contains_key(name) {
            continue;
        }

        let mut prop = Map::new();
        prop.insert("type".to_string(), json!("string"));
        if let Some(desc) = str_at(var, "description") {
            prop.insert("description".to_string(), json!(desc));
        }
        if var.get("isSecret").and_then(Value::as_bool).unwrap_or(false) {
            prop.insert("secret".to_string(), json!(true));
        }
        if var.get("isRequired").and_then(Value::as_bool).unwrap_or(false) {
            required.push(json!(name));
        }
        properties.insert(name.to_string(), Value::Object(prop));
    }

    if properties.is_empty() {
        return None;
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Some(Value::Object(schema))
}
