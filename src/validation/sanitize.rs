use serde_json::{Map, Value};

/// Keep only allow-listed top-level keys. Dropped keys are reported back so the
/// caller can log them; they are never persisted.
pub fn pick_allowed(body: &Map<String, Value>, allowed: &[&str]) -> (Map<String, Value>, Vec<String>) {
    let mut picked = Map::new();
    let mut dropped = Vec::new();

    for (key, value) in body {
        if allowed.contains(&key.as_str()) {
            picked.insert(key.clone(), sanitize_value(value.clone()));
        } else {
            dropped.push(key.clone());
        }
    }

    (picked, dropped)
}

/// Recursively trims strings, strips control characters and removes
/// operator-looking keys (`$where`, `a.b`) from nested objects.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| is_safe_key(key))
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Strips ASCII control characters (keeping newlines and tabs), then trims
pub fn sanitize_string(s: &str) -> String {
    let stripped: String = s
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == '\n' || *c == '\t')
        .collect();
    stripped.trim().to_string()
}

fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('$') && !key.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_fields_outside_allow_list() {
        let body = json!({ "name": "Acme", "firmId": "x", "_id": "y", "role": "owner" });
        let (picked, mut dropped) = pick_allowed(body.as_object().unwrap(), &["name"]);
        dropped.sort();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked["name"], json!("Acme"));
        assert_eq!(dropped, vec!["_id", "firmId", "role"]);
    }

    #[test]
    fn strips_operator_keys_from_nested_objects() {
        let cleaned = sanitize_value(json!({
            "settings": { "$where": "1 == 1", "calendar.id": "x", "syncDays": 30 },
            "tags": ["  a ", { "$ne": null }]
        }));
        assert_eq!(cleaned, json!({ "settings": { "syncDays": 30 }, "tags": ["a", {}] }));
    }

    #[test]
    fn strips_control_characters_but_keeps_newlines() {
        assert_eq!(sanitize_string("  line\u{0000}one\nline\u{0007}two  "), "lineone\nlinetwo");
    }

    #[test]
    fn trims_whitespace_left_behind_by_control_characters() {
        assert_eq!(sanitize_string("abc \u{7}"), "abc");
        assert_eq!(sanitize_string("\u{1b} abc"), "abc");
        // C1 controls are not ASCII and pass through
        assert_eq!(sanitize_string("a\u{85}b"), "a\u{85}b");
    }
}
