//! Field-level diffs between entity snapshots
//!
//! Used for the `diff_summary` of update entries. Nested objects are walked
//! with dotted paths; `updated_at` is skipped since every write touches it.

use serde_json::{Map, Value};

/// Keys left out of diffs
const IGNORED_KEYS: &[&str] = &["updated_at"];

const MAX_STRING_CHARS: usize = 40;

/// Summarise the changes between two JSON snapshots, or None if nothing
/// meaningful changed
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes(before, after, "", &mut changes);

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(before: &Value, after: &Value, path: &str, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => diff_objects(b, a, path, changes),
        _ if before != after => changes.push(format!(
            "{}: {} -> {}",
            display_path(path),
            format_value(before),
            format_value(after)
        )),
        _ => {}
    }
}

fn diff_objects(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    path: &str,
    changes: &mut Vec<String>,
) {
    for (key, before_val) in before {
        if IGNORED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let field = join(path, key);
        match after.get(key) {
            Some(after_val) => collect_changes(before_val, after_val, &field, changes),
            None => changes.push(format!("{}: {} -> (removed)", field, format_value(before_val))),
        }
    }

    for (key, after_val) in after {
        if IGNORED_KEYS.contains(&key.as_str()) || before.contains_key(key) {
            continue;
        }
        changes.push(format!(
            "{}: (added) -> {}",
            join(path, key),
            format_value(after_val)
        ));
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "value"
    } else {
        path
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_STRING_CHARS => {
            let head: String = s.chars().take(MAX_STRING_CHARS - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_balance_change() {
        let before = json!({"name": "Car", "current_amount": 20000});
        let after = json!({"name": "Car", "current_amount": 45000});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "current_amount: 20000 -> 45000");
    }

    #[test]
    fn test_updated_at_ignored() {
        let before = json!({"archived": false, "updated_at": "2024-01-01T00:00:00Z"});
        let after = json!({"archived": false, "updated_at": "2024-02-01T00:00:00Z"});
        assert!(generate_diff(&before, &after).is_none());
    }

    #[test]
    fn test_nested_paths() {
        let before = json!({"frequency": {"type": "custom", "value": {"days": 7}}});
        let after = json!({"frequency": {"type": "custom", "value": {"days": 14}}});

        let diff = generate_diff(&before, &after).unwrap();
        assert_eq!(diff, "frequency.value.days: 7 -> 14");
    }

    #[test]
    fn test_added_and_removed() {
        let before = json!({"note": "first"});
        let after = json!({"completed_at": "2024-05-01T00:00:00Z"});

        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("note: \"first\" -> (removed)"));
        assert!(diff.contains("completed_at: (added)"));
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(generate_diff(&json!(1), &json!(2)).unwrap(), "value: 1 -> 2");
        assert!(generate_diff(&json!("a"), &json!("a")).is_none());
    }

    #[test]
    fn test_long_multibyte_string_truncated() {
        let before = json!({"note": "é".repeat(60)});
        let after = json!({"note": "short"});
        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("...\""));
    }
}
