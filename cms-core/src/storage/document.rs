//! Helpers for the JSON objects that back every record.

use serde_json::Value;

pub(crate) fn strip_id(mut data: Value) -> Value {
    if let Some(obj) = data.as_object_mut() {
        obj.remove("id");
    }
    data
}

pub(crate) fn with_id(mut data: Value, id: i64) -> Value {
    if let Some(obj) = data.as_object_mut() {
        obj.insert("id".to_string(), Value::from(id));
    }
    data
}

pub(crate) fn flag_is_set(data: &Value, flag: &str) -> bool {
    data.get(flag).and_then(Value::as_bool).unwrap_or(false)
}

/// Whether `other` falls in the same scope as `saved`. No scope means one
/// scope for the whole kind.
pub(crate) fn scope_matches(saved: &Value, other: &Value, scope: Option<&str>) -> bool {
    match scope {
        None => true,
        Some(field) => saved.get(field) == other.get(field),
    }
}

/// Scope value as SQLite's `CAST(json_extract(..) AS TEXT)` would render it.
#[cfg_attr(not(feature = "db"), allow(dead_code))]
pub(crate) fn scope_text(data: &Value, field: &str) -> Option<String> {
    match data.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_text_matches_sqlite_rendering() {
        let data = json!({"section_id": "otherRights", "page": 3, "flag": true, "none": null});
        assert_eq!(scope_text(&data, "section_id").as_deref(), Some("otherRights"));
        assert_eq!(scope_text(&data, "page").as_deref(), Some("3"));
        assert_eq!(scope_text(&data, "flag").as_deref(), Some("1"));
        assert_eq!(scope_text(&data, "none"), None);
        assert_eq!(scope_text(&data, "missing"), None);
    }

    #[test]
    fn unscoped_rules_match_everything() {
        assert!(scope_matches(&json!({"a": 1}), &json!({"a": 2}), None));
        assert!(!scope_matches(&json!({"a": 1}), &json!({"a": 2}), Some("a")));
    }
}
