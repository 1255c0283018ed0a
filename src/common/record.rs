//! Record identity shared by pipes and local stores

use serde_json::Value;

/// Identifier held in `field` of a serialized record.
///
/// Only non-empty strings and numbers count; anything else means the record has
/// not been assigned an id yet.
pub fn record_id(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strings_and_numbers_are_ids() {
        assert_eq!(record_id(&json!({"id": "7"}), "id").as_deref(), Some("7"));
        assert_eq!(record_id(&json!({"id": 7}), "id").as_deref(), Some("7"));
        assert_eq!(
            record_id(&json!({"taskId": "a1"}), "taskId").as_deref(),
            Some("a1")
        );
    }

    #[test]
    fn test_other_values_are_not_ids() {
        for value in [
            json!({"id": null}),
            json!({"id": ""}),
            json!({"id": false}),
            json!({"id": true}),
            json!({"id": {"nested": 1}}),
            json!({"id": [1]}),
            json!({"name": "x"}),
            json!("not an object"),
        ] {
            assert_eq!(record_id(&value, "id"), None, "{}", value);
        }
    }
}
