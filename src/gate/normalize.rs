//! Argument normalization applied before every tool call.

use serde_json::{Map, Value};

/// Lower-case every string leaf, recursing through objects and arrays.
/// Keys, numbers, booleans and nulls are left untouched.
pub fn lowercase_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.chars().any(char::is_uppercase) {
                *s = s.to_lowercase();
            }
        }
        Value::Array(items) => items.iter_mut().for_each(lowercase_value),
        Value::Object(map) => lowercase_args(map),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Lower-case all string values of a tool argument mapping in place.
pub fn lowercase_args(args: &mut Map<String, Value>) {
    args.values_mut().for_each(lowercase_value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_nested_strings_are_lowercased() {
        let mut args = as_map(json!({
            "Customer_ID": "ABC-123",
            "items_to_add": [
                {"product_id": "Soil-456", "quantity": 2},
                {"product_id": "FERT-789", "quantity": 1}
            ],
            "tags": ["Sun", "Shade"],
            "details": {"note": "Planting PETUNIAS", "rush": true, "extra": null}
        }));

        lowercase_args(&mut args);

        assert_eq!(
            Value::Object(args),
            json!({
                "Customer_ID": "abc-123",
                "items_to_add": [
                    {"product_id": "soil-456", "quantity": 2},
                    {"product_id": "fert-789", "quantity": 1}
                ],
                "tags": ["sun", "shade"],
                "details": {"note": "planting petunias", "rush": true, "extra": null}
            })
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let original = json!({
            "student_id": "77",
            "texto": "Olhe essa FIGURA aqui",
            "nested": [[["ÁRVORE"]], {"k": "Questão"}],
            "value": 12.5
        });

        let mut once = as_map(original);
        lowercase_args(&mut once);
        let mut twice = once.clone();
        lowercase_args(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(once["texto"], "olhe essa figura aqui");
        assert_eq!(once["nested"], json!([[["árvore"]], {"k": "questão"}]));
    }

    #[test]
    fn test_non_string_leaves_are_preserved() {
        let mut value = json!([1, 2.5, false, null, {"n": -3}]);
        let expected = value.clone();
        lowercase_value(&mut value);
        assert_eq!(value, expected);
    }
}
