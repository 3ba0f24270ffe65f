use ordered_float::OrderedFloat;
use serde_json::{Number, Value};

/// Structural equality used by `enum` and `uniqueItems`.
///
/// Numbers compare by value (`1 == 1.0`); booleans never equal numbers;
/// objects compare key-wise regardless of key order.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm.iter().all(|(k, x)| ym.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => false,
    }
}

fn number_eq(x: &Number, y: &Number) -> bool {
    // exact paths first so large integers don't lose precision through f64
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => OrderedFloat(a) == OrderedFloat(b),
        _ => false,
    }
}

/// Runtime kind of an instance, for diagnostics.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compact rendering for messages; long documents are cut.
pub fn preview(value: &Value) -> String {
    const MAX_PREVIEW: usize = 80;
    let text = value.to_string();
    if text.chars().count() <= MAX_PREVIEW {
        return text;
    }
    let cut: String = text.chars().take(MAX_PREVIEW).collect();
    format!("{cut}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_by_value() {
        assert!(json_eq(&json!(1), &json!(1.0)));
        assert!(!json_eq(&json!(1), &json!(2)));
        assert!(!json_eq(&json!(1), &json!(true)));
        assert!(!json_eq(&json!(0), &json!(false)));
    }

    #[test]
    fn objects_ignore_key_order() {
        assert!(json_eq(&json!({"a": 1, "b": [1, 2]}), &json!({"b": [1.0, 2], "a": 1})));
        assert!(!json_eq(&json!({"a": 1}), &json!({"a": 1, "b": null})));
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let long = Value::String("é".repeat(200));
        assert!(preview(&long).ends_with('…'));
    }
}
