//! Scalar assertions. Only reached under `Assertions::Full`; under the default
//! structural mode the compiled scalar nodes carry no bounds at all.
use serde_json::Number;

use crate::outcome::{Failure, FailureKind};
use crate::schema::{NumericNode, StringNode};

pub(super) fn check_string(node: &StringNode, s: &str) -> Result<(), Failure> {
    let len = s.chars().count() as u64;
    if let Some(min) = node.min_length.filter(|&min| len < min) {
        return Err(Failure::at(
            FailureKind::RangeViolation,
            format!("string has {len} characters, fewer than minLength {min}"),
            ["minLength"],
        ));
    }
    if let Some(max) = node.max_length.filter(|&max| len > max) {
        return Err(Failure::at(
            FailureKind::RangeViolation,
            format!("string has {len} characters, more than maxLength {max}"),
            ["maxLength"],
        ));
    }
    if let Some(pattern) = node.pattern.as_ref().filter(|p| !p.is_match(s)) {
        return Err(Failure::at(
            FailureKind::PatternMismatch,
            format!("{s:?} does not match /{}/", pattern.source),
            ["pattern"],
        ));
    }
    Ok(())
}

pub(super) fn check_number(node: &NumericNode, n: &Number) -> Result<(), Failure> {
    let Some(x) = n.as_f64() else { return Ok(()) };
    let out_of_range = |keyword: &'static str, relation: &str, bound: f64| {
        Err(Failure::at(
            FailureKind::RangeViolation,
            format!("{n} is {relation} {keyword} {bound}"),
            [keyword],
        ))
    };
    if let Some(min) = node.minimum.filter(|&min| x < min) {
        return out_of_range("minimum", "less than", min);
    }
    if let Some(min) = node.exclusive_minimum.filter(|&min| x <= min) {
        return out_of_range("exclusiveMinimum", "not greater than", min);
    }
    if let Some(max) = node.maximum.filter(|&max| x > max) {
        return out_of_range("maximum", "greater than", max);
    }
    if let Some(max) = node.exclusive_maximum.filter(|&max| x >= max) {
        return out_of_range("exclusiveMaximum", "not less than", max);
    }
    if let Some(step) = node.multiple_of.filter(|&step| !is_multiple(n, x, step)) {
        return out_of_range("multipleOf", "not a multiple of", step);
    }
    Ok(())
}

fn is_multiple(n: &Number, x: f64, step: f64) -> bool {
    if step.fract() == 0.0 {
        if let (Some(i), true) = (n.as_i64(), step <= i64::MAX as f64) {
            return i % (step as i64) == 0;
        }
    }
    let quotient = x / step;
    quotient.is_finite() && (quotient - quotient.round()).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use crate::compile::Compiler;
    use crate::config::{Assertions, CompileOptions};
    use crate::outcome::{FailureKind, PathSegment};
    use serde_json::{json, Value};

    fn full(schema: Value) -> crate::compile::CompiledSchema {
        Compiler::new(CompileOptions::default().assertions(Assertions::Full)).compile(&schema).unwrap()
    }

    #[test]
    fn structural_mode_ignores_scalar_bounds() {
        let schema = crate::compile::compile(&json!({"type": "string", "maxLength": 1, "pattern": "^a"})).unwrap();
        assert!(schema.is_valid(&json!("bbbb")));
    }

    #[test]
    fn string_bounds_and_pattern() {
        let schema = full(json!({"type": "string", "minLength": 2, "maxLength": 3, "pattern": "^a"}));
        assert!(schema.is_valid(&json!("ab")));
        assert!(schema.is_valid(&json!("aé")));
        assert_eq!(schema.validate(&json!("a")).schema_path, vec![PathSegment::from("minLength")]);
        assert_eq!(schema.validate(&json!("abcd")).schema_path, vec![PathSegment::from("maxLength")]);
        let result = schema.validate(&json!("bb"));
        assert_eq!(result.kind, Some(FailureKind::PatternMismatch));
        assert_eq!(result.schema_path, vec![PathSegment::from("pattern")]);
    }

    #[test]
    fn numeric_bounds() {
        let schema = full(json!({"type": "integer", "minimum": 1, "maximum": 10, "multipleOf": 3}));
        assert!(schema.is_valid(&json!(3)));
        assert!(schema.is_valid(&json!(9)));
        assert_eq!(schema.validate(&json!(0)).schema_path, vec![PathSegment::from("minimum")]);
        assert_eq!(schema.validate(&json!(12)).schema_path, vec![PathSegment::from("maximum")]);
        assert_eq!(schema.validate(&json!(4)).schema_path, vec![PathSegment::from("multipleOf")]);
    }

    #[test]
    fn draft4_exclusive_bounds() {
        let schema = full(json!({"type": "number", "minimum": 1.0, "exclusiveMinimum": true}));
        assert!(schema.is_valid(&json!(1.5)));
        let result = schema.validate(&json!(1.0));
        assert_eq!(result.kind, Some(FailureKind::RangeViolation));
        assert_eq!(result.schema_path, vec![PathSegment::from("exclusiveMinimum")]);
    }

    #[test]
    fn fractional_multiple_of() {
        let schema = full(json!({"type": "number", "multipleOf": 0.01}));
        assert!(schema.is_valid(&json!(0.07)));
        assert!(!schema.is_valid(&json!(0.075)));
    }
}
