use serde_json::{Map, Value};

use super::Validator;
use crate::outcome::{Failure, FailureKind};
use crate::schema::{AdditionalProperties, ObjectNode};

impl Validator<'_> {
    pub(super) fn check_object(
        &self,
        node: &ObjectNode,
        instance: &Value,
        map: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), Failure> {
        // schema dependencies apply to the whole object, in document key order
        for key in map.keys() {
            if let Some(&dependency) = node.schema_dependencies.get(key) {
                self.check(dependency, instance, depth + 1)
                    .map_err(|f| f.within(["dependencies", key.as_str()]))?;
            }
        }

        match node.additional_properties {
            AdditionalProperties::Allowed => {}
            AdditionalProperties::Disallowed => {
                if let Some(key) = map.keys().find(|key| !node.declares(key)) {
                    return Err(Failure::at(
                        FailureKind::AdditionalPropertyDisallowed,
                        format!("additional property `{key}` is not allowed"),
                        ["additionalProperties"],
                    )
                    .with_document(key.as_str()));
                }
            }
            AdditionalProperties::Schema(extra) => {
                for (key, value) in map.iter().filter(|(key, _)| !node.declares(key)) {
                    self.check(extra, value, depth + 1)
                        .map_err(|f| f.within(["additionalProperties"]).inside(key.as_str()))?;
                }
            }
        }

        for (key, &child) in &node.required {
            let Some(value) = map.get(key) else {
                return Err(Failure::at(
                    FailureKind::RequiredMissing,
                    format!("required property `{key}` is missing"),
                    ["required", key.as_str()],
                ));
            };
            self.check(child, value, depth + 1)
                .map_err(|f| f.within(["properties", key.as_str()]).inside(key.as_str()))?;
        }

        for (key, &child) in &node.properties {
            if let Some(value) = map.get(key) {
                self.check(child, value, depth + 1)
                    .map_err(|f| f.within(["properties", key.as_str()]).inside(key.as_str()))?;
            }
        }

        let len = map.len() as u64;
        if let Some(min) = node.min_properties.filter(|&min| len < min) {
            return Err(Failure::at(
                FailureKind::RangeViolation,
                format!("object has {len} properties, fewer than minProperties {min}"),
                ["minProperties"],
            ));
        }
        if let Some(max) = node.max_properties.filter(|&max| len > max) {
            return Err(Failure::at(
                FailureKind::RangeViolation,
                format!("object has {len} properties, more than maxProperties {max}"),
                ["maxProperties"],
            ));
        }

        for (key, names) in &node.property_dependencies {
            if !map.contains_key(key) {
                continue;
            }
            if let Some(missing) = names.iter().find(|name| !map.contains_key(name.as_str())) {
                return Err(Failure::at(
                    FailureKind::DependencyViolation,
                    format!("property `{key}` requires property `{missing}`"),
                    ["dependencies", key.as_str()],
                ));
            }
        }

        for (key, value) in map {
            for (pattern, child) in &node.pattern_properties {
                if pattern.is_match(key) {
                    self.check(*child, value, depth + 1).map_err(|f| {
                        f.within(["patternProperties", pattern.source.as_str()]).inside(key.as_str())
                    })?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::compile::compile;
    use crate::outcome::{FailureKind, PathSegment};
    use serde_json::json;

    fn keys(segments: &[&str]) -> Vec<PathSegment> { segments.iter().map(|s| PathSegment::from(*s)).collect() }

    #[test]
    fn nested_failure_reports_both_paths() {
        let schema = compile(&json!({"type": "object", "properties": {"a": {"type": "integer"}}})).unwrap();
        let result = schema.validate(&json!({"a": "x"}));
        assert!(!result.valid);
        assert_eq!(result.kind, Some(FailureKind::TypeMismatch));
        assert_eq!(result.schema_path, keys(&["properties", "a", "type"]));
        assert_eq!(result.document_path, keys(&["a"]));
    }

    #[test]
    fn required_missing_and_required_invalid() {
        let schema = compile(&json!({"required": ["a"], "properties": {"a": {"type": "string"}}})).unwrap();
        let missing = schema.validate(&json!({}));
        assert_eq!(missing.kind, Some(FailureKind::RequiredMissing));
        assert_eq!(missing.schema_path, keys(&["required", "a"]));
        assert!(missing.document_path.is_empty());

        let invalid = schema.validate(&json!({"a": 5}));
        assert_eq!(invalid.kind, Some(FailureKind::TypeMismatch));
        assert_eq!(invalid.schema_path, keys(&["properties", "a", "type"]));
        assert_eq!(invalid.document_path, keys(&["a"]));
    }

    #[test]
    fn required_without_property_schema() {
        let schema = compile(&json!({"type": "object", "required": ["id"]})).unwrap();
        assert!(schema.is_valid(&json!({"id": [1, {"x": null}]})));
        assert!(!schema.is_valid(&json!({"other": 1})));
    }

    #[test]
    fn additional_properties_false_names_the_key() {
        let schema = compile(&json!({"properties": {"a": {}}, "additionalProperties": false})).unwrap();
        assert!(schema.is_valid(&json!({"a": 1})));
        let result = schema.validate(&json!({"a": 1, "b": 2}));
        assert_eq!(result.kind, Some(FailureKind::AdditionalPropertyDisallowed));
        assert_eq!(result.schema_path, keys(&["additionalProperties"]));
        assert_eq!(result.document_path, keys(&["b"]));
        assert!(result.message.contains("`b`"));
    }

    #[test]
    fn additional_properties_respect_patterns_and_required() {
        let schema = compile(&json!({
            "required": ["id"],
            "patternProperties": {"^x-": {"type": "string"}},
            "additionalProperties": {"type": "integer"}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"id": "anything", "x-tag": "t", "count": 3})));
        let extra = schema.validate(&json!({"id": 1, "count": "three"}));
        assert_eq!(extra.schema_path, keys(&["additionalProperties", "type"]));
        assert_eq!(extra.document_path, keys(&["count"]));
        let patterned = schema.validate(&json!({"id": 1, "x-tag": 4}));
        assert_eq!(patterned.schema_path, keys(&["patternProperties", "^x-", "type"]));
        assert_eq!(patterned.document_path, keys(&["x-tag"]));
    }

    #[test]
    fn property_count_bounds() {
        let schema = compile(&json!({"minProperties": 1, "maxProperties": 2})).unwrap();
        assert_eq!(schema.validate(&json!({})).schema_path, keys(&["minProperties"]));
        assert!(schema.is_valid(&json!({"a": 1})));
        let result = schema.validate(&json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(result.kind, Some(FailureKind::RangeViolation));
        assert_eq!(result.schema_path, keys(&["maxProperties"]));
    }

    #[test]
    fn dependencies_of_both_forms() {
        let schema = compile(&json!({
            "dependencies": {
                "card": ["billing"],
                "bar": {"properties": {"foo": {"type": "integer"}}}
            }
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"card": 1, "billing": 2})));
        assert!(schema.is_valid(&json!({"billing": 2})));
        let property = schema.validate(&json!({"card": 1}));
        assert_eq!(property.kind, Some(FailureKind::DependencyViolation));
        assert_eq!(property.schema_path, keys(&["dependencies", "card"]));

        assert!(schema.is_valid(&json!({"foo": "s"})));
        let nested = schema.validate(&json!({"bar": 1, "foo": "s"}));
        assert_eq!(nested.schema_path, keys(&["dependencies", "bar", "properties", "foo", "type"]));
        assert_eq!(nested.document_path, keys(&["foo"]));
    }

    #[test]
    fn non_objects_fail_object_schemas() {
        let schema = compile(&json!({"properties": {"a": {}}})).unwrap();
        let result = schema.validate(&json!([1]));
        assert_eq!(result.kind, Some(FailureKind::TypeMismatch));
    }
}
