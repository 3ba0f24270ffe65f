use serde_json::Value;

use super::Validator;
use crate::outcome::{Failure, FailureKind, PathSegment};
use crate::schema::{ArrayNode, Items};
use crate::value::json_eq;

impl Validator<'_> {
    pub(super) fn check_array(&self, node: &ArrayNode, xs: &[Value], depth: usize) -> Result<(), Failure> {
        match &node.items {
            Items::Any => {}
            Items::Uniform(child) => {
                for (index, x) in xs.iter().enumerate() {
                    self.check(*child, x, depth + 1)
                        .map_err(|f| f.within(["items"]).inside(index))?;
                }
            }
            Items::Tuple(children) => {
                for (index, (child, x)) in children.iter().zip(xs).enumerate() {
                    self.check(*child, x, depth + 1)
                        .map_err(|f| f.within([PathSegment::from("items"), PathSegment::from(index)]).inside(index))?;
                }
                if let Some(extra) = node.additional_items {
                    for (index, x) in xs.iter().enumerate().skip(children.len()) {
                        self.check(extra, x, depth + 1).map_err(|f| {
                            f.within([PathSegment::from("additionalItems"), PathSegment::from(index)])
                                .inside(index)
                        })?;
                    }
                }
            }
        }

        let len = xs.len() as u64;
        if let Some(max) = node.max_items.filter(|&max| len > max) {
            return Err(Failure::at(
                FailureKind::RangeViolation,
                format!("array has {len} items, more than maxItems {max}"),
                ["maxItems"],
            ));
        }
        if let Some(min) = node.min_items.filter(|&min| len < min) {
            return Err(Failure::at(
                FailureKind::RangeViolation,
                format!("array has {len} items, fewer than minItems {min}"),
                ["minItems"],
            ));
        }

        if node.unique_items {
            // report the later element of the first duplicate pair
            for index in 1..xs.len() {
                if let Some(first) = xs[..index].iter().position(|y| json_eq(y, &xs[index])) {
                    return Err(Failure::at(
                        FailureKind::UniquenessViolation,
                        format!("item {index} duplicates item {first}"),
                        ["uniqueItems"],
                    )
                    .with_document(index));
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

    #[test]
    fn unique_items_reports_the_duplicate_index() {
        let schema = compile(&json!({"type": "array", "uniqueItems": true})).unwrap();
        let result = schema.validate(&json!([1, 2, 1]));
        assert_eq!(result.kind, Some(FailureKind::UniquenessViolation));
        assert_eq!(result.schema_path, vec![PathSegment::from("uniqueItems")]);
        assert_eq!(result.document_path, vec![PathSegment::from(2)]);
        assert!(schema.is_valid(&json!([1, true, "1", [1], {"a": 1}])));
        assert!(!schema.is_valid(&json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}])));
        assert!(!schema.is_valid(&json!([1, 1.0])));
    }

    #[test]
    fn uniform_items_prefix_the_index() {
        let schema = compile(&json!({"items": {"type": "integer"}})).unwrap();
        assert!(schema.is_valid(&json!([])));
        let result = schema.validate(&json!([1, 2, "x"]));
        assert_eq!(result.schema_path, vec![PathSegment::from("items"), PathSegment::from("type")]);
        assert_eq!(result.document_path, vec![PathSegment::from(2)]);
    }

    #[test]
    fn tuple_items_and_additional_items() {
        let schema = compile(&json!({
            "items": [{"type": "string"}, {"type": "integer"}],
            "additionalItems": {"type": "null"}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(["a"])));
        assert!(schema.is_valid(&json!(["a", 1, null, null])));

        let positional = schema.validate(&json!(["a", "b"]));
        assert_eq!(
            positional.schema_path,
            vec![PathSegment::from("items"), PathSegment::from(1), PathSegment::from("type")]
        );
        assert_eq!(positional.document_path, vec![PathSegment::from(1)]);

        let extra = schema.validate(&json!(["a", 1, null, 4]));
        assert_eq!(
            extra.schema_path,
            vec![PathSegment::from("additionalItems"), PathSegment::from(3), PathSegment::from("type")]
        );
        assert_eq!(extra.document_path, vec![PathSegment::from(3)]);
    }

    #[test]
    fn tuple_without_additional_items_accepts_extras() {
        let schema = compile(&json!({"items": [{"type": "string"}]})).unwrap();
        assert!(schema.is_valid(&json!(["a", 1, {}])));
    }

    #[test]
    fn item_count_bounds() {
        let schema = compile(&json!({"minItems": 1, "maxItems": 2})).unwrap();
        assert_eq!(schema.validate(&json!([])).schema_path, vec![PathSegment::from("minItems")]);
        assert_eq!(schema.validate(&json!([1, 2, 3])).schema_path, vec![PathSegment::from("maxItems")]);
        assert!(schema.is_valid(&json!([1, 2])));
    }
}
