use serde_json::{Map, Value};

use super::{count, ScopeId, Session};
use crate::error::CompileError;
use crate::schema::{ArrayNode, Items};

impl Session<'_> {
    pub(super) fn compile_array(&mut self, map: &Map<String, Value>, scope: ScopeId) -> Result<ArrayNode, CompileError> {
        let mut out = ArrayNode::default();

        out.items = match map.get("items") {
            None => Items::Any,
            // tuple typing: one node per position
            Some(Value::Array(xs)) => Items::Tuple(
                xs.iter()
                    .map(|x| self.compile_child(x, scope))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(single) => Items::Uniform(self.compile_child(single, scope)?),
        };
        if let Some(raw) = map.get("additionalItems") {
            out.additional_items = Some(self.compile_child(raw, scope)?);
        }
        out.max_items = count(map, "maxItems")?;
        out.min_items = count(map, "minItems")?;
        out.unique_items = match map.get("uniqueItems") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(CompileError::invalid_keyword("uniqueItems", "must be a boolean")),
        };

        Ok(out)
    }
}
