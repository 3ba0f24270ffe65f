use serde_json::{Map, Value};

use super::{count, ScopeId, Session};
use crate::error::CompileError;
use crate::schema::{AdditionalProperties, ObjectNode, Pattern};

impl Session<'_> {
    pub(super) fn compile_object(&mut self, map: &Map<String, Value>, scope: ScopeId) -> Result<ObjectNode, CompileError> {
        let mut out = ObjectNode::default();

        out.additional_properties = match map.get("additionalProperties") {
            None | Some(Value::Bool(true)) => AdditionalProperties::Allowed,
            Some(Value::Bool(false)) => AdditionalProperties::Disallowed,
            Some(raw @ Value::Object(_)) => AdditionalProperties::Schema(self.compile_child(raw, scope)?),
            Some(_) => {
                return Err(CompileError::invalid_keyword("additionalProperties", "must be a boolean or a schema"));
            }
        };
        out.min_properties = count(map, "minProperties")?;
        out.max_properties = count(map, "maxProperties")?;

        let required = required_names(map)?;
        if let Some(raw) = map.get("properties") {
            let props = raw
                .as_object()
                .ok_or_else(|| CompileError::invalid_keyword("properties", "must be an object"))?;
            for (key, sub) in props {
                let node = self.compile_child(sub, scope)?;
                // required keys live in `required` only
                if required.contains(&key.as_str()) {
                    out.required.insert(key.clone(), node);
                } else {
                    out.properties.insert(key.clone(), node);
                }
            }
        }
        for name in required {
            if !out.required.contains_key(name) {
                let always = self.reserve();
                out.required.insert(name.to_string(), always);
            }
        }

        if let Some(raw) = map.get("dependencies") {
            let deps = raw
                .as_object()
                .ok_or_else(|| CompileError::invalid_keyword("dependencies", "must be an object"))?;
            for (key, dep) in deps {
                match dep {
                    Value::Object(_) | Value::Bool(_) => {
                        let node = self.compile_child(dep, scope)?;
                        out.schema_dependencies.insert(key.clone(), node);
                    }
                    Value::String(single) => {
                        out.property_dependencies.insert(key.clone(), vec![single.clone()]);
                    }
                    Value::Array(names) => {
                        let names = names
                            .iter()
                            .map(|n| n.as_str().map(str::to_string))
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(|| {
                                CompileError::invalid_keyword("dependencies", format!("`{key}` must list property names"))
                            })?;
                        out.property_dependencies.insert(key.clone(), names);
                    }
                    _ => {
                        return Err(CompileError::invalid_keyword(
                            "dependencies",
                            format!("`{key}` must be a schema or a list of property names"),
                        ));
                    }
                }
            }
        }

        if let Some(raw) = map.get("patternProperties") {
            let patterns = raw
                .as_object()
                .ok_or_else(|| CompileError::invalid_keyword("patternProperties", "must be an object"))?;
            for (source, sub) in patterns {
                let pattern = Pattern::new(source)
                    .map_err(|e| CompileError::invalid_keyword("patternProperties", e.to_string()))?;
                let node = self.compile_child(sub, scope)?;
                out.pattern_properties.push((pattern, node));
            }
        }

        Ok(out)
    }
}

/// Draft-04 `required` list. A draft-03 boolean `required` is ignored.
fn required_names(map: &Map<String, Value>) -> Result<Vec<&str>, CompileError> {
    match map.get("required") {
        None | Some(Value::Bool(_)) => Ok(Vec::new()),
        Some(Value::Array(names)) => {
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| CompileError::invalid_keyword("required", "must list property names"))?;
                if !out.contains(&name) {
                    out.push(name);
                }
            }
            Ok(out)
        }
        Some(_) => Err(CompileError::invalid_keyword("required", "must be an array of strings")),
    }
}
