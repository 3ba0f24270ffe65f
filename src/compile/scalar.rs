//! String and numeric range keywords. Compiled only under `Assertions::Full`;
//! otherwise they drive type inference and nothing else.
use serde_json::{Map, Value};

use super::count;
use crate::config::{Assertions, CompileOptions};
use crate::error::CompileError;
use crate::schema::{NumericNode, Pattern, StringNode};

pub(super) fn compile_string(map: &Map<String, Value>, options: &CompileOptions) -> Result<StringNode, CompileError> {
    let mut out = StringNode::default();
    if options.assertions != Assertions::Full {
        return Ok(out);
    }
    out.min_length = count(map, "minLength")?;
    out.max_length = count(map, "maxLength")?;
    if let Some(raw) = map.get("pattern") {
        let source = raw
            .as_str()
            .ok_or_else(|| CompileError::invalid_keyword("pattern", "must be a string"))?;
        out.pattern = Some(Pattern::new(source).map_err(|e| CompileError::invalid_keyword("pattern", e.to_string()))?);
    }
    Ok(out)
}

pub(super) fn compile_numeric(map: &Map<String, Value>, options: &CompileOptions) -> Result<NumericNode, CompileError> {
    let mut out = NumericNode::default();
    if options.assertions != Assertions::Full {
        return Ok(out);
    }
    out.minimum = number(map, "minimum")?;
    out.maximum = number(map, "maximum")?;

    // draft-04 booleans turn the plain bound exclusive; later drafts give the bound itself
    match map.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => out.exclusive_minimum = out.minimum.take(),
        Some(Value::Bool(false)) | None => {}
        Some(_) => out.exclusive_minimum = number(map, "exclusiveMinimum")?,
    }
    match map.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => out.exclusive_maximum = out.maximum.take(),
        Some(Value::Bool(false)) | None => {}
        Some(_) => out.exclusive_maximum = number(map, "exclusiveMaximum")?,
    }

    out.multiple_of = number(map, "multipleOf")?;
    if out.multiple_of.is_some_and(|m| m <= 0.0) {
        return Err(CompileError::invalid_keyword("multipleOf", "must be greater than 0"));
    }
    Ok(out)
}

fn number(map: &Map<String, Value>, keyword: &str) -> Result<Option<f64>, CompileError> {
    match map.get(keyword) {
        None => Ok(None),
        Some(raw) => raw
            .as_f64()
            .map(Some)
            .ok_or_else(|| CompileError::invalid_keyword(keyword, "must be a number")),
    }
}
