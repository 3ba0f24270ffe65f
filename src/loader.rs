//! Reading schemas and instances from disk.
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::compile::{CompiledSchema, Compiler};
use crate::error::{CompileError, LoadError};
use crate::outcome::ValidationResult;

/// Read and parse one JSON document.
pub fn load_json_from_file(path: impl AsRef<Path>) -> Result<Value, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
    crate::path_de::from_slice_with_path(&bytes).map_err(|error| LoadError::MalformedJson {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

/// Validate `schema` against the bundled draft-04 meta-schema.
pub fn check_schema(schema: &Value) -> Result<ValidationResult, CompileError> {
    Ok(crate::meta::draft4()?.validate(schema))
}

/// Load, meta-validate and compile a schema file with default options.
pub fn load_schema_from_file(path: impl AsRef<Path>) -> Result<CompiledSchema, LoadError> {
    load_schema_with(path, &Compiler::default())
}

pub fn load_schema_with(path: impl AsRef<Path>, compiler: &Compiler) -> Result<CompiledSchema, LoadError> {
    let path = path.as_ref();
    let document = load_json_from_file(path)?;
    let verdict = check_schema(&document)?;
    if !verdict.valid {
        return Err(LoadError::SchemaFailsMetaValidation { path: path.to_path_buf(), result: Box::new(verdict) });
    }
    debug!(path = %path.display(), "schema passed meta-validation");
    Ok(compiler.compile(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_compiles_a_schema_file() {
        let file = write_temp(r#"{"type": "object", "required": ["a"]}"#);
        let schema = load_schema_from_file(file.path()).unwrap();
        assert!(schema.is_valid(&json!({"a": 1})));
        assert!(!schema.is_valid(&json!({})));
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        let file = write_temp(r#"{"type": "#);
        match load_schema_from_file(file.path()) {
            Err(LoadError::MalformedJson { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected MalformedJson, got {other:?}"),
        }
    }

    #[test]
    fn meta_invalid_schema_is_rejected_before_compiling() {
        let file = write_temp(r#"{"type": "strnig"}"#);
        match load_schema_from_file(file.path()) {
            Err(LoadError::SchemaFailsMetaValidation { result, .. }) => assert!(!result.valid),
            other => panic!("expected SchemaFailsMetaValidation, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(load_json_from_file(&missing), Err(LoadError::Io { .. })));
    }

    #[test]
    fn load_errors_convert_to_compile_errors() {
        let file = write_temp(r#"{"minItems": -1}"#);
        let error: CompileError = load_schema_from_file(file.path()).unwrap_err().into();
        assert!(matches!(error, CompileError::SchemaFailsMetaValidation(_)));
    }
}
