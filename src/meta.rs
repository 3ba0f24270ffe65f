//! Bundled draft-04 meta-schema.
use once_cell::sync::OnceCell;

use crate::compile::{CompiledSchema, Compiler};
use crate::config::{Assertions, CompileOptions, NumberPolicy};
use crate::error::CompileError;
use crate::retrieve::NoRetriever;

pub const DRAFT4_META_SCHEMA: &str = include_str!("../schemas/draft-04.json");

static DRAFT4: OnceCell<CompiledSchema> = OnceCell::new();

/// The draft-04 meta-schema, compiled on first use.
///
/// Compiled with lenient numbers so `"maximum": 5` satisfies `{"type": "number"}`,
/// and with full assertions so `"minItems": -1` is rejected.
pub fn draft4() -> Result<&'static CompiledSchema, CompileError> {
    DRAFT4.get_or_try_init(|| {
        let document = serde_json::from_str(DRAFT4_META_SCHEMA)
            .map_err(|e| CompileError::MalformedSchemaDocument(e.to_string()))?;
        let options = CompileOptions::default()
            .number_policy(NumberPolicy::Lenient)
            .assertions(Assertions::Full);
        Compiler::new(options)
            .with_retriever(NoRetriever)
            .compile(&document)
    })
}
