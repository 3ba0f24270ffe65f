//! JSON Schema compiler and validation engine.
//!
//! A schema document is compiled once into an arena of [`schema::SchemaNode`]s
//! (recursive and cross-document `$ref`s become shared node ids), then any
//! number of instances are validated against it. Validation stops at the
//! first failure and reports where it happened in both the schema and the
//! document.
pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod loader;
pub mod meta;
pub mod outcome;
pub mod path_de;
pub mod pointer;
pub mod retrieve;
pub mod schema;
pub mod validate;
pub mod value;

pub use compile::{compile, CompiledSchema, Compiler};
pub use config::{Assertions, CompileOptions, NumberPolicy};
pub use error::{CompileError, FetchError, LoadError};
pub use outcome::{Combinator, FailureKind, PathSegment, ValidationResult};
pub use retrieve::{DefaultRetriever, MapRetriever, NoRetriever, Retrieve};
