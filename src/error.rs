//! Error taxonomy for compilation, retrieval and file loading.
//!
//! Validation mismatches are not errors; they come back as
//! [`crate::outcome::ValidationResult`] values.
use std::path::PathBuf;
use thiserror::Error;

use crate::outcome::ValidationResult;

/// Aborts compilation; there is no partially compiled schema.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("malformed JSON pointer `{pointer}`: {reason}")]
    MalformedPointer { pointer: String, reason: String },

    #[error("JSON pointer `{pointer}` does not resolve (no entry for `{token}`)")]
    PointerNotFound { pointer: String, token: String },

    #[error("no subschema with id `{fragment}` in `{uri}`")]
    FragmentNotFound { uri: String, fragment: String },

    #[error("failed to fetch `{uri}`: {source}")]
    RemoteFetchFailed {
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("malformed schema document: {0}")]
    MalformedSchemaDocument(String),

    /// Only the file loader produces this one.
    #[error("schema fails meta-validation: {0}")]
    SchemaFailsMetaValidation(String),

    #[error("invalid value for keyword `{keyword}`: {reason}")]
    InvalidKeyword { keyword: String, reason: String },

    #[error("schema nesting exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

impl CompileError {
    pub(crate) fn invalid_keyword(keyword: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidKeyword {
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of the injected retrieval capability.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("response is not JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no document registered for this uri")]
    NotRegistered,

    #[error("remote retrieval is disabled")]
    Disabled,
}

/// Errors raised by the file-loading collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {message}")]
    MalformedJson { path: PathBuf, message: String },

    #[error("invalid schema definition at {path}: {}", result.message)]
    SchemaFailsMetaValidation {
        path: PathBuf,
        result: Box<ValidationResult>,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl From<LoadError> for CompileError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::Compile(inner) => inner,
            LoadError::MalformedJson { path, message } => {
                CompileError::MalformedSchemaDocument(format!("{}: {message}", path.display()))
            }
            LoadError::Io { path, source } => {
                CompileError::MalformedSchemaDocument(format!("{}: {source}", path.display()))
            }
            LoadError::SchemaFailsMetaValidation { path, result } => {
                CompileError::SchemaFailsMetaValidation(format!(
                    "{}: {}",
                    path.display(),
                    result.message
                ))
            }
        }
    }
}
