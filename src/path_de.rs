//! Typed JSON decoding that keeps the location of the first failure.
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("at JSON path {path} → {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
    fn from(error: serde_path_to_error::Error<serde_json::Error>) -> Self {
        Self { path: error.path().to_string(), message: error.into_inner().to_string() }
    }
}

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, DecodeError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    Ok(serde_path_to_error::deserialize(de)?)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    Ok(serde_path_to_error::deserialize(de)?)
}

/// Re-decode an already parsed document (e.g. one line of a line protocol).
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    Ok(serde_path_to_error::deserialize(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileOptions;
    use serde_json::json;

    #[test]
    fn reports_the_failing_field() {
        let error = from_value_with_path::<CompileOptions>(json!({"max_depth": "deep"})).unwrap_err();
        assert_eq!(error.path, "max_depth");
    }

    #[test]
    fn syntax_errors_carry_position() {
        let error = from_str_with_path::<Value>("{\"a\": }").unwrap_err();
        assert!(error.message.contains("line 1"));
    }
}
