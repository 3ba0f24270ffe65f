//! External `$ref` resolution.
//!
//! Fetching is a capability injected into the compiler through [`Retrieve`];
//! nothing in here decides *how* bytes arrive except [`DefaultRetriever`].
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{CompileError, FetchError};

pub trait Retrieve: Send + Sync {
    /// Fetch the whole document at `uri` (no fragment).
    fn retrieve(&self, uri: &str) -> Result<Value, FetchError>;
}

/// `http(s)://` through a blocking client with a timeout; everything else is
/// read from disk (`file://` prefix optional).
pub struct DefaultRetriever {
    client: reqwest::blocking::Client,
}

impl DefaultRetriever {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Retrieve for DefaultRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, FetchError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            debug!(uri, "fetching remote schema");
            let body = self.client.get(uri).send()?.error_for_status()?.text()?;
            return Ok(serde_json::from_str(&body)?);
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        debug!(path, "reading schema from disk");
        let source = std::fs::read_to_string(Path::new(path))?;
        Ok(serde_json::from_str(&source)?)
    }
}

/// In-memory registry keyed by URI.
#[derive(Debug, Clone, Default)]
pub struct MapRetriever {
    documents: HashMap<String, Value>,
}

impl MapRetriever {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, uri: impl Into<String>, document: Value) {
        self.documents.insert(normalize_base(&uri.into()), document);
    }

    pub fn with(mut self, uri: impl Into<String>, document: Value) -> Self {
        self.insert(uri, document);
        self
    }
}

impl FromIterator<(String, Value)> for MapRetriever {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut out = MapRetriever::new();
        for (uri, document) in iter {
            out.insert(uri, document);
        }
        out
    }
}

impl Retrieve for MapRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, FetchError> {
        self.documents
            .get(&normalize_base(uri))
            .cloned()
            .ok_or(FetchError::NotRegistered)
    }
}

/// Refuses every fetch.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetriever;

impl Retrieve for NoRetriever {
    fn retrieve(&self, _uri: &str) -> Result<Value, FetchError> { Err(FetchError::Disabled) }
}

// ------------------------------ Resolution -------------------------------- //

/// What part of a fetched document a reference addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// No fragment, or a bare `#`.
    Whole,
    /// `#/a/b`, kept with its leading `#`.
    Pointer(String),
    /// `#foo`, matched against `id`/`$id` values (kept with its leading `#`).
    Id(String),
}

/// Split at the last `#` into (document uri, fragment).
pub fn split_uri(uri: &str) -> (&str, Fragment) {
    match uri.rfind('#') {
        None => (uri, Fragment::Whole),
        Some(at) => {
            let (base, fragment) = uri.split_at(at);
            let fragment = match fragment {
                "#" => Fragment::Whole,
                f if f.starts_with("#/") => Fragment::Pointer(f.to_string()),
                f => Fragment::Id(f.to_string()),
            };
            (base, fragment)
        }
    }
}

/// Fetch `uri` and return the addressed node.
pub fn resolve_external(uri: &str, retriever: &dyn Retrieve) -> Result<Value, CompileError> {
    let (base, fragment) = split_uri(uri);
    let document = retriever
        .retrieve(base)
        .map_err(|source| CompileError::RemoteFetchFailed { uri: base.to_string(), source })?;
    match fragment {
        Fragment::Whole => Ok(document),
        Fragment::Pointer(pointer) => {
            crate::pointer::resolve_local(&pointer, &document).cloned()
        }
        Fragment::Id(id) => find_by_id(&id, &document)
            .cloned()
            .ok_or_else(|| CompileError::FragmentNotFound { uri: base.to_string(), fragment: id }),
    }
}

/// Depth-first search for a subschema whose `id`/`$id` equals `fragment`.
///
/// Subschemas carrying an absolute id start another document and are not
/// entered.
pub fn find_by_id<'a>(fragment: &str, document: &'a Value) -> Option<&'a Value> {
    match document {
        Value::Object(map) => {
            for value in map.values() {
                if let Some(id) = declared_id(value) {
                    if id == fragment {
                        return Some(value);
                    }
                    if id.contains("://") {
                        continue;
                    }
                }
                if let Some(found) = find_by_id(fragment, value) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(xs) => xs.iter().find_map(|x| find_by_id(fragment, x)),
        _ => None,
    }
}

/// `$id` (draft-06+) or `id` (draft-04), when it is a string.
pub fn declared_id(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    map.get("$id").or_else(|| map.get("id")).and_then(Value::as_str)
}

/// Document identity for caches: no fragment, no trailing `#`.
pub fn normalize_base(uri: &str) -> String { split_uri(uri).0.to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_at_last_hash() {
        assert_eq!(split_uri("http://x/s.json"), ("http://x/s.json", Fragment::Whole));
        assert_eq!(split_uri("http://x/s.json#"), ("http://x/s.json", Fragment::Whole));
        assert_eq!(
            split_uri("http://x/s.json#/definitions/a"),
            ("http://x/s.json", Fragment::Pointer("#/definitions/a".into()))
        );
        assert_eq!(split_uri("http://x/s.json#foo"), ("http://x/s.json", Fragment::Id("#foo".into())));
    }

    #[test]
    fn id_scan_is_depth_first_and_skips_foreign_documents() {
        let doc = json!({
            "definitions": {
                "other": {"id": "http://elsewhere/x.json", "properties": {"p": {"id": "#target", "type": "null"}}},
                "a": {"items": [{"id": "#target", "type": "string"}]}
            }
        });
        assert_eq!(find_by_id("#target", &doc), Some(&json!({"id": "#target", "type": "string"})));
        assert_eq!(find_by_id("#missing", &doc), None);
    }

    #[test]
    fn resolves_through_injected_retriever() {
        let retriever = MapRetriever::new().with(
            "http://example.com/s.json",
            json!({"definitions": {"n": {"type": "null"}}, "x": {"id": "#x", "type": "string"}}),
        );
        let whole = resolve_external("http://example.com/s.json#", &retriever).unwrap();
        assert!(whole.get("definitions").is_some());
        let by_pointer = resolve_external("http://example.com/s.json#/definitions/n", &retriever).unwrap();
        assert_eq!(by_pointer, json!({"type": "null"}));
        let by_id = resolve_external("http://example.com/s.json#x", &retriever).unwrap();
        assert_eq!(by_id["type"], "string");
        assert!(matches!(
            resolve_external("http://example.com/s.json#nope", &retriever),
            Err(CompileError::FragmentNotFound { .. })
        ));
        assert!(matches!(
            resolve_external("http://example.com/other.json", &retriever),
            Err(CompileError::RemoteFetchFailed { .. })
        ));
    }

    #[test]
    fn default_retriever_reads_bare_and_file_uri_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"type": "integer"}"#).unwrap();
        let retriever = DefaultRetriever::new(Duration::from_secs(1)).unwrap();

        let bare = retriever.retrieve(&path.display().to_string()).unwrap();
        assert_eq!(bare, json!({"type": "integer"}));
        let uri = format!("file://{}", path.display());
        assert_eq!(retriever.retrieve(&uri).unwrap(), bare);
    }

    #[test]
    fn default_retriever_reports_unreadable_and_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not json").unwrap();
        let retriever = DefaultRetriever::new(Duration::from_secs(1)).unwrap();

        assert!(matches!(retriever.retrieve(&path.display().to_string()), Err(FetchError::Decode(_))));
        let missing = dir.path().join("missing.json");
        assert!(matches!(retriever.retrieve(&missing.display().to_string()), Err(FetchError::Io(_))));
    }

    #[test]
    fn no_retriever_refuses() {
        assert!(matches!(NoRetriever.retrieve("http://x"), Err(FetchError::Disabled)));
    }
}
