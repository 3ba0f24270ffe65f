//! JSON Pointer parsing and local resolution.
//!
//! Accepts both plain pointers (`/a/b`) and URI fragments (`#/a/b`, `#`).
//! Fragments are percent-decoded before `~1`/`~0` unescaping.
use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::error::CompileError;
use crate::outcome::PathSegment;

/// Split a pointer into unescaped reference tokens.
///
/// The leading empty (or `#`) token is discarded, so `#` and `""` both
/// address the whole document.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, CompileError> {
    let (body, is_fragment) = match pointer.strip_prefix('#') {
        Some(rest) => (rest, true),
        None => (pointer, false),
    };
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = body.strip_prefix('/') else {
        return Err(malformed(pointer, "must start with `/`"));
    };
    body.split('/')
        .map(|raw| {
            let token = if is_fragment {
                percent_decode_str(raw)
                    .decode_utf8()
                    .map_err(|_| malformed(pointer, "percent escapes do not decode to UTF-8"))?
                    .into_owned()
            } else {
                raw.to_string()
            };
            unescape(&token).ok_or_else(|| malformed(pointer, "`~` must be followed by `0` or `1`"))
        })
        .collect()
}

/// Walk `root` token by token: maps by key, sequences by decimal index.
pub fn resolve_local<'a>(pointer: &str, root: &'a Value) -> Result<&'a Value, CompileError> {
    let tokens = parse_pointer(pointer)?;
    let mut node = root;
    for token in &tokens {
        node = match node {
            Value::Object(map) => map.get(token),
            Value::Array(xs) => {
                let index = parse_index(token).ok_or_else(|| {
                    malformed(pointer, &format!("`{token}` is not an array index"))
                })?;
                xs.get(index)
            }
            _ => None,
        }
        .ok_or_else(|| CompileError::PointerNotFound {
            pointer: pointer.to_string(),
            token: token.clone(),
        })?;
    }
    Ok(node)
}

/// Inverse of [`parse_pointer`] for diagnostic paths (no `#` prefix).
pub fn render_pointer(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        match segment {
            PathSegment::Key(key) => out.push_str(&key.replace('~', "~0").replace('/', "~1")),
            PathSegment::Index(index) => out.push_str(&index.to_string()),
        }
    }
    out
}

// ------------------------------- Helpers --------------------------------- //

fn malformed(pointer: &str, reason: &str) -> CompileError {
    CompileError::MalformedPointer {
        pointer: pointer.to_string(),
        reason: reason.to_string(),
    }
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            _ => return None,
        }
    }
    Some(out)
}

// RFC 6901: no leading zeros, no sign.
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if token.len() > 1 && token.starts_with('0') {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_and_unescapes_tokens() {
        assert_eq!(parse_pointer("#/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(parse_pointer("/foo/0").unwrap(), vec!["foo", "0"]);
        assert!(parse_pointer("#").unwrap().is_empty());
        assert!(parse_pointer("").unwrap().is_empty());
        assert_eq!(parse_pointer("#/").unwrap(), vec![""]);
    }

    #[test]
    fn fragment_tokens_are_percent_decoded() {
        assert_eq!(parse_pointer("#/percent%25field").unwrap(), vec!["percent%field"]);
        // plain pointers keep `%` literally
        assert_eq!(parse_pointer("/percent%25field").unwrap(), vec!["percent%25field"]);
        assert_eq!(parse_pointer("#/caf%C3%A9").unwrap(), vec!["café"]);
    }

    #[test]
    fn percent_escapes_must_decode_to_utf8() {
        assert!(matches!(parse_pointer("#/%FF"), Err(CompileError::MalformedPointer { .. })));
        // an incomplete escape is kept as written
        assert_eq!(parse_pointer("#/100%").unwrap(), vec!["100%"]);
    }

    #[test]
    fn rejects_dangling_tilde() {
        assert!(matches!(parse_pointer("#/a~"), Err(CompileError::MalformedPointer { .. })));
        assert!(matches!(parse_pointer("#/a~2"), Err(CompileError::MalformedPointer { .. })));
        assert!(matches!(parse_pointer("#a"), Err(CompileError::MalformedPointer { .. })));
    }

    #[test]
    fn resolves_keys_and_indices() {
        let doc = json!({"foo": ["bar", "baz"], "a/b": {"~": 1}});
        assert_eq!(resolve_local("#/foo/1", &doc).unwrap(), &json!("baz"));
        assert_eq!(resolve_local("#/a~1b/~0", &doc).unwrap(), &json!(1));
        assert_eq!(resolve_local("#", &doc).unwrap(), &doc);
    }

    #[test]
    fn missing_tokens_and_bad_indices() {
        let doc = json!({"foo": ["bar"]});
        assert!(matches!(
            resolve_local("#/foo/3", &doc),
            Err(CompileError::PointerNotFound { token, .. }) if token == "3"
        ));
        assert!(matches!(resolve_local("#/nope", &doc), Err(CompileError::PointerNotFound { .. })));
        assert!(matches!(resolve_local("#/foo/01", &doc), Err(CompileError::MalformedPointer { .. })));
        assert!(matches!(resolve_local("#/foo/x", &doc), Err(CompileError::MalformedPointer { .. })));
    }

    #[test]
    fn renders_diagnostic_paths() {
        let path = vec![PathSegment::from("a/b"), PathSegment::from(0), PathSegment::from("~")];
        assert_eq!(render_pointer(&path), "/a~1b/0/~0");
        assert_eq!(render_pointer(&[]), "");
    }
}
