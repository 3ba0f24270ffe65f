//! Validation outcome: pass/fail plus the trail into schema and document.
use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

/// One step of a schema or document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self { PathSegment::Key(value.to_string()) }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self { PathSegment::Key(value) }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self { PathSegment::Index(value) }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Combinator {
    AllOf,
    AnyOf,
    OneOf,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "combinator")]
pub enum FailureKind {
    TypeMismatch,
    RequiredMissing,
    AdditionalPropertyDisallowed,
    PatternMismatch,
    RangeViolation,
    UniquenessViolation,
    CombinatorFailure(Combinator),
    EnumMismatch,
    DependencyViolation,
    /// Validation recursed deeper than `CompileOptions::max_depth`.
    RecursionLimit,
}

/// Outcome of one `validate` call. `kind` is `None` iff `valid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub message: String,
    pub schema_path: Vec<PathSegment>,
    pub document_path: Vec<PathSegment>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            kind: None,
            message: String::new(),
            schema_path: Vec::new(),
            document_path: Vec::new(),
        }
    }

    /// `/properties/a/type`
    pub fn schema_pointer(&self) -> String { crate::pointer::render_pointer(&self.schema_path) }

    /// `/a`
    pub fn document_pointer(&self) -> String { crate::pointer::render_pointer(&self.document_path) }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        write!(
            f,
            "invalid: {} (schema path `{}`, document path `{}`)",
            self.message,
            self.schema_pointer(),
            self.document_pointer(),
        )
    }
}

impl From<Result<(), Failure>> for ValidationResult {
    fn from(outcome: Result<(), Failure>) -> Self {
        match outcome {
            Ok(()) => ValidationResult::valid(),
            Err(failure) => failure.into_result(),
        }
    }
}

// ------------------------------ Failure ----------------------------------- //

/// In-flight failure. Paths grow at the front while the recursion unwinds,
/// so the finished trail reads root-to-failure.
#[derive(Debug, Clone)]
pub(crate) struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub schema_path: VecDeque<PathSegment>,
    pub document_path: VecDeque<PathSegment>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            schema_path: VecDeque::new(),
            document_path: VecDeque::new(),
        }
    }

    /// Failure located at `keyword` (plus optional sub-keys) of the current node.
    pub fn at<I, S>(kind: FailureKind, message: impl Into<String>, schema_path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let mut failure = Self::new(kind, message);
        failure.schema_path = schema_path.into_iter().map(Into::into).collect();
        failure
    }

    pub fn with_document(mut self, segment: impl Into<PathSegment>) -> Self {
        self.document_path.push_back(segment.into());
        self
    }

    /// Prefix the schema path, e.g. `within(["allOf", 2])` → `allOf/2/...`.
    pub fn within<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<PathSegment>,
    {
        for segment in prefix.into_iter().rev() {
            self.schema_path.push_front(segment.into());
        }
        self
    }

    /// Prefix the document path with the key/index just descended into.
    pub fn inside(mut self, segment: impl Into<PathSegment>) -> Self {
        self.document_path.push_front(segment.into());
        self
    }

    pub fn into_result(self) -> ValidationResult {
        ValidationResult {
            valid: false,
            kind: Some(self.kind),
            message: self.message,
            schema_path: self.schema_path.into(),
            document_path: self.document_path.into(),
        }
    }
}
