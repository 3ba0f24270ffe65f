//! Schema compiler: raw keyword maps → arena of [`SchemaNode`]s.
//!
//! Every `$ref` target is registered in its document's definitions table
//! *before* its children are compiled, so self-referential and mutually
//! recursive schemas resolve to the already-registered node instead of
//! recursing forever. The slot is reserved first and filled in afterwards.
//!
//! One compilation run owns:
//! - one scope per document (the root, plus every fetched document), each with
//!   its own definitions table keyed by fragment (`#`, `#/a/b`, `#id`);
//! - a map from absolute document URI to scope, shared by all nested fetches,
//!   so a remote document referring back into an earlier one reuses its nodes.
mod array;
mod object;
mod scalar;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::config::CompileOptions;
use crate::error::{CompileError, FetchError};
use crate::retrieve::{declared_id, find_by_id, split_uri, DefaultRetriever, Fragment, Retrieve};
use crate::schema::{Composition, NodeId, NodeKind, SchemaNode, TypeName};

// ------------------------------- Keywords --------------------------------- //

/// Keyword groups driving type inference when `type` is absent.
pub const OBJECT_KEYWORDS: [&str; 7] = [
    "properties",
    "required",
    "additionalProperties",
    "minProperties",
    "maxProperties",
    "dependencies",
    "patternProperties",
];
pub const ARRAY_KEYWORDS: [&str; 5] = ["items", "additionalItems", "minItems", "maxItems", "uniqueItems"];
pub const STRING_KEYWORDS: [&str; 4] = ["minLength", "maxLength", "pattern", "format"];
pub const NUMERIC_KEYWORDS: [&str; 5] =
    ["multipleOf", "minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"];

/// Effective type of a keyword map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inferred {
    Untyped,
    Single(TypeName),
    Multi(Vec<TypeName>),
}

/// Declared `type`, or the keyword groups present (in key order) when absent.
pub fn infer_type(map: &Map<String, Value>) -> Result<Inferred, CompileError> {
    match map.get("type") {
        Some(Value::String(name)) => Ok(TypeName::parse(name).map_or(Inferred::Untyped, Inferred::Single)),
        Some(Value::Array(names)) => {
            let mut types = Vec::new();
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| CompileError::invalid_keyword("type", "type names must be strings"))?;
                // unknown names ("any") are ignored
                if let Some(t) = TypeName::parse(name) {
                    if !types.contains(&t) {
                        types.push(t);
                    }
                }
            }
            Ok(if types.is_empty() { Inferred::Untyped } else { Inferred::Multi(types) })
        }
        Some(_) => Err(CompileError::invalid_keyword("type", "must be a string or an array of strings")),
        None => {
            let mut candidates = Vec::new();
            for key in map.keys() {
                let group = if OBJECT_KEYWORDS.contains(&key.as_str()) {
                    TypeName::Object
                } else if ARRAY_KEYWORDS.contains(&key.as_str()) {
                    TypeName::Array
                } else if STRING_KEYWORDS.contains(&key.as_str()) {
                    TypeName::String
                } else if NUMERIC_KEYWORDS.contains(&key.as_str()) {
                    TypeName::Number
                } else {
                    continue;
                };
                if !candidates.contains(&group) {
                    candidates.push(group);
                }
            }
            Ok(match candidates.len() {
                0 => Inferred::Untyped,
                1 => Inferred::Single(candidates[0]),
                _ => Inferred::Multi(candidates),
            })
        }
    }
}

// ------------------------------- Output ----------------------------------- //

/// Immutable after compilation; share it freely across threads and `validate` calls.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: NodeId,
    pub(crate) definitions: IndexMap<String, NodeId>,
    pub(crate) options: CompileOptions,
}

impl CompiledSchema {
    pub fn root(&self) -> NodeId { self.root }

    pub fn node(&self, id: NodeId) -> &SchemaNode { &self.nodes[id.0] }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Definitions table of the root document, keyed by fragment (`#`, `#/definitions/a`).
    pub fn definitions(&self) -> &IndexMap<String, NodeId> { &self.definitions }

    pub fn options(&self) -> &CompileOptions { &self.options }
}

// ------------------------------ Front API --------------------------------- //

/// Compile with default options, fetching remote references through [`DefaultRetriever`].
pub fn compile(schema: &Value) -> Result<CompiledSchema, CompileError> {
    Compiler::new(CompileOptions::default()).compile(schema)
}

#[derive(Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
    retriever: Option<Arc<dyn Retrieve>>,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self { Self { options, retriever: None } }

    pub fn with_retriever(mut self, retriever: impl Retrieve + 'static) -> Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    pub fn options(&self) -> &CompileOptions { &self.options }

    pub fn compile(&self, schema: &Value) -> Result<CompiledSchema, CompileError> {
        let mut session = Session {
            options: &self.options,
            retriever: self.retriever.as_deref(),
            fallback: None,
            nodes: Vec::new(),
            scopes: Vec::new(),
            scope_by_base: HashMap::new(),
            aliases: Vec::new(),
            depth: 0,
        };
        let base = declared_id(schema)
            .filter(|id| id.contains("://"))
            .map(|id| split_uri(id).0.to_string());
        let scope = session.open_scope(base, Arc::new(schema.clone()));
        let root = session.compile_fragment(Fragment::Whole, scope)?;
        session.resolve_aliases();

        let definitions = session.scopes.swap_remove(scope).definitions;
        debug!(nodes = session.nodes.len(), definitions = definitions.len(), "compiled schema");
        Ok(CompiledSchema {
            nodes: session.nodes,
            root,
            definitions,
            options: self.options.clone(),
        })
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("retriever", &self.retriever.as_ref().map(|_| "custom"))
            .finish()
    }
}

// ------------------------------- Session ---------------------------------- //

type ScopeId = usize;

/// One document: its root value and its definitions table.
struct Scope {
    root: Arc<Value>,
    definitions: IndexMap<String, NodeId>,
}

pub(crate) struct Session<'c> {
    options: &'c CompileOptions,
    retriever: Option<&'c dyn Retrieve>,
    fallback: Option<DefaultRetriever>,
    nodes: Vec<SchemaNode>,
    scopes: Vec<Scope>,
    scope_by_base: HashMap<String, ScopeId>,
    aliases: Vec<(NodeId, NodeId)>, // (slot, target) for pure `$ref` maps
    depth: usize,
}

impl Session<'_> {
    fn open_scope(&mut self, base: Option<String>, root: Arc<Value>) -> ScopeId {
        let scope = self.scopes.len();
        self.scopes.push(Scope { root, definitions: IndexMap::new() });
        if let Some(base) = base {
            self.scope_by_base.insert(base, scope);
        }
        scope
    }

    /// A fresh always-true slot; its identity is stable from here on.
    pub(crate) fn reserve(&mut self) -> NodeId {
        self.nodes.push(SchemaNode::default());
        NodeId(self.nodes.len() - 1)
    }

    /// Compile a child schema. References return the shared registered node.
    pub(crate) fn compile_child(&mut self, raw: &Value, scope: ScopeId) -> Result<NodeId, CompileError> {
        if let Some(reference) = raw.get("$ref") {
            return self.compile_ref(ref_str(reference)?, scope);
        }
        let slot = self.reserve();
        self.fill(slot, raw, scope)?;
        Ok(slot)
    }

    fn compile_ref(&mut self, reference: &str, scope: ScopeId) -> Result<NodeId, CompileError> {
        let (base, fragment) = split_uri(reference);
        let scope = if base.is_empty() { scope } else { self.document_scope(base)? };
        self.compile_fragment(fragment, scope)
    }

    fn compile_fragment(&mut self, fragment: Fragment, scope: ScopeId) -> Result<NodeId, CompileError> {
        let key = match &fragment {
            Fragment::Whole => "#".to_string(),
            Fragment::Pointer(pointer) | Fragment::Id(pointer) => pointer.clone(),
        };
        if let Some(&existing) = self.scopes[scope].definitions.get(&key) {
            trace!(key, node = existing.0, "reusing registered node");
            return Ok(existing);
        }
        let root = Arc::clone(&self.scopes[scope].root);
        let target = match &fragment {
            Fragment::Whole => root.as_ref(),
            Fragment::Pointer(pointer) => crate::pointer::resolve_local(pointer, &root)?,
            Fragment::Id(id) => find_by_id(id, &root).ok_or_else(|| CompileError::FragmentNotFound {
                uri: self.base_of(scope),
                fragment: id.clone(),
            })?,
        };
        let slot = self.reserve();
        self.scopes[scope].definitions.insert(key.clone(), slot);
        debug!(key, scope, node = slot.0, "registered reference target");
        self.fill(slot, target, scope)?;
        Ok(slot)
    }

    fn document_scope(&mut self, base: &str) -> Result<ScopeId, CompileError> {
        if let Some(&scope) = self.scope_by_base.get(base) {
            return Ok(scope);
        }
        let document = self.fetch(base)?;
        Ok(self.open_scope(Some(base.to_string()), Arc::new(document)))
    }

    fn fetch(&mut self, uri: &str) -> Result<Value, CompileError> {
        debug!(uri, "resolving external reference");
        let failed = |source: FetchError| CompileError::RemoteFetchFailed { uri: uri.to_string(), source };
        if self.retriever.is_none() && self.fallback.is_none() {
            self.fallback = Some(DefaultRetriever::new(self.options.fetch_timeout).map_err(failed)?);
        }
        let retriever: &dyn Retrieve = match (self.retriever, self.fallback.as_ref()) {
            (Some(retriever), _) => retriever,
            (None, Some(fallback)) => fallback,
            (None, None) => return Err(failed(FetchError::Disabled)),
        };
        retriever.retrieve(uri).map_err(failed)
    }

    fn base_of(&self, scope: ScopeId) -> String {
        self.scope_by_base
            .iter()
            .find(|(_, s)| **s == scope)
            .map(|(base, _)| base.clone())
            .unwrap_or_else(|| "#".to_string())
    }

    /// Build the node for `raw` into the reserved `slot`.
    fn fill(&mut self, slot: NodeId, raw: &Value, scope: ScopeId) -> Result<(), CompileError> {
        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            Err(CompileError::DepthLimitExceeded { limit: self.options.max_depth })
        } else {
            self.fill_node(slot, raw, scope)
        };
        self.depth -= 1;
        result
    }

    fn fill_node(&mut self, slot: NodeId, raw: &Value, scope: ScopeId) -> Result<(), CompileError> {
        let map = match raw {
            Value::Object(map) => map,
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => {
                let always = self.reserve();
                self.nodes[slot.0].shared.not = vec![always];
                return Ok(());
            }
            other => {
                return Err(CompileError::invalid_keyword(
                    "schema",
                    format!("expected an object or a boolean, found {}", crate::value::describe(other)),
                ));
            }
        };

        if let Some(reference) = map.get("$ref") {
            let target = self.compile_ref(ref_str(reference)?, scope)?;
            if target == slot {
                warn!(node = slot.0, "reference resolves to itself; accepting every instance");
            } else {
                self.aliases.push((slot, target));
            }
            return Ok(());
        }

        let shared = self.compile_shared(map, scope)?;
        let kind = match infer_type(map)? {
            Inferred::Untyped => NodeKind::Generic,
            Inferred::Single(t) => self.compile_kind(t, map, scope)?,
            Inferred::Multi(types) => {
                let mut candidates = Vec::with_capacity(types.len());
                for t in types {
                    let candidate = self.reserve();
                    let kind = self.compile_kind(t, map, scope)?;
                    self.nodes[candidate.0] = SchemaNode { kind, shared: shared.clone() };
                    candidates.push(candidate);
                }
                NodeKind::MultiType(candidates)
            }
        };
        self.nodes[slot.0] = SchemaNode { kind, shared };
        Ok(())
    }

    fn compile_shared(&mut self, map: &Map<String, Value>, scope: ScopeId) -> Result<Composition, CompileError> {
        let mut out = Composition::default();
        if let Some(values) = map.get("enum") {
            out.enum_values = values
                .as_array()
                .ok_or_else(|| CompileError::invalid_keyword("enum", "must be an array"))?
                .clone();
        }
        out.all_of = self.compile_list(map, "allOf", scope)?;
        out.one_of = self.compile_list(map, "oneOf", scope)?;
        out.any_of = self.compile_list(map, "anyOf", scope)?;
        out.not = match map.get("not") {
            None => Vec::new(),
            Some(Value::Array(_)) => self.compile_list(map, "not", scope)?,
            Some(single) => vec![self.compile_child(single, scope)?],
        };
        Ok(out)
    }

    fn compile_list(&mut self, map: &Map<String, Value>, keyword: &str, scope: ScopeId) -> Result<Vec<NodeId>, CompileError> {
        let Some(raw) = map.get(keyword) else { return Ok(Vec::new()) };
        let xs = raw
            .as_array()
            .ok_or_else(|| CompileError::invalid_keyword(keyword, "must be an array of schemas"))?;
        xs.iter().map(|x| self.compile_child(x, scope)).collect()
    }

    fn compile_kind(&mut self, t: TypeName, map: &Map<String, Value>, scope: ScopeId) -> Result<NodeKind, CompileError> {
        Ok(match t {
            TypeName::Object => NodeKind::Object(self.compile_object(map, scope)?),
            TypeName::Array => NodeKind::Array(self.compile_array(map, scope)?),
            TypeName::String => NodeKind::String(scalar::compile_string(map, self.options)?),
            TypeName::Integer => NodeKind::Integer(scalar::compile_numeric(map, self.options)?),
            TypeName::Number => NodeKind::Number(scalar::compile_numeric(map, self.options)?),
            TypeName::Boolean => NodeKind::Boolean,
            TypeName::Null => NodeKind::Null,
        })
    }

    /// Pure-reference slots become copies of their final target; cycles made
    /// only of references accept everything.
    fn resolve_aliases(&mut self) {
        let links: HashMap<NodeId, NodeId> = self.aliases.iter().copied().collect();
        for &(slot, _) in &self.aliases {
            let mut seen = HashSet::new();
            let mut target = slot;
            let resolved = loop {
                if !seen.insert(target) {
                    break None;
                }
                match links.get(&target) {
                    Some(&next) => target = next,
                    None => break Some(target),
                }
            };
            match resolved {
                Some(target) => self.nodes[slot.0] = self.nodes[target.0].clone(),
                None => warn!(node = slot.0, "reference cycle without constraints; accepting every instance"),
            }
        }
    }
}

// ------------------------------- Helpers ---------------------------------- //

fn ref_str(value: &Value) -> Result<&str, CompileError> {
    value
        .as_str()
        .ok_or_else(|| CompileError::invalid_keyword("$ref", "must be a string"))
}

/// Non-negative integer keyword (`2` or `2.0`).
pub(crate) fn count(map: &Map<String, Value>, keyword: &str) -> Result<Option<u64>, CompileError> {
    let Some(raw) = map.get(keyword) else { return Ok(None) };
    if let Some(n) = raw.as_u64() {
        return Ok(Some(n));
    }
    match raw.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
        _ => Err(CompileError::invalid_keyword(keyword, "must be a non-negative integer")),
    }
}
