// Compiled schema representation. No raw keyword maps past this point.
//
// Nodes live in an arena (`CompiledSchema::nodes`) and refer to each other by
// `NodeId`, so recursive and mutually-recursive schemas are plain index cycles.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::config::NumberPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize { self.0 }
}

/// Primitive JSON Schema type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl TypeName {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "object" => TypeName::Object,
            "array" => TypeName::Array,
            "string" => TypeName::String,
            "integer" => TypeName::Integer,
            "number" => TypeName::Number,
            "boolean" => TypeName::Boolean,
            "null" => TypeName::Null,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Object => "object",
            TypeName::Array => "array",
            TypeName::String => "string",
            TypeName::Integer => "integer",
            TypeName::Number => "number",
            TypeName::Boolean => "boolean",
            TypeName::Null => "null",
        }
    }

    /// Runtime kind check. Booleans never count as numbers; under the strict
    /// policy an integral literal is an `integer` and not a `number`.
    pub fn matches(self, value: &Value, policy: NumberPolicy) -> bool {
        match (self, value) {
            (TypeName::Object, Value::Object(_)) => true,
            (TypeName::Array, Value::Array(_)) => true,
            (TypeName::String, Value::String(_)) => true,
            (TypeName::Boolean, Value::Bool(_)) => true,
            (TypeName::Null, Value::Null) => true,
            (TypeName::Integer, Value::Number(n)) => n.is_i64() || n.is_u64() || is_wide_integer(n),
            (TypeName::Number, Value::Number(n)) => match policy {
                NumberPolicy::Strict => n.is_f64(),
                NumberPolicy::Lenient => true,
            },
            _ => false,
        }
    }
}

/// Whole numbers beyond the i64/u64 range only survive parsing as f64.
fn is_wide_integer(n: &serde_json::Number) -> bool {
    const U64_END: f64 = 18_446_744_073_709_551_616.0;
    const I64_START: f64 = -9_223_372_036_854_775_808.0;
    n.as_f64()
        .is_some_and(|x| x.is_finite() && x.fract() == 0.0 && (x >= U64_END || x < I64_START))
}

// ------------------------------- Nodes ----------------------------------- //

/// One compiled keyword map.
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub shared: Composition,
}

/// Keywords every node carries regardless of its type.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub enum_values: Vec<Value>, // checked only if non-empty
    pub all_of: Vec<NodeId>,
    pub any_of: Vec<NodeId>,
    pub one_of: Vec<NodeId>,
    pub not: Vec<NodeId>,
}

impl Composition {
    pub fn is_empty(&self) -> bool {
        self.enum_values.is_empty()
            && self.all_of.is_empty()
            && self.any_of.is_empty()
            && self.one_of.is_empty()
            && self.not.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    /// No type constraint; only the shared keywords apply.
    #[default]
    Generic,
    Object(ObjectNode),
    Array(ArrayNode),
    String(StringNode),
    Integer(NumericNode),
    Number(NumericNode),
    Boolean,
    Null,
    /// One node per declared (or inferred) type, all built from the same keyword map.
    MultiType(Vec<NodeId>),
}

impl NodeKind {
    pub fn type_name(&self) -> Option<TypeName> {
        Some(match self {
            NodeKind::Object(_) => TypeName::Object,
            NodeKind::Array(_) => TypeName::Array,
            NodeKind::String(_) => TypeName::String,
            NodeKind::Integer(_) => TypeName::Integer,
            NodeKind::Number(_) => TypeName::Number,
            NodeKind::Boolean => TypeName::Boolean,
            NodeKind::Null => TypeName::Null,
            NodeKind::Generic | NodeKind::MultiType(_) => return None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectNode {
    /// Required keys; a key without a `properties` entry maps to an always-true node.
    pub required: IndexMap<String, NodeId>,
    /// Optional keys only; never overlaps `required`.
    pub properties: IndexMap<String, NodeId>,
    pub pattern_properties: Vec<(Pattern, NodeId)>,
    pub additional_properties: AdditionalProperties,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub property_dependencies: IndexMap<String, Vec<String>>,
    pub schema_dependencies: IndexMap<String, NodeId>,
}

impl ObjectNode {
    /// Key covered by `required`, `properties` or some pattern.
    pub fn declares(&self, key: &str) -> bool {
        self.required.contains_key(key)
            || self.properties.contains_key(key)
            || self.pattern_properties.iter().any(|(p, _)| p.is_match(key))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Disallowed,
    Schema(NodeId),
}

#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
    pub items: Items,
    /// Applies past the positional list; `None` accepts anything.
    pub additional_items: Option<NodeId>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Items {
    #[default]
    Any,
    Uniform(NodeId),
    Tuple(Vec<NodeId>),
}

/// String assertions, populated only under `Assertions::Full`.
#[derive(Debug, Clone, Default)]
pub struct StringNode {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
}

/// Numeric assertions, populated only under `Assertions::Full`.
/// Draft-04 boolean `exclusiveMinimum`/`exclusiveMaximum` are folded into the
/// exclusive bounds at compile time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericNode {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

/// A compiled regex together with its source text (used in schema paths).
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self { source: source.to_string(), regex: Regex::new(source)? })
    }

    /// Unanchored search: a match starting anywhere in `text` counts.
    pub fn is_match(&self, text: &str) -> bool { self.regex.is_match(text) }
}
