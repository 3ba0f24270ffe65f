//! Validation engine.
//!
//! Fixed evaluation order per node:
//! 1. multi-type candidates (first type-matching candidate that fails wins);
//! 2. `allOf`, `anyOf`, `oneOf`, `not`, `enum`;
//! 3. the native type check of single-type nodes;
//! 4. object/array structure (and scalar ranges under `Assertions::Full`).
//!
//! The first failure returns immediately; nothing is aggregated.
mod array;
mod object;
mod scalar;

use serde_json::Value;

use crate::compile::CompiledSchema;
use crate::config::{Assertions, NumberPolicy};
use crate::outcome::{Combinator, Failure, FailureKind, PathSegment, ValidationResult};
use crate::schema::{Composition, NodeId, NodeKind};
use crate::value::{describe, json_eq, preview};

impl CompiledSchema {
    pub fn validate(&self, instance: &Value) -> ValidationResult {
        self.validator().check(self.root, instance, 0).into()
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator().check(self.root, instance, 0).is_ok()
    }

    fn validator(&self) -> Validator<'_> {
        Validator {
            schema: self,
            policy: self.options.number_policy,
            assertions: self.options.assertions,
            max_depth: self.options.max_depth,
        }
    }
}

pub(crate) struct Validator<'s> {
    schema: &'s CompiledSchema,
    policy: NumberPolicy,
    assertions: Assertions,
    max_depth: usize,
}

impl Validator<'_> {
    pub(crate) fn check(&self, id: NodeId, instance: &Value, depth: usize) -> Result<(), Failure> {
        if depth > self.max_depth {
            return Err(Failure::new(
                FailureKind::RecursionLimit,
                format!("validation nested deeper than {} levels", self.max_depth),
            ));
        }
        let node = self.schema.node(id);
        match &node.kind {
            NodeKind::Generic => self.check_shared(&node.shared, instance, depth),
            // candidates carry the shared keywords themselves
            NodeKind::MultiType(candidates) => self.check_candidates(candidates, instance, depth),
            kind => {
                self.check_shared(&node.shared, instance, depth)?;
                self.check_type(kind, instance)?;
                self.check_structure(kind, instance, depth)
            }
        }
    }

    fn passes(&self, id: NodeId, instance: &Value, depth: usize) -> bool {
        self.check(id, instance, depth + 1).is_ok()
    }

    // No backtracking: a type-matching candidate that fails decides the outcome.
    // Composition is evaluated once, on the first match; later matches only
    // add their own structural keywords.
    fn check_candidates(&self, candidates: &[NodeId], instance: &Value, depth: usize) -> Result<(), Failure> {
        let mut matched = false;
        for &candidate in candidates {
            let kind = &self.schema.node(candidate).kind;
            let Some(t) = kind.type_name() else { continue };
            if !t.matches(instance, self.policy) {
                continue;
            }
            if matched {
                self.check_structure(kind, instance, depth + 1)?;
            } else {
                self.check(candidate, instance, depth + 1)?;
                matched = true;
            }
        }
        if matched {
            return Ok(());
        }
        let names: Vec<&str> = candidates
            .iter()
            .filter_map(|&c| self.schema.node(c).kind.type_name())
            .map(|t| t.as_str())
            .collect();
        Err(Failure::at(
            FailureKind::TypeMismatch,
            format!("expected one of [{}], found {} {}", names.join(", "), describe(instance), preview(instance)),
            ["type"],
        ))
    }

    fn check_shared(&self, shared: &Composition, instance: &Value, depth: usize) -> Result<(), Failure> {
        for (i, &child) in shared.all_of.iter().enumerate() {
            self.check(child, instance, depth + 1)
                .map_err(|f| f.within([PathSegment::from("allOf"), PathSegment::from(i)]))?;
        }
        if !shared.any_of.is_empty() && !shared.any_of.iter().any(|&c| self.passes(c, instance, depth)) {
            return Err(Failure::at(
                FailureKind::CombinatorFailure(Combinator::AnyOf),
                format!("{} does not validate against any schema in anyOf", preview(instance)),
                ["anyOf"],
            ));
        }
        if !shared.one_of.is_empty() {
            let hits = shared.one_of.iter().filter(|&&c| self.passes(c, instance, depth)).count();
            let reason = match hits {
                1 => None,
                0 => Some("validates against none"),
                _ => Some("validates against more than one"),
            };
            if let Some(reason) = reason {
                return Err(Failure::at(
                    FailureKind::CombinatorFailure(Combinator::OneOf),
                    format!("{} {reason} of the oneOf schemas", preview(instance)),
                    ["oneOf"],
                ));
            }
        }
        for (i, &child) in shared.not.iter().enumerate() {
            if self.passes(child, instance, depth) {
                return Err(Failure::at(
                    FailureKind::CombinatorFailure(Combinator::Not),
                    format!("{} must not validate against not[{i}]", preview(instance)),
                    [PathSegment::from("not"), PathSegment::from(i)],
                ));
            }
        }
        if !shared.enum_values.is_empty() && !shared.enum_values.iter().any(|v| json_eq(v, instance)) {
            return Err(Failure::at(
                FailureKind::EnumMismatch,
                format!("{} is not one of {}", preview(instance), preview(&Value::Array(shared.enum_values.clone()))),
                ["enum"],
            ));
        }
        Ok(())
    }

    fn check_type(&self, kind: &NodeKind, instance: &Value) -> Result<(), Failure> {
        let Some(t) = kind.type_name() else { return Ok(()) };
        if t.matches(instance, self.policy) {
            return Ok(());
        }
        Err(Failure::at(
            FailureKind::TypeMismatch,
            format!("expected {}, found {} {}", t.as_str(), describe(instance), preview(instance)),
            ["type"],
        ))
    }

    fn check_structure(&self, kind: &NodeKind, instance: &Value, depth: usize) -> Result<(), Failure> {
        match (kind, instance) {
            (NodeKind::Object(node), Value::Object(map)) => self.check_object(node, instance, map, depth),
            (NodeKind::Array(node), Value::Array(xs)) => self.check_array(node, xs, depth),
            _ if self.assertions == Assertions::Structural => Ok(()),
            (NodeKind::String(node), Value::String(s)) => scalar::check_string(node, s),
            (NodeKind::Integer(node) | NodeKind::Number(node), Value::Number(n)) => {
                scalar::check_number(node, n)
            }
            _ => Ok(()),
        }
    }
}
