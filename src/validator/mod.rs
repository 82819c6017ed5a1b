//! Validators
//!
//! A [`Validator`] is a tree of shape checkers. Every variant answers three
//! questions about a value:
//!
//! - `validate`: the full, shape-mirroring [`ErrorTree`]
//! - `is_valid`: whether `validate` would come back empty
//! - `is_valid_structure`: whether the value has the declared shape, ignoring
//!   custom checks and invariants
//!
//! Named types are linked through [`Validator::Reference`], which holds only a
//! name. The owning [`Schema`] is supplied as a scope at validation time, so
//! recursive and mutually recursive types never form ownership cycles.

pub mod field;
pub mod invariant;
pub mod list;
pub mod object;

pub use field::FieldValidator;
pub use invariant::Invariant;
pub use list::ListValidator;
pub use object::ObjectValidator;

use serde_json::Value;
use std::fmt;

use crate::error::{Result, SchemaError};
use crate::report::ErrorTree;
use crate::schema::Schema;

pub const CANNOT_BE_NULL: &str = "Cannot be null";
pub const MUST_BE_OBJECT: &str = "Must be object";
pub const MUST_BE_ARRAY: &str = "Must be an array";
pub const MUST_BE_BOOLEAN: &str = "Must be boolean";
pub const DEPTH_EXCEEDED: &str = "Exceeds maximum nesting depth";

/// Semantic primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Any JSON number
    Numeric,
    /// A number with no fractional representation (i64 or u64)
    Integer,
    /// A number stored as a float
    Float,
    String,
}

impl PrimitiveKind {
    /// Whether the value is of this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::Numeric => value.is_number(),
            PrimitiveKind::Integer => value.is_i64() || value.is_u64(),
            PrimitiveKind::Float => value.is_f64(),
            PrimitiveKind::String => value.is_string(),
        }
    }

    /// Display name used in messages (`Must be a Numeric`)
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Numeric => "Numeric",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::String => "String",
        }
    }

    /// Parse a kind name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "numeric" | "number" => Some(PrimitiveKind::Numeric),
            "integer" => Some(PrimitiveKind::Integer),
            "float" => Some(PrimitiveKind::Float),
            "string" => Some(PrimitiveKind::String),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Position of a validation pass: the schema references resolve against,
/// and how deep into the data we are.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'s> {
    schema: &'s Schema,
    depth: usize,
}

impl<'s> Scope<'s> {
    pub(crate) fn root(schema: &'s Schema) -> Self {
        Self { schema, depth: 0 }
    }

    pub(crate) fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// One level deeper into the data, or `None` past the schema's limit.
    pub(crate) fn descend(self) -> Option<Self> {
        if self.depth >= self.schema.max_depth() {
            return None;
        }
        Some(Self {
            schema: self.schema,
            depth: self.depth + 1,
        })
    }

    /// Enter a container. One with nothing to descend into stays at this
    /// level, so an empty list or object never trips the limit.
    pub(crate) fn enter(self, has_children: bool) -> Option<Self> {
        if has_children {
            self.descend()
        } else {
            Some(self)
        }
    }
}

/// A shape checker
#[derive(Debug, Clone)]
pub enum Validator {
    /// Accepts every value
    Any,
    /// Accepts `true` and `false` only
    Boolean,
    /// Accepts values of exactly one primitive kind
    Primitive(PrimitiveKind),
    List(ListValidator),
    Object(ObjectValidator),
    /// Validator registered on the schema under this name
    Reference(String),
}

impl Validator {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Validator::Primitive(kind)
    }

    pub fn list(item: impl Into<Validator>) -> Self {
        Validator::List(ListValidator::new(item))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Validator::Reference(name.into())
    }

    /// Only primitive types can carry checks
    pub fn is_primitive(&self) -> bool {
        matches!(self, Validator::Primitive(_))
    }

    pub(crate) fn validate(&self, value: &Value, scope: Scope<'_>) -> ErrorTree {
        match self {
            Validator::Any => ErrorTree::valid(),
            Validator::Boolean => {
                if value.is_boolean() {
                    ErrorTree::valid()
                } else {
                    ErrorTree::message(MUST_BE_BOOLEAN)
                }
            }
            Validator::Primitive(kind) => {
                if kind.matches(value) {
                    ErrorTree::valid()
                } else {
                    ErrorTree::message(format!("Must be a {}", kind))
                }
            }
            Validator::List(list) => list.validate(value, scope),
            Validator::Object(object) => object.validate(value, scope),
            Validator::Reference(name) => match scope.schema().resolve_validator(name) {
                Ok(target) => target.validate(value, scope),
                Err(err) => {
                    tracing::warn!(validator = %name, "reference missed at validation time");
                    ErrorTree::message(err.to_string())
                }
            },
        }
    }

    pub(crate) fn is_valid(&self, value: &Value, scope: Scope<'_>) -> bool {
        match self {
            Validator::Any => true,
            Validator::Boolean => value.is_boolean(),
            Validator::Primitive(kind) => kind.matches(value),
            Validator::List(list) => list.is_valid(value, scope),
            Validator::Object(object) => object.is_valid(value, scope),
            Validator::Reference(name) => scope
                .schema()
                .resolve_validator(name)
                .map(|target| target.is_valid(value, scope))
                .unwrap_or(false),
        }
    }

    pub(crate) fn is_valid_structure(&self, value: &Value, scope: Scope<'_>) -> bool {
        match self {
            Validator::List(list) => list.is_valid_structure(value, scope),
            Validator::Object(object) => object.is_valid_structure(value, scope),
            Validator::Reference(name) => scope
                .schema()
                .resolve_validator(name)
                .map(|target| target.is_valid_structure(value, scope))
                .unwrap_or(false),
            _ => self.is_valid(value, scope),
        }
    }

    /// Verify everything reachable from this validator, collecting every
    /// problem instead of stopping at the first.
    ///
    /// References are checked by name only: their target is a registered
    /// validator and gets verified on its own, which keeps cyclic schemas
    /// finite.
    pub(crate) fn resolve(&self, schema: &Schema, errors: &mut Vec<SchemaError>) {
        match self {
            Validator::Any | Validator::Boolean | Validator::Primitive(_) => {}
            Validator::List(list) => list.resolve(schema, errors),
            Validator::Object(object) => object.resolve(schema, errors),
            Validator::Reference(name) => {
                if let Err(err) = follow_reference(name, schema) {
                    errors.push(err);
                }
            }
        }
    }
}

/// Follow a chain of references to the first validator that consumes data.
///
/// `a -> b -> a` with nothing in between would recurse forever on any input,
/// so it is rejected here.
pub(crate) fn follow_reference<'s>(name: &'s str, schema: &'s Schema) -> Result<&'s Validator> {
    let mut visited = vec![name];
    let mut target = schema.resolve_validator(name)?;
    while let Validator::Reference(next) = target {
        if visited.contains(&next.as_str()) {
            let mut cycle: Vec<String> = visited.iter().map(|s| s.to_string()).collect();
            cycle.push(next.clone());
            return Err(SchemaError::CircularReference(cycle));
        }
        visited.push(next);
        target = schema.resolve_validator(next)?;
    }
    Ok(target)
}

/// Run a list of checks against a value, concatenating every message.
pub(crate) fn run_checks(checks: &[crate::check::Check], value: &Value, schema: &Schema) -> Vec<String> {
    checks
        .iter()
        .flat_map(|check| check.validate(value, None, schema))
        .collect()
}

pub(crate) fn resolve_checks(checks: &[crate::check::Check], schema: &Schema, errors: &mut Vec<SchemaError>) {
    for check in checks {
        if let Err(err) = check.resolve_attached(schema) {
            errors.push(err);
        }
    }
}

impl From<PrimitiveKind> for Validator {
    fn from(kind: PrimitiveKind) -> Self {
        Validator::Primitive(kind)
    }
}

impl From<ListValidator> for Validator {
    fn from(list: ListValidator) -> Self {
        Validator::List(list)
    }
}

impl From<ObjectValidator> for Validator {
    fn from(object: ObjectValidator) -> Self {
        Validator::Object(object)
    }
}

impl From<&str> for Validator {
    fn from(name: &str) -> Self {
        Validator::reference(name)
    }
}

impl From<String> for Validator {
    fn from(name: String) -> Self {
        Validator::Reference(name)
    }
}
