//! Schema registry
//!
//! A [`Schema`] owns every named validator and named check of a family of
//! DTOs. It goes through two phases:
//!
//! 1. **Declaration**: `define_validator` / `define_check` populate the
//!    registries. Names may be referenced before they are defined.
//! 2. **Resolution**: `resolve` walks everything reachable from the
//!    registries once and fails on any name that is still undefined.
//!
//! Only a resolved schema hands out [`TypeHandle`]s, and a handle borrows the
//! schema immutably, so declarations cannot change underneath a validation.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::builtin;
use crate::check::Check;
use crate::config::EngineConfig;
use crate::error::{Result, SchemaError};
use crate::report::ErrorTree;
use crate::validator::{Scope, Validator};

/// Default limit on how deep validation descends into nested data
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Registry of named validators and checks
#[derive(Debug, Clone)]
pub struct Schema {
    validators: BTreeMap<String, Validator>,
    checks: BTreeMap<String, Check>,
    resolved: bool,
    max_depth: usize,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Create an empty, unresolved schema
    pub fn new() -> Self {
        Self {
            validators: BTreeMap::new(),
            checks: BTreeMap::new(),
            resolved: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a schema configured from an [`EngineConfig`]
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut schema = Self::new().with_max_depth(config.limits.max_depth);
        if config.checks.builtins {
            builtin::register(&mut schema);
        }
        schema
    }

    /// Set the nesting limit for validated data
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Register a validator. Redefining a name replaces the old definition.
    pub fn define_validator(&mut self, name: impl Into<String>, validator: impl Into<Validator>) -> &mut Self {
        let name = name.into();
        if self.validators.insert(name.clone(), validator.into()).is_some() {
            debug!(validator = %name, "redefined validator");
        } else {
            debug!(validator = %name, "defined validator");
        }
        self.resolved = false;
        self
    }

    /// Register a check. Redefining a name replaces the old definition.
    pub fn define_check(&mut self, name: impl Into<String>, check: impl Into<Check>) -> &mut Self {
        let name = name.into();
        if self.checks.insert(name.clone(), check.into()).is_some() {
            debug!(check = %name, "redefined check");
        } else {
            debug!(check = %name, "defined check");
        }
        self.resolved = false;
        self
    }

    /// Verify every registered validator and check.
    ///
    /// All dangling names are reported together. Calling this again on a
    /// resolved schema is a no-op.
    pub fn resolve(&mut self) -> Result<&mut Self> {
        if self.resolved {
            return Ok(self);
        }

        let schema: &Schema = self;
        let mut errors = Vec::new();
        for validator in schema.validators.values() {
            validator.resolve(schema, &mut errors);
        }
        for check in schema.checks.values() {
            if let Err(err) = check.resolve(schema) {
                errors.push(err);
            }
        }

        // the same dangling name is usually referenced from several places
        let mut seen = HashSet::new();
        errors.retain(|err| seen.insert(err.to_string()));
        if let Some(err) = SchemaError::from_batch(errors) {
            debug!(error = %err, "schema failed to resolve");
            return Err(err);
        }

        debug!(
            validators = self.validators.len(),
            checks = self.checks.len(),
            "schema resolved"
        );
        self.resolved = true;
        Ok(self)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Look up a registered validator
    pub fn resolve_validator(&self, name: &str) -> Result<&Validator> {
        self.validators
            .get(name)
            .ok_or_else(|| SchemaError::UndefinedValidator {
                name: name.to_string(),
                suggestion: suggest(name, self.validators.keys()),
            })
    }

    /// Look up a registered check
    pub fn resolve_check(&self, name: &str) -> Result<&Check> {
        self.checks.get(name).ok_or_else(|| SchemaError::UndefinedCheck {
            name: name.to_string(),
            suggestion: suggest(name, self.checks.keys()),
        })
    }

    /// Mutable access for declarations that are refined after registration
    pub(crate) fn validator_mut(&mut self, name: &str) -> Option<&mut Validator> {
        self.resolved = false;
        self.validators.get_mut(name)
    }

    /// Handle for validating data against a named type
    pub fn get(&self, name: &str) -> Result<TypeHandle<'_>> {
        if !self.resolved {
            return Err(SchemaError::NotResolved);
        }
        let (name, validator) = self
            .validators
            .get_key_value(name)
            .ok_or_else(|| SchemaError::UndefinedValidator {
                name: name.to_string(),
                suggestion: suggest(name, self.validators.keys()),
            })?;
        Ok(TypeHandle {
            schema: self,
            name,
            validator,
        })
    }

    /// Full validation against a named type
    pub fn validate(&self, name: &str, value: &Value) -> Result<ErrorTree> {
        Ok(self.get(name)?.validate(value))
    }

    /// Whether `value` is fully valid for a named type
    pub fn is_valid(&self, name: &str, value: &Value) -> Result<bool> {
        Ok(self.get(name)?.is_valid(value))
    }

    /// Whether `value` has the shape of a named type, ignoring checks and
    /// invariants
    pub fn conforms(&self, name: &str, value: &Value) -> Result<bool> {
        Ok(self.get(name)?.is_valid_structure(value))
    }

    /// Names of all registered validators, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Names of all registered checks, sorted
    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }
}

/// A named validator bound to its resolved schema
#[derive(Debug, Clone, Copy)]
pub struct TypeHandle<'s> {
    schema: &'s Schema,
    name: &'s str,
    validator: &'s Validator,
}

impl<'s> TypeHandle<'s> {
    pub fn name(&self) -> &'s str {
        self.name
    }

    pub fn validator(&self) -> &'s Validator {
        self.validator
    }

    pub fn validate(&self, value: &Value) -> ErrorTree {
        self.validator.validate(value, Scope::root(self.schema))
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value, Scope::root(self.schema))
    }

    pub fn is_valid_structure(&self, value: &Value) -> bool {
        self.validator.is_valid_structure(value, Scope::root(self.schema))
    }
}

/// Closest registered name, for "did you mean" hints
fn suggest<'a>(name: &str, candidates: impl Iterator<Item = &'a String>) -> Option<String> {
    let matcher = SkimMatcherV2::default();
    candidates
        .filter_map(|candidate| matcher.fuzzy_match(candidate, name).map(|score| (score, candidate)))
        .max_by_key(|(score, _)| *score)
        .map(|(_, candidate)| candidate.clone())
}
