//! List validation

use serde_json::Value;
use std::collections::BTreeMap;

use super::{resolve_checks, run_checks, Scope, Validator, DEPTH_EXCEEDED, MUST_BE_ARRAY};
use crate::check::Check;
use crate::error::SchemaError;
use crate::report::ErrorTree;
use crate::schema::Schema;

/// An ordered sequence whose elements share one validator
///
/// Checks attached to the list run against the whole array, and only once
/// every element is valid.
#[derive(Debug, Clone)]
pub struct ListValidator {
    item: Box<Validator>,
    checks: Vec<Check>,
}

impl ListValidator {
    pub fn new(item: impl Into<Validator>) -> Self {
        Self {
            item: Box::new(item.into()),
            checks: Vec::new(),
        }
    }

    pub fn check(mut self, check: impl Into<Check>) -> Self {
        self.checks.push(check.into());
        self
    }

    pub(crate) fn push_check(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn item(&self) -> &Validator {
        &self.item
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub(crate) fn validate(&self, value: &Value, scope: Scope<'_>) -> ErrorTree {
        let Value::Array(items) = value else {
            return ErrorTree::message(MUST_BE_ARRAY);
        };
        let Some(inner) = scope.enter(!items.is_empty()) else {
            return ErrorTree::message(DEPTH_EXCEEDED);
        };

        let errors: BTreeMap<usize, ErrorTree> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let result = self.item.validate(item, inner);
                (!result.is_empty()).then_some((index, result))
            })
            .collect();
        if !errors.is_empty() {
            return ErrorTree::Items(errors);
        }

        let messages = run_checks(&self.checks, value, scope.schema());
        if !messages.is_empty() {
            return ErrorTree::Messages(messages);
        }
        ErrorTree::Items(errors)
    }

    pub(crate) fn is_valid(&self, value: &Value, scope: Scope<'_>) -> bool {
        let Value::Array(items) = value else {
            return false;
        };
        let Some(inner) = scope.enter(!items.is_empty()) else {
            return false;
        };
        items.iter().all(|item| self.item.is_valid(item, inner))
            && run_checks(&self.checks, value, scope.schema()).is_empty()
    }

    pub(crate) fn is_valid_structure(&self, value: &Value, scope: Scope<'_>) -> bool {
        let Value::Array(items) = value else {
            return false;
        };
        let Some(inner) = scope.enter(!items.is_empty()) else {
            return false;
        };
        items.iter().all(|item| self.item.is_valid_structure(item, inner))
    }

    pub(crate) fn resolve(&self, schema: &Schema, errors: &mut Vec<SchemaError>) {
        self.item.resolve(schema, errors);
        resolve_checks(&self.checks, schema, errors);
    }
}
