//! Cross-field invariants

use serde_json::Value;
use std::collections::BTreeMap;

use crate::check::{Check, CheckOutcome};
use crate::error::SchemaError;
use crate::report::ErrorTree;
use crate::schema::Schema;

/// A rule over the whole object, reported against zero or more fields
///
/// With no target fields the messages land on the object itself; otherwise
/// every target field gets the same messages.
#[derive(Debug, Clone)]
pub struct Invariant {
    fields: Vec<String>,
    check: Check,
}

impl Invariant {
    pub fn new<I, S>(fields: I, check: impl Into<Check>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            check: check.into(),
        }
    }

    /// Invariant backed by an inline predicate over the whole object
    pub fn predicate<I, S, F, R>(fields: I, predicate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        Self::new(fields, Check::new(predicate))
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub(crate) fn validate(&self, data: &Value, schema: &Schema) -> ErrorTree {
        let messages = self.check.validate(data, None, schema);
        if messages.is_empty() {
            return ErrorTree::Fields(BTreeMap::new());
        }
        if self.fields.is_empty() {
            return ErrorTree::Messages(messages);
        }
        ErrorTree::Fields(
            self.fields
                .iter()
                .map(|field| (field.clone(), ErrorTree::Messages(messages.clone())))
                .collect(),
        )
    }

    pub(crate) fn resolve(&self, schema: &Schema, errors: &mut Vec<SchemaError>) {
        if let Err(err) = self.check.resolve_attached(schema) {
            errors.push(err);
        }
    }
}
