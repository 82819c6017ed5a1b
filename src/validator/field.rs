//! Object field validation

use serde_json::Value;

use super::{resolve_checks, run_checks, Scope, Validator, CANNOT_BE_NULL};
use crate::check::Check;
use crate::error::SchemaError;
use crate::report::ErrorTree;
use crate::schema::Schema;

/// A field's type, required-ness and checks
#[derive(Debug, Clone)]
pub struct FieldValidator {
    validator: Validator,
    required: bool,
    checks: Vec<Check>,
}

impl FieldValidator {
    pub fn new(validator: impl Into<Validator>, required: bool) -> Self {
        Self {
            validator: validator.into(),
            required,
            checks: Vec::new(),
        }
    }

    pub fn required(validator: impl Into<Validator>) -> Self {
        Self::new(validator, true)
    }

    pub fn optional(validator: impl Into<Validator>) -> Self {
        Self::new(validator, false)
    }

    /// Attach a check. Only primitive fields accept checks; the owning
    /// [`ObjectValidator`](super::ObjectValidator) rejects anything else.
    pub fn check(mut self, check: impl Into<Check>) -> Self {
        self.checks.push(check.into());
        self
    }

    pub(crate) fn push_check(&mut self, check: Check) {
        self.checks.push(check);
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// `None` and JSON `null` both count as absent.
    pub(crate) fn validate(&self, value: Option<&Value>, scope: Scope<'_>) -> ErrorTree {
        let value = match value {
            Some(value) if !value.is_null() => value,
            _ if self.required => return ErrorTree::message(CANNOT_BE_NULL),
            _ => return ErrorTree::valid(),
        };

        if !self.validator.is_primitive() {
            return self.validator.validate(value, scope);
        }

        // A type mismatch hides the custom checks
        let type_check = self.validator.validate(value, scope);
        if !type_check.is_empty() {
            return type_check;
        }
        ErrorTree::Messages(run_checks(&self.checks, value, scope.schema()))
    }

    pub(crate) fn is_valid(&self, value: Option<&Value>, scope: Scope<'_>) -> bool {
        self.validate(value, scope).is_empty()
    }

    pub(crate) fn is_valid_structure(&self, value: Option<&Value>, scope: Scope<'_>) -> bool {
        match value {
            Some(value) if !value.is_null() => self.validator.is_valid_structure(value, scope),
            _ => !self.required,
        }
    }

    pub(crate) fn resolve(&self, schema: &Schema, errors: &mut Vec<SchemaError>) {
        self.validator.resolve(schema, errors);
        resolve_checks(&self.checks, schema, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::PrimitiveKind;
    use serde_json::json;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.define_check(
            "not_empty",
            Check::new(|v: &Value| (v.as_str() == Some("")).then_some("Cannot be empty")),
        );
        schema.define_check(
            "no_spaces",
            Check::new(|v: &Value| {
                v.as_str()
                    .filter(|s| s.is_empty() || s.contains(' '))
                    .map(|_| "Cannot contain spaces or be blank")
            }),
        );
        schema
    }

    #[test]
    fn test_required_and_optional_absence() {
        let schema = schema();
        let scope = Scope::root(&schema);
        let required = FieldValidator::required(PrimitiveKind::String);
        let optional = FieldValidator::optional(PrimitiveKind::String);

        assert_eq!(required.validate(None, scope), ErrorTree::message("Cannot be null"));
        assert_eq!(required.validate(Some(&Value::Null), scope), ErrorTree::message("Cannot be null"));
        assert!(optional.validate(None, scope).is_empty());
        assert!(optional.validate(Some(&Value::Null), scope).is_empty());
        assert!(!required.is_valid_structure(None, scope));
        assert!(optional.is_valid_structure(None, scope));
    }

    #[test]
    fn test_type_mismatch_hides_checks() {
        let schema = schema();
        let field = FieldValidator::required(PrimitiveKind::String).check("not_empty");
        assert_eq!(
            field.validate(Some(&json!(42)), Scope::root(&schema)),
            ErrorTree::message("Must be a String")
        );
    }

    #[test]
    fn test_every_check_runs() {
        let schema = schema();
        let field = FieldValidator::required(PrimitiveKind::String)
            .check("not_empty")
            .check("no_spaces");
        assert_eq!(
            field.validate(Some(&json!("")), Scope::root(&schema)),
            ErrorTree::Messages(vec![
                "Cannot be empty".to_string(),
                "Cannot contain spaces or be blank".to_string(),
            ])
        );
    }

    #[test]
    fn test_structure_ignores_checks() {
        let schema = schema();
        let field = FieldValidator::required(PrimitiveKind::String).check("not_empty");
        let scope = Scope::root(&schema);
        assert!(field.is_valid_structure(Some(&json!("")), scope));
        assert!(!field.is_valid(Some(&json!("")), scope));
    }
}
